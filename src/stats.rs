//! Running statistics of a rejection-sampling session.

use ndarray::prelude::*;

/// Tracks proposals, acceptances, and running moments of accepted draws.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleTracker {
    n_params: usize,
    attempts: u64,
    accepted: u64,
    mean: Array1<f64>,    // n_params
    mean_sq: Array1<f64>, // n_params
}

/// Snapshot of a [`SampleTracker`].
#[derive(Debug, Clone, PartialEq)]
pub struct SamplerStats {
    pub attempts: u64,
    pub accepted: u64,
    pub acceptance_rate: f64,
    pub mean: Array1<f64>,     // n_params
    pub variance: Array1<f64>, // n_params
}

impl SampleTracker {
    pub fn new(n_params: usize) -> Self {
        Self {
            n_params,
            attempts: 0,
            accepted: 0,
            mean: Array1::zeros(n_params),
            mean_sq: Array1::zeros(n_params),
        }
    }

    pub fn record_attempt(&mut self) {
        self.attempts += 1;
    }

    /// Counts `count` proposals whose draws were thrown away.
    pub fn record_attempts(&mut self, count: u64) {
        self.attempts += count;
    }

    /// Folds another tracker's proposals and accepted draws into this one.
    pub fn merge(&mut self, other: &SampleTracker) {
        debug_assert_eq!(other.n_params, self.n_params);
        self.attempts += other.attempts;
        let total = self.accepted + other.accepted;
        if total == 0 {
            return;
        }
        let (a, b, n) = (self.accepted as f64, other.accepted as f64, total as f64);
        self.mean = (&self.mean * a + &other.mean * b) / n;
        self.mean_sq = (&self.mean_sq * a + &other.mean_sq * b) / n;
        self.accepted = total;
    }

    /// Folds one accepted draw into the running moments.
    pub fn record_accept(&mut self, x: ArrayView1<f64>) {
        debug_assert_eq!(x.len(), self.n_params);
        self.accepted += 1;
        let n = self.accepted as f64;
        self.mean = (&self.mean * (n - 1.0) + &x) / n;
        self.mean_sq = (&self.mean_sq * (n - 1.0) + &x.mapv(|v| v * v)) / n;
    }

    pub fn attempts(&self) -> u64 {
        self.attempts
    }

    pub fn accepted(&self) -> u64 {
        self.accepted
    }

    /// Unbiased per-coordinate variance of the accepted draws.
    pub fn variance(&self) -> Array1<f64> {
        let n = self.accepted as f64;
        if self.accepted < 2 {
            return Array1::from_elem(self.n_params, f64::NAN);
        }
        (&self.mean_sq - &self.mean.mapv(|m| m * m)) * n / (n - 1.0)
    }

    pub fn stats(&self) -> SamplerStats {
        let acceptance_rate = if self.attempts == 0 {
            0.0
        } else {
            self.accepted as f64 / self.attempts as f64
        };
        SamplerStats {
            attempts: self.attempts,
            accepted: self.accepted,
            acceptance_rate,
            mean: self.mean.clone(),
            variance: self.variance(),
        }
    }
}
