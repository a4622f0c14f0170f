/*!
# Ratio-of-Uniforms Rejection Sampler

Draws exact samples from a [`LogisticKernel`] with the multivariate generalized
ratio-of-uniforms method. Points `(u, v)` are drawn uniformly from the bounding
[`Envelope`] and mapped to `x = v / √u + mu`; a draw is accepted when every `xᵢ` lies in
`(0, 1)` and

```text
(d + 2) · ln(u) < 2 · log_f(x)
```

Accepted points are then distributed according to the kernel. Samples are returned in
natural scale, one row `logit(x)` per draw.

The envelope is computed once per sampler. The rejection loop has no built-in limit;
set [`SamplerConfig::max_attempts`] (or call [`RatioOfUniforms::with_max_attempts`]) to
fail with [`SamplerError::AttemptsExhausted`] instead of looping indefinitely.

## Example Usage

```rust
use logis_rou::kernel::LogisticKernel;
use logis_rou::sampler::RatioOfUniforms;
use ndarray::{arr1, arr2};

let kernel = LogisticKernel::new(arr2(&[[2.0, 0.0], [0.0, 2.0]]), arr1(&[1.0, -1.0])).unwrap();
let mut sampler = RatioOfUniforms::new(kernel).unwrap().set_seed(42);
let samples = sampler.sample(100).unwrap();
assert_eq!(samples.dim(), (100, 2));
```
*/

use indicatif::{ProgressBar, ProgressStyle};
use ndarray::{Array1, Array2, ArrayView1, ArrayView2};
use rand::prelude::*;
use rand::rngs::SmallRng;

use crate::bounds::Envelope;
use crate::config::SamplerConfig;
use crate::error::{Result, SamplerError};
use crate::kernel::{logit, LogisticKernel};
use crate::stats::{SampleTracker, SamplerStats};

/**
A rejection sampler for one [`LogisticKernel`].

The sampler owns its envelope and a seeded [`SmallRng`], so repeated calls continue the
same random stream and identical seeds reproduce identical draws.

# Examples

```rust
use logis_rou::kernel::LogisticKernel;
use logis_rou::sampler::RatioOfUniforms;
use ndarray::{arr1, arr2};

let kernel = LogisticKernel::new(arr2(&[[2.0]]), arr1(&[0.5])).unwrap();
let mut a = RatioOfUniforms::new(kernel.clone()).unwrap().set_seed(7);
let mut b = RatioOfUniforms::new(kernel).unwrap().set_seed(7);
assert_eq!(a.sample(10).unwrap(), b.sample(10).unwrap());
```
*/
#[derive(Debug, Clone)]
pub struct RatioOfUniforms {
    /// The kernel being sampled.
    pub kernel: LogisticKernel,
    /// Bounding rectangle of the acceptance region.
    pub envelope: Envelope,
    /// Upper limit on proposals per call to `sample`.
    pub max_attempts: Option<u64>,
    /// The random seed.
    pub seed: u64,
    /// The random number generator for this sampler.
    pub rng: SmallRng,
    tracker: SampleTracker,
}

impl RatioOfUniforms {
    /// Builds the envelope for `kernel` with default settings.
    pub fn new(kernel: LogisticKernel) -> Result<Self> {
        Self::with_config(kernel, SamplerConfig::default())
    }

    /// Builds the envelope for `kernel` with the optimizer settings, attempt limit and
    /// seed taken from `config`.
    pub fn with_config(kernel: LogisticKernel, config: SamplerConfig) -> Result<Self> {
        let envelope = Envelope::compute(&kernel, &config.control)?;
        let mut sampler = Self::from_envelope(kernel, envelope)?;
        sampler.max_attempts = config.max_attempts;
        if let Some(seed) = config.seed {
            sampler = sampler.set_seed(seed);
        }
        Ok(sampler)
    }

    /// Uses a precomputed envelope. The envelope is validated against the kernel.
    pub fn from_envelope(kernel: LogisticKernel, envelope: Envelope) -> Result<Self> {
        kernel.check_point(envelope.mu.view())?;
        kernel.check_point(envelope.vmin.view())?;
        kernel.check_point(envelope.vmax.view())?;
        envelope.validate()?;

        let seed = thread_rng().gen::<u64>();
        let tracker = SampleTracker::new(kernel.dim());
        Ok(Self {
            kernel,
            envelope,
            max_attempts: None,
            seed,
            rng: SmallRng::seed_from_u64(seed),
            tracker,
        })
    }

    /// Reseeds the sampler's RNG.
    pub fn set_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self.rng = SmallRng::seed_from_u64(seed);
        self
    }

    pub fn with_max_attempts(mut self, max_attempts: u64) -> Self {
        self.max_attempts = Some(max_attempts);
        self
    }

    /// Draws `n` accepted samples, returned as an `n × d` matrix in natural scale.
    pub fn sample(&mut self, n: usize) -> Result<Array2<f64>> {
        self.run(n, None)
    }

    /// Like [`Self::sample`], reporting progress on a terminal progress bar.
    pub fn sample_with_progress(&mut self, n: usize) -> Result<Array2<f64>> {
        let pb = ProgressBar::new(n as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{prefix} [{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}")
                .unwrap()
                .progress_chars("##-"),
        );
        pb.set_prefix("RoU");
        let out = self.run(n, Some(&pb));
        match &out {
            Ok(_) => pb.finish_with_message("Done!"),
            Err(_) => pb.abandon_with_message("Stopped"),
        }
        out
    }

    /// Attempts, acceptances and running moments over the sampler's lifetime.
    ///
    /// Moments and acceptances cover only draws that were returned to the caller. A call
    /// that fails with [`SamplerError::AttemptsExhausted`] adds its proposals to
    /// `attempts` and discards its partial draws.
    pub fn stats(&self) -> SamplerStats {
        self.tracker.stats()
    }

    fn run(&mut self, n: usize, pb: Option<&ProgressBar>) -> Result<Array2<f64>> {
        let out = rejection_loop(
            n,
            &self.kernel,
            &self.envelope,
            &mut self.rng,
            self.max_attempts,
            &mut self.tracker,
            pb,
        )?;
        let stats = self.tracker.stats();
        log::info!(
            "Drew {n} samples; {} accepted of {} proposals so far (rate {:.4}).",
            stats.accepted,
            stats.attempts,
            stats.acceptance_rate
        );
        Ok(out)
    }
}

/// One ratio-of-uniforms proposal. Returns the candidate in `(0, 1)^d` if accepted.
fn propose<R: Rng + ?Sized>(
    kernel: &LogisticKernel,
    envelope: &Envelope,
    rng: &mut R,
) -> Option<Array1<f64>> {
    let u = envelope.umax * rng.gen::<f64>();
    if u <= 0.0 {
        return None;
    }
    let root_u = u.sqrt();
    let x = Array1::from_shape_fn(envelope.dim(), |i| {
        let (lo, hi) = (envelope.vmin[i], envelope.vmax[i]);
        (lo + (hi - lo) * rng.gen::<f64>()) / root_u + envelope.mu[i]
    });

    let inside = x.iter().all(|&xi| xi > 0.0 && xi < 1.0);
    (inside && kernel.rou_weight() * u.ln() < 2.0 * kernel.log_density(x.view())).then_some(x)
}

fn rejection_loop<R: Rng + ?Sized>(
    n: usize,
    kernel: &LogisticKernel,
    envelope: &Envelope,
    rng: &mut R,
    max_attempts: Option<u64>,
    tracker: &mut SampleTracker,
    pb: Option<&ProgressBar>,
) -> Result<Array2<f64>> {
    let mut out = Array2::<f64>::zeros((n, kernel.dim()));
    let mut batch = SampleTracker::new(kernel.dim());
    let mut accepted = 0;
    let mut attempts: u64 = 0;

    while accepted < n {
        if let Some(limit) = max_attempts {
            if attempts >= limit {
                tracker.record_attempts(attempts);
                return Err(SamplerError::AttemptsExhausted {
                    attempts,
                    accepted,
                    requested: n,
                });
            }
        }
        attempts += 1;
        batch.record_attempt();

        if let Some(x) = propose(kernel, envelope, rng) {
            let mut row = out.row_mut(accepted);
            row.assign(&x.mapv(logit));
            batch.record_accept(row.view());
            accepted += 1;
            if let Some(pb) = pb {
                pb.inc(1);
            }
        }
    }
    tracker.merge(&batch);
    Ok(out)
}

/// Samples `n` draws from the kernel defined by `p` and `b`, computing the envelope with
/// default optimizer settings and drawing from `rng`.
pub fn sample_kernel<R: Rng + ?Sized>(
    n: usize,
    p: ArrayView2<f64>,
    b: ArrayView1<f64>,
    rng: &mut R,
) -> Result<Array2<f64>> {
    let kernel = LogisticKernel::new(p.to_owned(), b.to_owned())?;
    let config = SamplerConfig::default();
    let envelope = Envelope::compute(&kernel, &config.control)?;
    envelope.validate()?;
    let mut tracker = SampleTracker::new(kernel.dim());
    rejection_loop(n, &kernel, &envelope, rng, None, &mut tracker, None)
}
