/*!
# Projected L-BFGS for box constraints

A small bound-constrained minimizer used by the mode and axis-bound searches. It follows
the L-BFGS-B recipe closely enough to share its stopping rules:

- variables sitting on a bound whose gradient pushes further out are frozen (active set),
- the search direction is the limited-memory BFGS two-loop recursion over the free
  variables, falling back to projected steepest descent,
- steps are taken along the projected path with Armijo backtracking,
- iteration stops on a relative reduction below `factr · ε`, a projected gradient below
  `pgtol`, or after `max_iterations`.

Non-convergence is reported through [`Termination`], never as an error: the best iterate
is always returned.

# Examples

```rust
use logis_rou::optim::BoxLbfgs;
use ndarray::{arr1, Array1};

// Minimize (x - 2)² + (y + 1)² over [0, 1] × [0, 1].
let solution = BoxLbfgs::new(arr1(&[0.5, 0.5]), |x: &Array1<f64>| {
    let value = (x[0] - 2.0).powi(2) + (x[1] + 1.0).powi(2);
    let grad = arr1(&[2.0 * (x[0] - 2.0), 2.0 * (x[1] + 1.0)]);
    (value, grad)
})
.with_bounds(arr1(&[0.0, 0.0]), arr1(&[1.0, 1.0]))
.run()
.unwrap();

assert!(solution.status.is_converged());
assert!((solution.x[0] - 1.0).abs() < 1e-12);
assert!(solution.x[1].abs() < 1e-12);
```
*/

use std::collections::VecDeque;
use std::fmt;

use ndarray::{Array1, Zip};

use crate::config::OptimControl;
use crate::error::{ensure_dim, Result, SamplerError};

const ARMIJO_C1: f64 = 1e-4;
const MAX_BACKTRACKS: usize = 60;
const MIN_CURVATURE: f64 = 1e-12;
const ACTIVE_SET_EPS: f64 = 1e-12;

/// Why a run of [`BoxLbfgs`] stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    Converged,
    MaxIterations,
    LineSearchFailed,
}

impl Termination {
    pub fn is_converged(&self) -> bool {
        matches!(self, Termination::Converged)
    }

    /// Status code in the L-BFGS-B convention: 0 converged, 1 iteration limit,
    /// 52 abnormal line-search termination.
    pub fn code(&self) -> i32 {
        match self {
            Termination::Converged => 0,
            Termination::MaxIterations => 1,
            Termination::LineSearchFailed => 52,
        }
    }
}

impl fmt::Display for Termination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            Termination::Converged => "converged",
            Termination::MaxIterations => "iteration limit reached",
            Termination::LineSearchFailed => "line search failed",
        };
        write!(f, "{msg} (code {})", self.code())
    }
}

/// Result of a box-constrained minimization.
#[derive(Debug, Clone, PartialEq)]
pub struct BoxSolution {
    /// Best iterate found.
    pub x: Array1<f64>,
    /// Objective value at `x`.
    pub value: f64,
    /// Gradient at `x`.
    pub gradient: Array1<f64>,
    pub iterations: usize,
    pub evaluations: usize,
    pub status: Termination,
}

struct CorrectionPair {
    s: Array1<f64>,
    y: Array1<f64>,
    rho: f64,
}

/// Ring buffer of the most recent `(s, y)` correction pairs.
struct LbfgsMemory {
    pairs: VecDeque<CorrectionPair>,
    capacity: usize,
}

impl LbfgsMemory {
    fn new(capacity: usize) -> Self {
        Self {
            pairs: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    fn clear(&mut self) {
        self.pairs.clear();
    }

    fn update(&mut self, s: Array1<f64>, y: Array1<f64>) {
        if self.capacity == 0 {
            return;
        }
        let s_dot_y = s.dot(&y);
        let curvature_floor = MIN_CURVATURE * s.dot(&s).sqrt() * y.dot(&y).sqrt();
        if !s_dot_y.is_finite() || s_dot_y <= curvature_floor || s_dot_y <= 0.0 {
            return;
        }
        if self.pairs.len() == self.capacity {
            self.pairs.pop_front();
        }
        self.pairs.push_back(CorrectionPair {
            s,
            y,
            rho: 1.0 / s_dot_y,
        });
    }

    /// Two-loop recursion restricted to the free variables.
    fn direction(&self, grad: &Array1<f64>, free: &[bool]) -> Array1<f64> {
        let mask = |v: &Array1<f64>| -> Array1<f64> {
            Array1::from_shape_fn(v.len(), |i| if free[i] { v[i] } else { 0.0 })
        };

        let mut q = mask(grad);
        let mut alphas = Vec::with_capacity(self.pairs.len());
        for pair in self.pairs.iter().rev() {
            let alpha = pair.rho * mask(&pair.s).dot(&q);
            q.scaled_add(-alpha, &mask(&pair.y));
            alphas.push(alpha);
        }

        let gamma = match self.pairs.back() {
            Some(last) => {
                let y = mask(&last.y);
                let yy = y.dot(&y);
                if yy > 0.0 {
                    mask(&last.s).dot(&y) / yy
                } else {
                    1.0
                }
            }
            None => 1.0,
        };
        let mut r = q * gamma.max(f64::MIN_POSITIVE);

        for (pair, alpha) in self.pairs.iter().zip(alphas.into_iter().rev()) {
            let beta = pair.rho * mask(&pair.y).dot(&r);
            r.scaled_add(alpha - beta, &mask(&pair.s));
        }
        r.mapv_inplace(|v| -v);
        r
    }
}

/// Bound-constrained limited-memory BFGS minimizer.
///
/// `objective` returns the value and gradient at a point.
pub struct BoxLbfgs<F> {
    x0: Array1<f64>,
    lower: Array1<f64>,
    upper: Array1<f64>,
    objective: F,
    control: OptimControl,
}

impl<F> BoxLbfgs<F>
where
    F: FnMut(&Array1<f64>) -> (f64, Array1<f64>),
{
    /// Creates an unconstrained problem starting at `x0`.
    pub fn new(x0: Array1<f64>, objective: F) -> Self {
        let n = x0.len();
        Self {
            x0,
            lower: Array1::from_elem(n, f64::NEG_INFINITY),
            upper: Array1::from_elem(n, f64::INFINITY),
            objective,
            control: OptimControl::default(),
        }
    }

    pub fn with_bounds(mut self, lower: Array1<f64>, upper: Array1<f64>) -> Self {
        self.lower = lower;
        self.upper = upper;
        self
    }

    pub fn with_control(mut self, control: OptimControl) -> Self {
        self.control = control;
        self
    }

    fn validate(&self) -> Result<()> {
        ensure_dim("lower bounds", self.x0.len(), self.lower.len())?;
        ensure_dim("upper bounds", self.x0.len(), self.upper.len())?;
        for (index, (&lower, &upper)) in self.lower.iter().zip(self.upper.iter()).enumerate() {
            if lower.is_nan() || upper.is_nan() || lower > upper {
                return Err(SamplerError::InvalidBounds {
                    index,
                    lower,
                    upper,
                });
            }
        }
        Ok(())
    }

    fn project(&self, x: &mut Array1<f64>) {
        Zip::from(x)
            .and(&self.lower)
            .and(&self.upper)
            .for_each(|xi, &lo, &hi| *xi = xi.clamp(lo, hi));
    }

    fn projected_gradient_norm(&self, x: &Array1<f64>, grad: &Array1<f64>) -> f64 {
        Zip::from(x)
            .and(grad)
            .and(&self.lower)
            .and(&self.upper)
            .fold(0.0_f64, |acc, &xi, &gi, &lo, &hi| {
                let pg = if hi - lo <= 0.0 {
                    0.0
                } else if xi <= lo {
                    gi.min(0.0)
                } else if xi >= hi {
                    gi.max(0.0)
                } else {
                    gi
                };
                acc.max(pg.abs())
            })
    }

    fn free_mask(&self, x: &Array1<f64>, grad: &Array1<f64>) -> Vec<bool> {
        (0..x.len())
            .map(|i| {
                let (lo, hi) = (self.lower[i], self.upper[i]);
                if hi - lo <= 0.0 {
                    return false;
                }
                let near_lower = x[i] <= lo + ACTIVE_SET_EPS * (1.0 + lo.abs());
                let near_upper = x[i] >= hi - ACTIVE_SET_EPS * (1.0 + hi.abs());
                !((near_lower && grad[i] > 0.0) || (near_upper && grad[i] < 0.0))
            })
            .collect()
    }

    fn steepest_descent(grad: &Array1<f64>, free: &[bool]) -> Array1<f64> {
        Array1::from_shape_fn(grad.len(), |i| if free[i] { -grad[i] } else { 0.0 })
    }

    /// Runs the minimization. Errors only for malformed problems (shapes, inverted
    /// bounds, non-finite starting value).
    pub fn run(mut self) -> Result<BoxSolution> {
        self.validate()?;
        let mut x = self.x0.clone();
        self.project(&mut x);

        let (mut f, mut g) = (self.objective)(&x);
        let mut evaluations = 1;
        if !f.is_finite() {
            return Err(SamplerError::InitialValueNotFinite { value: f });
        }

        let mut memory = LbfgsMemory::new(self.control.memory);
        let tolerance = self.control.factr * f64::EPSILON;
        let mut status = Termination::MaxIterations;
        let mut iterations = 0;

        while iterations < self.control.max_iterations {
            if self.projected_gradient_norm(&x, &g) <= self.control.pgtol {
                status = Termination::Converged;
                break;
            }
            iterations += 1;

            let free = self.free_mask(&x, &g);
            let mut direction = memory.direction(&g, &free);
            let mut slope = direction.dot(&g);
            if !(slope < 0.0) {
                memory.clear();
                direction = Self::steepest_descent(&g, &free);
                slope = direction.dot(&g);
                if !(slope < 0.0) {
                    status = Termination::Converged;
                    break;
                }
            }

            let mut step = if memory.is_empty() {
                let largest = direction.iter().fold(0.0_f64, |acc, d| acc.max(d.abs()));
                (1.0 / largest).min(1.0)
            } else {
                1.0
            };

            let mut accepted = None;
            for _ in 0..MAX_BACKTRACKS {
                let mut trial = &x + &(&direction * step);
                self.project(&mut trial);
                let displacement = &trial - &x;
                if displacement.iter().all(|&d| d == 0.0) {
                    break;
                }
                let (f_trial, g_trial) = (self.objective)(&trial);
                evaluations += 1;
                if f_trial.is_finite() && f_trial <= f + ARMIJO_C1 * g.dot(&displacement) {
                    accepted = Some((trial, displacement, f_trial, g_trial));
                    break;
                }
                step *= 0.5;
            }

            let Some((trial, displacement, f_trial, g_trial)) = accepted else {
                if memory.is_empty() {
                    status = Termination::LineSearchFailed;
                    break;
                }
                memory.clear();
                continue;
            };

            let reduction = f - f_trial;
            let scale = f.abs().max(f_trial.abs()).max(1.0);
            memory.update(displacement, &g_trial - &g);
            x = trial;
            f = f_trial;
            g = g_trial;
            if reduction <= tolerance * scale {
                status = Termination::Converged;
                break;
            }
        }

        Ok(BoxSolution {
            x,
            value: f,
            gradient: g,
            iterations,
            evaluations,
            status,
        })
    }
}
