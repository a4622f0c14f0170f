/*!
Tuning knobs for the local optimizer and the rejection sampler.

The defaults reproduce the constants the envelope construction has always used
(10 000 optimizer iterations, L-BFGS memory of 5, `factr = 1e7`, `pgtol = 0`) and an
unbounded rejection loop.

# Examples

```rust
use logis_rou::config::{OptimControl, SamplerConfig};

let cfg = SamplerConfig::default()
    .with_seed(42)
    .with_max_attempts(1_000_000)
    .with_control(OptimControl {
        max_iterations: 500,
        ..OptimControl::default()
    });
assert_eq!(cfg.seed, Some(42));
assert_eq!(cfg.control.max_iterations, 500);
```
*/

/// Control block handed to [`crate::optim::BoxLbfgs`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OptimControl {
    /// Maximum number of outer iterations.
    pub max_iterations: usize,
    /// Number of correction pairs kept for the limited-memory Hessian approximation.
    pub memory: usize,
    /// Relative reduction tolerance, in units of machine epsilon.
    pub factr: f64,
    /// Tolerance on the infinity norm of the projected gradient.
    pub pgtol: f64,
}

impl Default for OptimControl {
    fn default() -> Self {
        Self {
            max_iterations: 10_000,
            memory: 5,
            factr: 1e7,
            pgtol: 0.0,
        }
    }
}

/// Configuration of a [`crate::sampler::RatioOfUniforms`] session.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SamplerConfig {
    /// Optimizer settings used for the mode and axis-bound searches.
    pub control: OptimControl,
    /// Upper limit on (u, v) proposals per call to `sample`. `None` loops until done.
    pub max_attempts: Option<u64>,
    /// Seed for the session RNG. `None` seeds from entropy.
    pub seed: Option<u64>,
}

impl SamplerConfig {
    pub fn with_control(mut self, control: OptimControl) -> Self {
        self.control = control;
        self
    }

    pub fn with_max_attempts(mut self, max_attempts: u64) -> Self {
        self.max_attempts = Some(max_attempts);
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}
