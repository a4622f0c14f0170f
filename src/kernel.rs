/*!
The logistic-regression kernel sampled by this crate, together with the scalar logistic
helpers it is built from.

A kernel is defined by an `m × d` matrix `P` and an offset `b` of length `m`. On the open
unit cube it has log-density

```text
log_f(u) = Σⱼ ldlogis((P·logit(u) + b)ⱼ) + Σᵢ ldlogit(uᵢ)
```

i.e. the natural-scale density `x ↦ Πⱼ dlogis((P·x + b)ⱼ)` pushed through the logistic
map `u = plogis(x)`.

# Examples

```rust
use logis_rou::kernel::{LogisticKernel, Objective};
use ndarray::{arr1, arr2};

let kernel = LogisticKernel::new(arr2(&[[2.0]]), arr1(&[0.0])).unwrap();
let (value, grad) = Objective::Kernel.evaluate(&kernel, arr1(&[0.5]).view());
assert!(value.abs() < 1e-12);
assert!(grad[0].abs() < 1e-12);
```
*/

use ndarray::{Array1, Array2, ArrayView1, ArrayView2};

use crate::error::{ensure_dim, Result};

/// Log-odds transform `ln(u / (1 - u))`.
pub fn logit(u: f64) -> f64 {
    (u / (1.0 - u)).ln()
}

/// Derivative of [`logit`].
pub fn dlogit(u: f64) -> f64 {
    1.0 / (u * (1.0 - u))
}

/// Log-Jacobian of the logit change of variables, `-ln(u (1 - u))`.
pub fn ldlogit(u: f64) -> f64 {
    -(u * (1.0 - u)).ln()
}

/// Log-density of the standard logistic distribution, `t - 2 ln(1 + eᵗ)`.
pub fn ldlogis(t: f64) -> f64 {
    t - 2.0 * softplus(t)
}

/// Derivative of [`ldlogis`], `1 - 2 / (1 + e⁻ᵗ)`.
pub fn dldlogis(t: f64) -> f64 {
    1.0 - 2.0 / (1.0 + (-t).exp())
}

/// CDF of the standard logistic distribution.
pub fn plogis(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

/// Quantile function of the standard logistic distribution.
pub fn qlogis(p: f64) -> f64 {
    logit(p)
}

// ln(1 + eᵗ) without overflow for large t.
fn softplus(t: f64) -> f64 {
    t.max(0.0) + (-t.abs()).exp().ln_1p()
}

/// A log-concave logistic kernel on `(0, 1)^d`.
#[derive(Debug, Clone, PartialEq)]
pub struct LogisticKernel {
    p: Array2<f64>,
    b: Array1<f64>,
}

impl LogisticKernel {
    /// Creates a kernel from the linear map `p` (`m × d`) and offset `b` (length `m`).
    pub fn new(p: Array2<f64>, b: Array1<f64>) -> Result<Self> {
        ensure_dim("offset vector b (rows of P)", p.nrows(), b.len())?;
        Ok(Self { p, b })
    }

    /// Number of sampled coordinates `d`, i.e. the number of columns of `P`.
    pub fn dim(&self) -> usize {
        self.p.ncols()
    }

    pub fn p(&self) -> ArrayView2<'_, f64> {
        self.p.view()
    }

    pub fn b(&self) -> ArrayView1<'_, f64> {
        self.b.view()
    }

    /// Exponent weight `d + 2` of the ratio-of-uniforms construction.
    pub(crate) fn rou_weight(&self) -> f64 {
        (self.dim() + 2) as f64
    }

    /// Checks that `u` has one entry per sampled coordinate.
    pub fn check_point(&self, u: ArrayView1<f64>) -> Result<()> {
        ensure_dim("point (columns of P)", self.dim(), u.len())
    }

    fn linear_predictor(&self, u: ArrayView1<f64>) -> Array1<f64> {
        self.p.dot(&u.mapv(logit)) + &self.b
    }

    /// Evaluates `log_f(u)`.
    ///
    /// # Panics
    ///
    /// Panics if `u.len()` differs from [`Self::dim`].
    pub fn log_density(&self, u: ArrayView1<f64>) -> f64 {
        let eta = self.linear_predictor(u);
        eta.iter().map(|&t| ldlogis(t)).sum::<f64>() + u.iter().map(|&ui| ldlogit(ui)).sum::<f64>()
    }

    /// Evaluates the gradient of `log_f` with respect to `u`.
    ///
    /// # Panics
    ///
    /// Panics if `u.len()` differs from [`Self::dim`].
    pub fn gradient(&self, u: ArrayView1<f64>) -> Array1<f64> {
        self.log_density_and_gradient(u).1
    }

    /// Value and gradient sharing a single evaluation of `P·logit(u) + b`.
    pub fn log_density_and_gradient(&self, u: ArrayView1<f64>) -> (f64, Array1<f64>) {
        let eta = self.linear_predictor(u);
        let value = eta.iter().map(|&t| ldlogis(t)).sum::<f64>()
            + u.iter().map(|&ui| ldlogit(ui)).sum::<f64>();

        let y = eta.mapv(dldlogis);
        let mut grad = self.p.t().dot(&y);
        for (g, &ui) in grad.iter_mut().zip(u.iter()) {
            *g = dlogit(ui) * *g + (2.0 * ui - 1.0) / (ui * (1.0 - ui));
        }
        (value, grad)
    }
}

/// The three objectives optimized while building the sampling envelope.
///
/// All variants share one evaluation contract, `(value, gradient) = evaluate(kernel, u)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Objective {
    /// `log_f(u)`, maximized by the mode search.
    Kernel,
    /// `-log_f(u) - (d + 2) ln(mu - u[axis])`, minimized by the lower axis-bound search.
    LowerPenalized { axis: usize, mu: f64 },
    /// `log_f(u) + (d + 2) ln(u[axis] - mu)`, maximized by the upper axis-bound search.
    UpperPenalized { axis: usize, mu: f64 },
}

impl Objective {
    pub fn evaluate(&self, kernel: &LogisticKernel, u: ArrayView1<f64>) -> (f64, Array1<f64>) {
        let (log_f, mut grad) = kernel.log_density_and_gradient(u);
        let weight = kernel.rou_weight();
        match *self {
            Objective::Kernel => (log_f, grad),
            Objective::LowerPenalized { axis, mu } => {
                let gap = mu - u[axis];
                grad.mapv_inplace(|g| -g);
                grad[axis] += weight / gap;
                (-log_f - weight * gap.ln(), grad)
            }
            Objective::UpperPenalized { axis, mu } => {
                let gap = u[axis] - mu;
                grad[axis] += weight / gap;
                (log_f + weight * gap.ln(), grad)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::{arr1, arr2};

    fn kernel_2d() -> LogisticKernel {
        LogisticKernel::new(
            arr2(&[[1.0, 0.5], [-0.3, 2.0], [0.7, 0.7]]),
            arr1(&[0.2, -0.4, 1.0]),
        )
        .unwrap()
    }

    fn finite_difference(objective: Objective, kernel: &LogisticKernel, u: &Array1<f64>) -> Array1<f64> {
        const H: f64 = 1e-6;
        Array1::from_shape_fn(u.len(), |i| {
            let mut up = u.clone();
            let mut down = u.clone();
            up[i] += H;
            down[i] -= H;
            let fu = objective.evaluate(kernel, up.view()).0;
            let fd = objective.evaluate(kernel, down.view()).0;
            (fu - fd) / (2.0 * H)
        })
    }

    #[test]
    fn logistic_helpers_are_consistent() {
        for &x in &[-5.0, -0.3, 0.0, 1.7, 12.0] {
            assert_abs_diff_eq!(qlogis(plogis(x)), x, epsilon = 1e-9);
            assert_abs_diff_eq!(logit(plogis(x)), x, epsilon = 1e-9);
        }
        assert_abs_diff_eq!(plogis(0.0), 0.5);
        assert_abs_diff_eq!(ldlogis(0.0), -2.0 * 2.0_f64.ln(), epsilon = 1e-15);
        assert_abs_diff_eq!(dldlogis(0.0), 0.0);
        assert_abs_diff_eq!(dlogit(0.5), 4.0);
        assert_abs_diff_eq!(ldlogit(0.5), 4.0_f64.ln(), epsilon = 1e-15);
    }

    #[test]
    fn ldlogis_is_stable_in_the_tails() {
        assert_abs_diff_eq!(ldlogis(1000.0), -1000.0, epsilon = 1e-9);
        assert_abs_diff_eq!(ldlogis(-1000.0), -1000.0, epsilon = 1e-9);
        assert_abs_diff_eq!(ldlogis(3.0), 3.0 - 2.0 * 3.0_f64.exp().ln_1p(), epsilon = 1e-12);
    }

    #[test]
    fn unit_kernel_is_flat() {
        // x = logit(u) ~ logistic means u is uniform on (0, 1).
        let kernel = LogisticKernel::new(arr2(&[[1.0]]), arr1(&[0.0])).unwrap();
        for &u in &[0.01, 0.2, 0.5, 0.77, 0.99] {
            let (value, grad) = kernel.log_density_and_gradient(arr1(&[u]).view());
            assert_abs_diff_eq!(value, 0.0, epsilon = 1e-10);
            assert_abs_diff_eq!(grad[0], 0.0, epsilon = 1e-8);
        }
    }

    #[test]
    fn gradient_matches_finite_differences() {
        let kernel = kernel_2d();
        let u = arr1(&[0.3, 0.65]);
        let analytic = kernel.gradient(u.view());
        let numeric = finite_difference(Objective::Kernel, &kernel, &u);
        assert_abs_diff_eq!(analytic, numeric, epsilon = 1e-5);
    }

    #[test]
    fn penalized_gradients_match_finite_differences() {
        let kernel = kernel_2d();
        let u = arr1(&[0.3, 0.65]);

        let lower = Objective::LowerPenalized { axis: 1, mu: 0.8 };
        let (_, analytic) = lower.evaluate(&kernel, u.view());
        assert_abs_diff_eq!(analytic, finite_difference(lower, &kernel, &u), epsilon = 1e-5);

        let upper = Objective::UpperPenalized { axis: 0, mu: 0.1 };
        let (_, analytic) = upper.evaluate(&kernel, u.view());
        assert_abs_diff_eq!(analytic, finite_difference(upper, &kernel, &u), epsilon = 1e-5);
    }

    #[test]
    fn penalized_values_add_the_log_gap() {
        let kernel = kernel_2d();
        let u = arr1(&[0.3, 0.65]);
        let log_f = kernel.log_density(u.view());
        let (lower, _) = Objective::LowerPenalized { axis: 0, mu: 0.5 }.evaluate(&kernel, u.view());
        assert_abs_diff_eq!(lower, -log_f - 4.0 * 0.2_f64.ln(), epsilon = 1e-12);
        let (upper, _) = Objective::UpperPenalized { axis: 1, mu: 0.4 }.evaluate(&kernel, u.view());
        assert_abs_diff_eq!(upper, log_f + 4.0 * 0.25_f64.ln(), epsilon = 1e-12);
    }

    #[test]
    fn rejects_mismatched_offset() {
        let res = LogisticKernel::new(arr2(&[[1.0, 0.0], [0.0, 1.0]]), arr1(&[0.0]));
        assert!(res.is_err(), "Expected a dimension mismatch, got {res:?}.");
        let kernel = kernel_2d();
        assert!(kernel.check_point(arr1(&[0.5]).view()).is_err());
        assert!(kernel.check_point(arr1(&[0.5, 0.5]).view()).is_ok());
    }
}
