/*!
Axis bounds and the bounding envelope of the ratio-of-uniforms region.

For the mode `mu` and each coordinate `i`, the envelope needs the extremal values of
`(uᵢ - muᵢ) · f(u)^{1/(d+2)}` on either side of the mode:

- `vminᵢ = -exp(-V₁ / (d+2))` where `V₁ = min −log_f(u) − (d+2) ln(muᵢ − uᵢ)` over
  `uᵢ ∈ [ε, muᵢ − ε]`,
- `vmaxᵢ = exp(V₂ / (d+2))` where `V₂ = max log_f(u) + (d+2) ln(uᵢ − muᵢ)` over
  `uᵢ ∈ [muᵢ + ε, 1 − ε]`,

with every other coordinate free in `[ε, 1 − ε]` and `ε = √machine-ε / 3`. Each search is
single-start.

Together with [`crate::mode::find_mode`] these give the rectangle
`{0 < u ≤ umax} × Πᵢ [vminᵢ, vmaxᵢ]` assembled by [`Envelope::compute`].
*/

use ndarray::{Array1, ArrayView1};

use crate::config::OptimControl;
use crate::error::{Result, SamplerError};
use crate::kernel::{LogisticKernel, Objective};
use crate::mode::find_mode;
use crate::optim::BoxLbfgs;

fn axis_margin() -> f64 {
    f64::EPSILON.sqrt() / 3.0
}

fn check_axis(kernel: &LogisticKernel, axis: usize, mu: ArrayView1<f64>) -> Result<()> {
    kernel.check_point(mu)?;
    if axis >= kernel.dim() {
        return Err(SamplerError::AxisOutOfRange {
            axis,
            dim: kernel.dim(),
        });
    }
    Ok(())
}

/// Lower extremal displacement `vminᵢ` for `axis`.
pub fn axis_lower_bound(
    kernel: &LogisticKernel,
    axis: usize,
    mu: ArrayView1<f64>,
    control: &OptimControl,
) -> Result<f64> {
    check_axis(kernel, axis, mu)?;
    let d = kernel.dim();
    let eps = axis_margin();
    let objective = Objective::LowerPenalized { axis, mu: mu[axis] };

    let mut init = Array1::from_elem(d, 0.5);
    init[axis] = mu[axis] / 2.0;
    let lower = Array1::from_elem(d, eps);
    let mut upper = Array1::from_elem(d, 1.0 - eps);
    upper[axis] = mu[axis] - eps;

    let solution = BoxLbfgs::new(init, |u: &Array1<f64>| objective.evaluate(kernel, u.view()))
        .with_bounds(lower, upper)
        .with_control(*control)
        .run()?;
    if !solution.status.is_converged() {
        log::warn!(
            "vmin: search on axis {axis} stopped: {} after {} iterations (value = {:.6e}).",
            solution.status,
            solution.iterations,
            solution.value
        );
    }
    Ok(-(-solution.value / kernel.rou_weight()).exp())
}

/// Upper extremal displacement `vmaxᵢ` for `axis`.
pub fn axis_upper_bound(
    kernel: &LogisticKernel,
    axis: usize,
    mu: ArrayView1<f64>,
    control: &OptimControl,
) -> Result<f64> {
    check_axis(kernel, axis, mu)?;
    let d = kernel.dim();
    let eps = axis_margin();
    let objective = Objective::UpperPenalized { axis, mu: mu[axis] };

    let mut init = Array1::from_elem(d, 0.5);
    init[axis] = (mu[axis] + 1.0) / 2.0;
    let mut lower = Array1::from_elem(d, eps);
    lower[axis] = mu[axis] + eps;
    let upper = Array1::from_elem(d, 1.0 - eps);

    let solution = BoxLbfgs::new(init, |u: &Array1<f64>| {
        let (value, grad) = objective.evaluate(kernel, u.view());
        (-value, -grad)
    })
    .with_bounds(lower, upper)
    .with_control(*control)
    .run()?;
    let value = -solution.value;
    if !solution.status.is_converged() {
        log::warn!(
            "vmax: search on axis {axis} stopped: {} after {} iterations (value = {value:.6e}).",
            solution.status,
            solution.iterations
        );
    }
    Ok((value / kernel.rou_weight()).exp())
}

/// `vmin` for every coordinate.
pub fn axis_lower_bounds(
    kernel: &LogisticKernel,
    mu: ArrayView1<f64>,
    control: &OptimControl,
) -> Result<Array1<f64>> {
    let bounds = (0..kernel.dim())
        .map(|axis| axis_lower_bound(kernel, axis, mu, control))
        .collect::<Result<Vec<f64>>>()?;
    Ok(Array1::from(bounds))
}

/// `vmax` for every coordinate.
pub fn axis_upper_bounds(
    kernel: &LogisticKernel,
    mu: ArrayView1<f64>,
    control: &OptimControl,
) -> Result<Array1<f64>> {
    let bounds = (0..kernel.dim())
        .map(|axis| axis_upper_bound(kernel, axis, mu, control))
        .collect::<Result<Vec<f64>>>()?;
    Ok(Array1::from(bounds))
}

/// The rectangle `{0 < u ≤ umax} × Πᵢ [vminᵢ, vmaxᵢ]` enclosing the acceptance region.
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    pub umax: f64,
    pub mu: Array1<f64>,
    pub vmin: Array1<f64>,
    pub vmax: Array1<f64>,
}

impl Envelope {
    /// Runs the mode search once, then both axis-bound searches on every coordinate.
    pub fn compute(kernel: &LogisticKernel, control: &OptimControl) -> Result<Self> {
        let mode = find_mode(kernel, control)?;
        let vmin = axis_lower_bounds(kernel, mode.mu.view(), control)?;
        let vmax = axis_upper_bounds(kernel, mode.mu.view(), control)?;
        log::debug!(
            "envelope: umax = {:.6e}, mu = {}, vmin = {vmin}, vmax = {vmax}",
            mode.umax,
            mode.mu
        );
        Ok(Self {
            umax: mode.umax,
            mu: mode.mu,
            vmin,
            vmax,
        })
    }

    pub fn dim(&self) -> usize {
        self.mu.len()
    }

    /// Rejects envelopes with zero acceptance probability, which would make the
    /// rejection loop spin forever.
    pub fn validate(&self) -> Result<()> {
        if !(self.umax.is_finite() && self.umax > 0.0) {
            return Err(SamplerError::InvalidUmax { umax: self.umax });
        }
        for (axis, (&vmin, &vmax)) in self.vmin.iter().zip(self.vmax.iter()).enumerate() {
            if !(vmin.is_finite() && vmax.is_finite() && vmin < vmax) {
                return Err(SamplerError::EmptyEnvelope { axis, vmin, vmax });
            }
        }
        Ok(())
    }
}
