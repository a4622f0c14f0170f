/*!
Multi-start search for the mode of a [`LogisticKernel`].

Every coordinate of a start point is placed at one of `0.01`, `0.5`, `0.99`, and all `3^d`
combinations are visited. Each start is refined with [`BoxLbfgs`] over
`[√ε, 1 - √ε]^d`, and the best local optimum becomes the mode `mu`. Its log-density `V`
fixes the envelope height `umax = exp(V)^{2/(d+2)}`.

# Examples

```rust
use logis_rou::config::OptimControl;
use logis_rou::kernel::LogisticKernel;
use logis_rou::mode::find_mode;
use ndarray::{arr1, arr2};

let kernel = LogisticKernel::new(arr2(&[[2.0]]), arr1(&[0.0])).unwrap();
let mode = find_mode(&kernel, &OptimControl::default()).unwrap();
assert!((mode.mu[0] - 0.5).abs() < 1e-3);
assert!((mode.umax - 1.0).abs() < 1e-6);
```
*/

use ndarray::{Array1, Array2};

use crate::config::OptimControl;
use crate::error::{Result, SamplerError};
use crate::kernel::{LogisticKernel, Objective};
use crate::optim::BoxLbfgs;

/// Per-coordinate start values of the search grid.
pub const GRID_POINTS: [f64; 3] = [0.01, 0.5, 0.99];

/// Mode of the kernel and the envelope height derived from it.
#[derive(Debug, Clone, PartialEq)]
pub struct Mode {
    /// Arg-max of `log_f` on the unit cube.
    pub mu: Array1<f64>,
    /// `exp(V)^{2/(d+2)}` where `V = log_f(mu)`.
    pub umax: f64,
    /// `V = log_f(mu)`.
    pub log_density: f64,
}

/// Expands `n` in the mixed radix given by `radices`, least significant digit first.
///
/// Every `n` below the product of the radices maps to a distinct digit vector.
pub fn mixed_radix_digits(mut n: usize, radices: &[usize]) -> Vec<usize> {
    radices
        .iter()
        .map(|&radix| {
            let digit = n % radix;
            n /= radix;
            digit
        })
        .collect()
}

/// Builds the `3^d × d` matrix of start points, one start per row.
pub fn start_grid(d: usize) -> Result<Array2<f64>> {
    let n_points = u32::try_from(d)
        .ok()
        .and_then(|exp| GRID_POINTS.len().checked_pow(exp))
        .ok_or(SamplerError::GridTooLarge { dimension: d })?;
    let radices = vec![GRID_POINTS.len(); d];

    let mut grid = Array2::<f64>::zeros((n_points, d));
    for (n, mut row) in grid.rows_mut().into_iter().enumerate() {
        for (value, digit) in row.iter_mut().zip(mixed_radix_digits(n, &radices)) {
            *value = GRID_POINTS[digit];
        }
    }
    Ok(grid)
}

/// Locates the mode of `kernel` and the envelope height `umax`.
///
/// Local searches that stop without converging are logged and their best iterate is
/// still considered. Ties between starts resolve to the earliest start in grid order.
pub fn find_mode(kernel: &LogisticKernel, control: &OptimControl) -> Result<Mode> {
    let d = kernel.dim();
    let eps = f64::EPSILON.sqrt();
    let starts = start_grid(d)?;

    let mut mu = Array1::<f64>::from_elem(d, 0.5);
    let mut log_density = f64::NEG_INFINITY;
    for (index, start) in starts.rows().into_iter().enumerate() {
        let solution = BoxLbfgs::new(start.to_owned(), |u: &Array1<f64>| {
            let (value, grad) = Objective::Kernel.evaluate(kernel, u.view());
            (-value, -grad)
        })
        .with_bounds(Array1::from_elem(d, eps), Array1::from_elem(d, 1.0 - eps))
        .with_control(*control)
        .run()?;

        let value = -solution.value;
        if !solution.status.is_converged() {
            log::warn!(
                "umax: local search from start {index} {start} stopped: {} after {} iterations (log_f = {value:.6e}).",
                solution.status,
                solution.iterations
            );
        }
        log::debug!("umax: start {index} reached log_f = {value:.10e}.");

        if value > log_density {
            mu = solution.x;
            log_density = value;
        }
    }

    let umax = (2.0 * log_density / (d + 2) as f64).exp();
    Ok(Mode {
        mu,
        umax,
        log_density,
    })
}
