/*!
# Exact Half-Space Updates

Incrementally grows exact H-representations of the polytopes used by the exact-inference
variant of the sampler. Every region owns a matrix of rational constraints and a set of
extreme points. One update consumes a binary response `y` and a covariate vector `Xt`
and, for every region:

- `y = 0`: `MIN = min(points · Xt)`, `atilde` is a logistic draw truncated below at `MIN`,
  the weight is `1 - plogis(MIN)` and the new row is `[0, atilde, -Xt]`;
- `y = 1`: `MAX = max(points · Xt)`, `atilde` is a logistic draw truncated above at `MAX`,
  the weight is `plogis(MAX)` and the new row is `[0, -atilde, Xt]`.

Coefficients are converted losslessly from `f64` to [`BigRational`], so repeated updates
never accumulate rounding error. String forms use the canonical `p/q` notation.

## Example Usage

```rust
use logis_rou::hrep::{update_half_spaces, BinaryResponse, HRepresentation};
use ndarray::{arr1, arr2};
use rand::rngs::SmallRng;
use rand::SeedableRng;

let mut regions = vec![HRepresentation::new(4)];
let points = vec![arr2(&[[0.0, 1.0], [1.0, 0.0], [1.0, 1.0]])];
let xt = arr1(&[0.5, -0.25]);
let mut rng = SmallRng::seed_from_u64(42);

let update = update_half_spaces(&mut regions, &points, BinaryResponse::Zero, xt.view(), &mut rng).unwrap();
assert_eq!(regions[0].nrows(), 1);
assert_eq!(regions[0].row_strings(0)[0], "0");
assert_eq!(regions[0].row_strings(0)[2], "-1/2");
assert!(update.at[0] >= -0.25);
```
*/

use std::str::FromStr;

use ndarray::{Array1, Array2, ArrayView1, ArrayView2};
use ndarray_stats::errors::MinMaxError;
use ndarray_stats::QuantileExt;
use num_rational::BigRational;
use num_traits::{ToPrimitive, Zero};
use rand::Rng;
use rand_distr::Distribution;

use crate::error::{ensure_dim, Result, SamplerError};
use crate::truncated::TruncatedLogistic;

/// Representation tag attached to constraint matrices.
pub const REPRESENTATION: &str = "H";

/// Converts a finite `f64` to its exact rational string form, e.g. `0.5 → "1/2"`.
pub fn float_to_rational_string(x: f64) -> Result<String> {
    Ok(float_to_rational(x)?.to_string())
}

/// Parses a rational string (`"p/q"` or `"p"`) and rounds it to the nearest `f64`.
pub fn rational_string_to_f64(text: &str) -> Result<f64> {
    parse_rational(text)?
        .to_f64()
        .ok_or_else(|| SamplerError::RationalParse {
            text: text.to_string(),
        })
}

fn float_to_rational(x: f64) -> Result<BigRational> {
    BigRational::from_float(x).ok_or(SamplerError::NonFiniteCoefficient { value: x })
}

fn parse_rational(text: &str) -> Result<BigRational> {
    BigRational::from_str(text.trim()).map_err(|_| SamplerError::RationalParse {
        text: text.to_string(),
    })
}

/// Response of one observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryResponse {
    Zero,
    One,
}

impl From<bool> for BinaryResponse {
    fn from(y: bool) -> Self {
        if y {
            BinaryResponse::One
        } else {
            BinaryResponse::Zero
        }
    }
}

impl TryFrom<i64> for BinaryResponse {
    type Error = SamplerError;

    fn try_from(y: i64) -> Result<Self> {
        match y {
            0 => Ok(BinaryResponse::Zero),
            1 => Ok(BinaryResponse::One),
            other => Err(SamplerError::InvalidResponse(other)),
        }
    }
}

/// An exact-rational constraint matrix, one half-space per row.
#[derive(Debug, Clone, PartialEq)]
pub struct HRepresentation {
    matrix: Array2<BigRational>,
}

impl HRepresentation {
    /// An empty representation whose rows will have `ncols` entries.
    pub fn new(ncols: usize) -> Self {
        Self {
            matrix: Array2::zeros((0, ncols)),
        }
    }

    pub fn from_matrix(matrix: Array2<BigRational>) -> Self {
        Self { matrix }
    }

    /// Parses a matrix of rational strings.
    pub fn from_strings<S: AsRef<str>>(strings: ArrayView2<S>) -> Result<Self> {
        let mut matrix = Array2::<BigRational>::zeros(strings.raw_dim());
        for (dst, src) in matrix.iter_mut().zip(strings.iter()) {
            *dst = parse_rational(src.as_ref())?;
        }
        Ok(Self { matrix })
    }

    pub fn to_strings(&self) -> Array2<String> {
        self.matrix.map(|q| q.to_string())
    }

    pub fn row_strings(&self, row: usize) -> Vec<String> {
        self.matrix.row(row).iter().map(|q| q.to_string()).collect()
    }

    pub fn matrix(&self) -> &Array2<BigRational> {
        &self.matrix
    }

    pub fn nrows(&self) -> usize {
        self.matrix.nrows()
    }

    pub fn ncols(&self) -> usize {
        self.matrix.ncols()
    }

    pub fn representation(&self) -> &'static str {
        REPRESENTATION
    }

    /// Appends one constraint row.
    ///
    /// Rows are the growing axis, so the matrix is transposed, extended by one column and
    /// transposed back; both transposes are views over the same buffer.
    pub fn push_constraint(&mut self, row: ArrayView1<BigRational>) -> Result<()> {
        ensure_dim("constraint row", self.ncols(), row.len())?;
        let ncols = self.ncols();
        let mut transposed =
            std::mem::replace(&mut self.matrix, Array2::zeros((0, ncols))).reversed_axes();
        let pushed = transposed.push_column(row);
        self.matrix = transposed.reversed_axes();
        pushed.map_err(|_| SamplerError::DimensionMismatch {
            what: "constraint row",
            expected: ncols,
            found: row.len(),
        })
    }
}

/// Builds `[0, atilde, -Xt]` for `y = 0` or `[0, -atilde, Xt]` for `y = 1`.
pub fn constraint_row(
    xt: ArrayView1<f64>,
    atilde: f64,
    response: BinaryResponse,
) -> Result<Array1<BigRational>> {
    let (head, sign) = match response {
        BinaryResponse::Zero => (atilde, -1.0),
        BinaryResponse::One => (-atilde, 1.0),
    };
    let mut row = Vec::with_capacity(xt.len() + 2);
    row.push(BigRational::zero());
    row.push(float_to_rational(head)?);
    for &x in xt.iter() {
        row.push(float_to_rational(sign * x)?);
    }
    Ok(Array1::from(row))
}

/// Per-region auxiliary draws and importance weights of one update.
#[derive(Debug, Clone, PartialEq)]
pub struct HalfSpaceUpdate {
    pub at: Array1<f64>,
    pub weight: Array1<f64>,
}

fn extremal_value(
    region: usize,
    values: &Array1<f64>,
    response: BinaryResponse,
) -> Result<f64> {
    let extremum = match response {
        BinaryResponse::Zero => values.min(),
        BinaryResponse::One => values.max(),
    };
    extremum.copied().map_err(|e| match e {
        MinMaxError::EmptyInput => SamplerError::EmptyPointSet { region },
        MinMaxError::UndefinedOrder => SamplerError::PointSetNotComparable { region },
    })
}

/// Appends one constraint to every region in `h`.
///
/// `points[i]` holds the extreme points of region `i`, one per row. All inputs are
/// validated before any region is modified, so on error `h` is left untouched.
pub fn update_half_spaces<R: Rng + ?Sized>(
    h: &mut [HRepresentation],
    points: &[Array2<f64>],
    response: BinaryResponse,
    xt: ArrayView1<f64>,
    rng: &mut R,
) -> Result<HalfSpaceUpdate> {
    if h.len() != points.len() {
        return Err(SamplerError::MismatchedRegions {
            h: h.len(),
            points: points.len(),
        });
    }

    let mut extrema = Vec::with_capacity(h.len());
    for (region, (hi, pts)) in h.iter().zip(points.iter()).enumerate() {
        ensure_dim("constraint columns (2 + length of Xt)", xt.len() + 2, hi.ncols())?;
        ensure_dim("point coordinates (length of Xt)", xt.len(), pts.ncols())?;
        let values = pts.dot(&xt);
        extrema.push(extremal_value(region, &values, response)?);
    }

    let mut rows = Vec::with_capacity(h.len());
    let mut at = Array1::<f64>::zeros(h.len());
    let mut weight = Array1::<f64>::zeros(h.len());
    for (region, &extremum) in extrema.iter().enumerate() {
        let dist = match response {
            BinaryResponse::Zero => TruncatedLogistic::lower(extremum),
            BinaryResponse::One => TruncatedLogistic::upper(extremum),
        };
        let atilde = dist.sample(rng);
        at[region] = atilde;
        weight[region] = dist.mass();
        rows.push(constraint_row(xt, atilde, response)?);
    }

    for (hi, row) in h.iter_mut().zip(rows.iter()) {
        hi.push_constraint(row.view())?;
    }
    Ok(HalfSpaceUpdate { at, weight })
}
