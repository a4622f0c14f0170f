//! Error type shared by every entry point of the crate.

use thiserror::Error;

/// Errors raised while building envelopes, sampling, or updating half-space representations.
///
/// Optimizer non-convergence is not an error: a local search that stops early still
/// yields its best iterate, and the caller is informed through the log instead.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SamplerError {
    #[error("Dimension mismatch for {what}: expected {expected}, found {found}.")]
    DimensionMismatch {
        what: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("Invalid box constraint at coordinate {index}: lower bound {lower} exceeds upper bound {upper}.")]
    InvalidBounds { index: usize, lower: f64, upper: f64 },

    #[error("Axis {axis} is out of range for a {dim}-dimensional kernel.")]
    AxisOutOfRange { axis: usize, dim: usize },

    #[error("Objective is not finite at the starting point (value = {value}).")]
    InitialValueNotFinite { value: f64 },

    #[error("Start grid of 3^{dimension} points does not fit in memory.")]
    GridTooLarge { dimension: usize },

    #[error("Empty bounding envelope on axis {axis}: vmin = {vmin}, vmax = {vmax}.")]
    EmptyEnvelope { axis: usize, vmin: f64, vmax: f64 },

    #[error("Invalid envelope height umax = {umax}; expected a finite positive value.")]
    InvalidUmax { umax: f64 },

    #[error(
        "Sampling did not finish: {accepted} of {requested} draws accepted after {attempts} attempts. The envelope is likely too loose."
    )]
    AttemptsExhausted {
        attempts: u64,
        accepted: usize,
        requested: usize,
    },

    #[error("H-representation and point collections differ in length ({h} vs. {points}).")]
    MismatchedRegions { h: usize, points: usize },

    #[error("Point set of region {region} is empty.")]
    EmptyPointSet { region: usize },

    #[error("Point set of region {region} yields a NaN linear functional.")]
    PointSetNotComparable { region: usize },

    #[error("Binary response must be 0 or 1, got {0}.")]
    InvalidResponse(i64),

    #[error("Coefficient {value} has no exact rational representation.")]
    NonFiniteCoefficient { value: f64 },

    #[error("Could not parse {text:?} as an exact rational.")]
    RationalParse { text: String },
}

pub type Result<T> = std::result::Result<T, SamplerError>;

/// Checks that a dimension matches what the caller expects.
pub(crate) fn ensure_dim(what: &'static str, expected: usize, found: usize) -> Result<()> {
    if expected == found {
        Ok(())
    } else {
        Err(SamplerError::DimensionMismatch {
            what,
            expected,
            found,
        })
    }
}
