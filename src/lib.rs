//! Exact sampling from logistic-likelihood kernels on the unit cube with the generalized
//! ratio-of-uniforms method, plus exact-rational half-space updates for polytope-based
//! inference.

pub mod bounds;
pub mod config;
pub mod error;
pub mod hrep;
pub mod kernel;
pub mod mode;
pub mod optim;
pub mod sampler;
pub mod stats;
pub mod truncated;

pub use bounds::Envelope;
pub use config::{OptimControl, SamplerConfig};
pub use error::{Result, SamplerError};
pub use hrep::{update_half_spaces, BinaryResponse, HRepresentation, HalfSpaceUpdate};
pub use kernel::LogisticKernel;
pub use mode::{find_mode, Mode};
pub use sampler::{sample_kernel, RatioOfUniforms};
