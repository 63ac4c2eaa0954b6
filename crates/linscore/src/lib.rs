//! linscore: linear-score inference kernels.
//!
//! Given a batch of feature rows and a trained linear model (coefficient
//! matrix, optional per-target bias, post-transform), produce per-target
//! scores for every row. Built on a dense matrix-multiply primitive that can
//! fan out across a caller-supplied thread pool.
//!
//! # Key Types
//!
//! - [`LinearRegressor`] - The scoring kernel, generic over `f32`/`f64`
//! - [`PostTransform`] - `NONE`, `SOFTMAX`, `LOGISTIC`, `SOFTMAX_ZERO`, `PROBIT`
//! - [`Gemm`] - General matrix multiply operator
//! - [`KernelRegistry`] - Resolves an operator, opset and dtype to a kernel
//!
//! # Scoring
//!
//! Build a kernel from node attributes with
//! [`LinearRegressor::from_attributes`], or through
//! [`KernelRegistry::create`] when the precision is decided at load time,
//! then call `compute` once per batch.

// Re-export approx traits for users who want to compare scores
pub use approx;

pub mod attributes;
pub mod config;
pub mod element;
pub mod error;
pub mod kernel;
pub mod linalg;
pub mod registry;
pub mod tensor;
pub mod transform;
pub mod utils;

// =============================================================================
// Convenience Re-exports
// =============================================================================

pub use attributes::{AttributeValue, Attributes, NodeDef};
pub use config::ExecutionConfig;
pub use element::{DataType, Element};
pub use error::{ComputeError, ConfigError, RegistryError};
pub use kernel::{Gemm, Kernel, LinearRegressor};
pub use registry::{KernelDef, KernelRegistry, VersionRange};
pub use tensor::TensorValue;
pub use transform::PostTransform;
pub use utils::{build_thread_pool, Parallelism};
