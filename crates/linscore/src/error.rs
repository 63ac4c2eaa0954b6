//! Error types for kernel construction, invocation and dispatch.
//!
//! Construction failures ([`ConfigError`]) mean the model definition is
//! malformed and are not retryable. Invocation failures ([`ComputeError`])
//! are all invalid-argument failures: no output is produced and the kernel
//! stays usable for the next call.

use crate::element::DataType;

// =============================================================================
// Construction Errors
// =============================================================================

/// Kernel construction error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A required attribute is absent.
    #[error("missing required attribute '{0}'")]
    MissingAttribute(String),

    /// An attribute is present but holds a different kind of value.
    #[error("attribute '{name}' must be of type {expected}, got {actual}")]
    AttributeType {
        name: String,
        expected: &'static str,
        actual: &'static str,
    },

    /// `targets` must be a positive integer.
    #[error("targets must be > 0, got {0}")]
    InvalidTargets(i64),

    /// The coefficient count is not a whole number of rows of length `feature_size`.
    #[error("coefficients length {len} is not a multiple of targets {targets}")]
    CoefficientShape { len: usize, targets: usize },

    /// `post_transform` names no known transform.
    #[error("unknown post_transform '{0}'")]
    UnknownTransform(String),

    /// A boolean-valued integer attribute holds something other than 0 or 1.
    #[error("attribute '{name}' must be 0 or 1, got {value}")]
    InvalidFlag { name: &'static str, value: i64 },

    /// The node definition could not be parsed.
    #[error("invalid node definition: {0}")]
    Parse(#[from] serde_json::Error),
}

// =============================================================================
// Invocation Errors
// =============================================================================

/// Kernel invocation error. Every variant is an invalid-argument failure.
#[derive(Debug, thiserror::Error)]
pub enum ComputeError {
    /// Rank-0 input; a scalar cannot hold feature vectors.
    #[error("Input shape needs to be at least a single dimension.")]
    ScalarInput,

    /// The input feature dimension disagrees with the coefficient matrix.
    #[error("input has {actual} features per row, model expects {expected}")]
    FeatureMismatch { expected: usize, actual: usize },

    /// The input buffer holds fewer values than its leading dimensions imply.
    #[error("input holds {available} values, need at least {needed}")]
    InputTooShort { needed: usize, available: usize },

    /// Wrong number of inputs for the operator.
    #[error("expected {expected} inputs, got {actual}")]
    InputCount { expected: &'static str, actual: usize },

    /// Input element type differs from the kernel's precision.
    #[error("expected {expected} input, got {actual}")]
    DtypeMismatch { expected: DataType, actual: DataType },

    /// An input has the wrong rank.
    #[error("input '{input}' must have rank {expected}, got {actual}")]
    RankMismatch {
        input: &'static str,
        expected: usize,
        actual: usize,
    },

    /// Inner dimensions of a matrix product disagree.
    #[error("inner dimensions disagree: {left} vs {right}")]
    InnerDimMismatch { left: usize, right: usize },

    /// A bias input cannot be broadcast to the output shape.
    #[error("cannot broadcast shape {from:?} to {to:?}")]
    Broadcast { from: Vec<usize>, to: [usize; 2] },

    /// An ndarray view could not be formed over the input buffer.
    #[error("shape error: {0}")]
    Shape(#[from] ndarray::ShapeError),
}

// =============================================================================
// Dispatch Errors
// =============================================================================

/// Kernel registry error.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// No registered kernel matches the request.
    #[error("no kernel for {op_type} (domain '{domain}', opset {opset}, {dtype})")]
    NoKernel {
        op_type: String,
        domain: String,
        opset: u32,
        dtype: DataType,
    },

    /// A registration overlaps an existing version range.
    #[error("kernel {op_type} (domain '{domain}', {dtype}) already registered for an overlapping version range")]
    OverlappingKernel {
        op_type: String,
        domain: String,
        dtype: DataType,
    },

    /// The matched kernel rejected the node's attributes.
    #[error(transparent)]
    Config(#[from] ConfigError),
}
