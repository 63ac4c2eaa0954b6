//! Operator kernels.
//!
//! Each kernel is generic over one [`Element`] precision and exposes a typed
//! `compute` over ndarray views. The object-safe [`Kernel`] trait wraps that
//! for callers holding dtype-tagged [`TensorValue`]s, such as the
//! [`KernelRegistry`](crate::registry::KernelRegistry).
//!
//! - [`LinearRegressor`]: linear scores with bias and post-transform
//! - [`Gemm`]: general matrix multiply operator

pub mod gemm;
pub mod linear_regressor;

use std::fmt;

use ndarray::ArrayViewD;
use rayon::ThreadPool;

use crate::element::Element;
use crate::error::ComputeError;
use crate::tensor::TensorValue;

pub use gemm::Gemm;
pub use linear_regressor::LinearRegressor;

/// A constructed, immutable operator instance.
///
/// `compute_tensors` may be called concurrently from several threads; the
/// optional `pool` is only used for work inside one call.
pub trait Kernel: Send + Sync + fmt::Debug {
    /// Operator name the kernel implements.
    fn op_type(&self) -> &'static str;

    /// Run the operator on `inputs`, producing a freshly allocated output.
    fn compute_tensors(&self, inputs: &[TensorValue], pool: Option<&ThreadPool>) -> Result<TensorValue, ComputeError>;
}

/// Borrow `tensor` as precision `T`.
pub(crate) fn typed_input<T: Element>(tensor: &TensorValue) -> Result<ArrayViewD<'_, T>, ComputeError> {
    tensor.view::<T>().ok_or(ComputeError::DtypeMismatch {
        expected: T::DTYPE,
        actual: tensor.dtype(),
    })
}
