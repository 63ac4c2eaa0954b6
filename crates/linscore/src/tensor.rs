//! Dtype-tagged tensors passed across the [`Kernel`](crate::kernel::Kernel) boundary.

use ndarray::{ArrayD, ArrayViewD};

use crate::element::{DataType, Element};

/// An owned n-d array tagged with its element type.
///
/// Rank 0 is representable (a scalar) and is rejected by kernels that need
/// feature vectors.
#[derive(Debug, Clone, PartialEq)]
pub enum TensorValue {
    Float(ArrayD<f32>),
    Double(ArrayD<f64>),
}

impl TensorValue {
    /// Element type of the stored array.
    pub fn dtype(&self) -> DataType {
        match self {
            TensorValue::Float(_) => DataType::Float,
            TensorValue::Double(_) => DataType::Double,
        }
    }

    /// Shape of the stored array; rank is `shape().len()`.
    pub fn shape(&self) -> &[usize] {
        match self {
            TensorValue::Float(a) => a.shape(),
            TensorValue::Double(a) => a.shape(),
        }
    }

    /// Borrow the array as precision `T`, or `None` on a dtype mismatch.
    pub fn view<T: Element>(&self) -> Option<ArrayViewD<'_, T>> {
        T::view_of(self)
    }
}

impl From<ArrayD<f32>> for TensorValue {
    fn from(array: ArrayD<f32>) -> Self {
        TensorValue::Float(array)
    }
}

impl From<ArrayD<f64>> for TensorValue {
    fn from(array: ArrayD<f64>) -> Self {
        TensorValue::Double(array)
    }
}
