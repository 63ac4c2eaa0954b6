//! Numeric element types.
//!
//! Every kernel is generic over one [`Element`] precision and never mixes
//! precisions inside a call. The precision is picked once, when the kernel is
//! built, from the model's declared [`DataType`].

use std::fmt;

use ndarray::{ArrayD, ArrayViewD, LinalgScalar};
use num_traits::{Float, FloatConst, NumAssign};
use serde::{Deserialize, Serialize};

use crate::tensor::TensorValue;

/// Declared element type of a tensor or kernel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    /// 32-bit IEEE float.
    Float,
    /// 64-bit IEEE float.
    Double,
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataType::Float => f.write_str("float"),
            DataType::Double => f.write_str("double"),
        }
    }
}

/// Floating-point precision a kernel can be instantiated with.
///
/// Implemented for `f32` and `f64`.
pub trait Element:
    Float + FloatConst + NumAssign + LinalgScalar + Send + Sync + fmt::Debug + fmt::Display
{
    /// The tag matching this precision.
    const DTYPE: DataType;

    /// Convert a float attribute value. Attributes are stored as `f32`.
    fn from_attr(v: f32) -> Self;

    /// Convert a numeric literal.
    fn lit(v: f64) -> Self;

    /// Borrow the array inside `tensor` if it holds this precision.
    fn view_of(tensor: &TensorValue) -> Option<ArrayViewD<'_, Self>>;

    /// Wrap an owned array of this precision.
    fn into_tensor(array: ArrayD<Self>) -> TensorValue;
}

impl Element for f32 {
    const DTYPE: DataType = DataType::Float;

    #[inline]
    fn from_attr(v: f32) -> Self {
        v
    }

    #[inline]
    fn lit(v: f64) -> Self {
        v as f32
    }

    fn view_of(tensor: &TensorValue) -> Option<ArrayViewD<'_, Self>> {
        match tensor {
            TensorValue::Float(a) => Some(a.view()),
            TensorValue::Double(_) => None,
        }
    }

    fn into_tensor(array: ArrayD<Self>) -> TensorValue {
        TensorValue::Float(array)
    }
}

impl Element for f64 {
    const DTYPE: DataType = DataType::Double;

    #[inline]
    fn from_attr(v: f32) -> Self {
        f64::from(v)
    }

    #[inline]
    fn lit(v: f64) -> Self {
        v
    }

    fn view_of(tensor: &TensorValue) -> Option<ArrayViewD<'_, Self>> {
        match tensor {
            TensorValue::Double(a) => Some(a.view()),
            TensorValue::Float(_) => None,
        }
    }

    fn into_tensor(array: ArrayD<Self>) -> TensorValue {
        TensorValue::Double(array)
    }
}
