//! The `Gemm` operator: `Y = α·op(A)·op(B) + β·C`.

use ndarray::{Array2, ArrayView2, ArrayViewD, Ix2};
use rayon::ThreadPool;

use crate::attributes::Attributes;
use crate::element::Element;
use crate::error::{ComputeError, ConfigError};
use crate::kernel::{typed_input, Kernel};
use crate::linalg::{gemm, Transpose};
use crate::tensor::TensorValue;

/// Operator name this kernel is registered under.
pub const OP_TYPE: &str = "Gemm";

/// First opset in which the `C` input may be omitted.
pub const OPTIONAL_C_SINCE: u32 = 11;

/// General matrix multiply operator.
///
/// `A` and `B` must be rank 2. `C` is broadcast to `[M, N]`; when it is
/// absent, or `beta` is zero, the `β·C` term is dropped. Kernels built for
/// opsets before [`OPTIONAL_C_SINCE`] reject calls without `C`.
#[derive(Debug, Clone)]
pub struct Gemm<T: Element> {
    trans_a: Transpose,
    trans_b: Transpose,
    alpha: T,
    beta: T,
    require_c: bool,
}

impl<T: Element> Gemm<T> {
    pub fn new(trans_a: bool, trans_b: bool, alpha: T, beta: T) -> Self {
        Self {
            trans_a: Transpose::from_flag(trans_a),
            trans_b: Transpose::from_flag(trans_b),
            alpha,
            beta,
            require_c: false,
        }
    }

    /// Configure for `opset`: below [`OPTIONAL_C_SINCE`] the `C` input is mandatory.
    pub fn for_opset(mut self, opset: u32) -> Self {
        self.require_c = opset < OPTIONAL_C_SINCE;
        self
    }

    /// Build from `transA`, `transB` (0/1, default 0) and `alpha`, `beta` (default 1.0).
    pub fn from_attributes(attrs: &Attributes) -> Result<Self, ConfigError> {
        let gemm = Self {
            trans_a: transpose_flag(attrs, "transA")?,
            trans_b: transpose_flag(attrs, "transB")?,
            alpha: T::from_attr(attrs.float_or("alpha", 1.0)?),
            beta: T::from_attr(attrs.float_or("beta", 1.0)?),
            require_c: false,
        };
        tracing::debug!(
            trans_a = ?gemm.trans_a,
            trans_b = ?gemm.trans_b,
            alpha = %gemm.alpha,
            beta = %gemm.beta,
            "built gemm"
        );
        Ok(gemm)
    }

    pub fn compute(
        &self,
        a: ArrayViewD<'_, T>,
        b: ArrayViewD<'_, T>,
        c: Option<ArrayViewD<'_, T>>,
        pool: Option<&ThreadPool>,
    ) -> Result<Array2<T>, ComputeError> {
        let a = as_matrix(a, "A")?;
        let b = as_matrix(b, "B")?;
        let (m, k) = self.trans_a.apply(a.view()).dim();
        let (k2, n) = self.trans_b.apply(b.view()).dim();
        if k != k2 {
            return Err(ComputeError::InnerDimMismatch { left: k, right: k2 });
        }

        let (mut y, beta) = match c {
            Some(c) if self.beta != T::zero() => {
                let bias = c.broadcast((m, n)).ok_or_else(|| ComputeError::Broadcast {
                    from: c.shape().to_vec(),
                    to: [m, n],
                })?;
                (bias.to_owned(), self.beta)
            }
            _ => (Array2::zeros((m, n)), T::zero()),
        };

        gemm(self.trans_a, self.trans_b, self.alpha, a, b, beta, y.view_mut(), pool);
        Ok(y)
    }
}

impl<T: Element> Kernel for Gemm<T> {
    fn op_type(&self) -> &'static str {
        OP_TYPE
    }

    fn compute_tensors(&self, inputs: &[TensorValue], pool: Option<&ThreadPool>) -> Result<TensorValue, ComputeError> {
        let (a, b, c) = match inputs {
            [a, b] if !self.require_c => (a, b, None),
            [a, b, c] => (a, b, Some(c)),
            _ => {
                return Err(ComputeError::InputCount {
                    expected: if self.require_c { "3" } else { "2 or 3" },
                    actual: inputs.len(),
                })
            }
        };
        let c = c.map(typed_input::<T>).transpose()?;
        let y = self.compute(typed_input::<T>(a)?, typed_input::<T>(b)?, c, pool)?;
        Ok(T::into_tensor(y.into_dyn()))
    }
}

fn transpose_flag(attrs: &Attributes, name: &'static str) -> Result<Transpose, ConfigError> {
    match attrs.int_or(name, 0)? {
        0 => Ok(Transpose::No),
        1 => Ok(Transpose::Yes),
        value => Err(ConfigError::InvalidFlag { name, value }),
    }
}

fn as_matrix<'a, T: Element>(x: ArrayViewD<'a, T>, input: &'static str) -> Result<ArrayView2<'a, T>, ComputeError> {
    let rank = x.ndim();
    x.into_dimensionality::<Ix2>()
        .map_err(|_| ComputeError::RankMismatch {
            input,
            expected: 2,
            actual: rank,
        })
}
