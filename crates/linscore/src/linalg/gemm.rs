//! General matrix multiply: `C ← α·op(A)·op(B) + β·C`.

use ndarray::linalg::general_mat_mul;
use ndarray::parallel::prelude::*;
use ndarray::{s, ArrayView2, ArrayViewMut2, Axis};
use rayon::ThreadPool;

use crate::element::Element;
use crate::utils::run_in_pool;

/// Rows of `C` handed to one task when multiplying in parallel.
pub const ROW_BLOCK: usize = 64;

/// Whether an operand is used as stored or transposed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Transpose {
    #[default]
    No,
    Yes,
}

impl Transpose {
    #[inline]
    pub fn from_flag(flag: bool) -> Self {
        if flag {
            Transpose::Yes
        } else {
            Transpose::No
        }
    }

    /// Apply to a view without copying.
    #[inline]
    pub fn apply<'a, T>(self, view: ArrayView2<'a, T>) -> ArrayView2<'a, T> {
        match self {
            Transpose::No => view,
            Transpose::Yes => view.reversed_axes(),
        }
    }
}

/// Compute `C ← α·op(A)·op(B) + β·C` in place.
///
/// With a multi-threaded `pool` and more than one [`ROW_BLOCK`] of rows, `C`
/// is split into row blocks that are multiplied in parallel inside the pool.
/// Each block runs the same routine as the serial path, so only the split
/// differs.
///
/// When `beta` is zero, `C` must not hold NaN/Inf (freshly zeroed output).
///
/// # Panics
///
/// Panics if `op(A)` is not `M×K`, `op(B)` is not `K×N`, or `C` is not `M×N`.
#[allow(clippy::too_many_arguments)]
pub fn gemm<T: Element>(
    trans_a: Transpose,
    trans_b: Transpose,
    alpha: T,
    a: ArrayView2<'_, T>,
    b: ArrayView2<'_, T>,
    beta: T,
    mut c: ArrayViewMut2<'_, T>,
    pool: Option<&ThreadPool>,
) {
    let a = trans_a.apply(a);
    let b = trans_b.apply(b);
    let (m, k) = a.dim();
    let (k2, n) = b.dim();
    assert_eq!(k, k2, "inner dimensions disagree: {} vs {}", k, k2);
    assert_eq!(c.dim(), (m, n), "output must be {}x{}", m, n);

    if m <= ROW_BLOCK {
        general_mat_mul(alpha, &a, &b, beta, &mut c);
        return;
    }

    run_in_pool(pool, |parallelism| {
        if parallelism.is_parallel() {
            c.axis_chunks_iter_mut(Axis(0), ROW_BLOCK)
                .into_par_iter()
                .enumerate()
                .for_each(|(block, mut c_block)| {
                    let start = block * ROW_BLOCK;
                    let a_block = a.slice(s![start..start + c_block.nrows(), ..]);
                    general_mat_mul(alpha, &a_block, &b, beta, &mut c_block);
                });
        } else {
            general_mat_mul(alpha, &a, &b, beta, &mut c);
        }
    });
}
