//! Dense linear algebra primitives.

mod gemm;

pub use gemm::{gemm, Transpose, ROW_BLOCK};
