//! The `LinearRegressor` scoring kernel.
//!
//! Scores a batch of feature rows against a coefficient matrix:
//!
//! ```text
//! Y = post_transform(X · coefficientsᵀ + intercepts)
//! ```
//!
//! where `X` is `[N, feature_size]`, `coefficients` is
//! `[targets, feature_size]` and `Y` is `[N, targets]`. The output buffer is
//! written three times in sequence: matrix multiply, bias add, transform.

use ndarray::{s, Array1, Array2, ArrayView1, ArrayView2, ArrayViewD, ArrayViewMut2, Axis};
use rayon::ThreadPool;

use crate::attributes::Attributes;
use crate::element::Element;
use crate::error::{ComputeError, ConfigError};
use crate::kernel::{typed_input, Kernel};
use crate::linalg::{gemm, Transpose};
use crate::tensor::TensorValue;
use crate::transform::PostTransform;
use crate::utils::{run_in_pool, Parallelism};

/// Operator name this kernel is registered under.
pub const OP_TYPE: &str = "LinearRegressor";

/// Linear regression scorer with an optional per-target bias and a post-transform.
///
/// Parameters are fixed at construction and never mutated by
/// [`compute`](Self::compute), so one instance can serve concurrent calls.
///
/// # Example
///
/// ```
/// use linscore::kernel::LinearRegressor;
/// use linscore::PostTransform;
/// use ndarray::array;
///
/// // y = 2·x0 + 3·x1 + 1
/// let model = LinearRegressor::<f32>::new(vec![2.0, 3.0], 1, vec![1.0], PostTransform::None).unwrap();
/// let y = model.compute(array![[1.0, 1.0]].into_dyn().view(), None).unwrap();
/// assert_eq!(y, array![[6.0]]);
/// ```
#[derive(Debug, Clone)]
pub struct LinearRegressor<T: Element> {
    /// Shape `[targets, feature_size]`, row-major.
    coefficients: Array2<T>,
    /// One bias per target; `None` means no bias is added.
    intercepts: Option<Array1<T>>,
    post_transform: PostTransform,
    /// Run bias-add and transform row-parallel when a pool is supplied.
    parallel_rows: bool,
}

impl<T: Element> LinearRegressor<T> {
    /// Build from a flat row-major coefficient list.
    ///
    /// `intercepts` is used only when it holds exactly `targets` values; an
    /// empty list means no bias, any other length is ignored with a warning.
    pub fn new(
        coefficients: Vec<T>,
        targets: usize,
        intercepts: Vec<T>,
        post_transform: PostTransform,
    ) -> Result<Self, ConfigError> {
        let len = coefficients.len();
        if targets == 0 {
            return Err(ConfigError::InvalidTargets(0));
        }
        if len % targets != 0 {
            return Err(ConfigError::CoefficientShape { len, targets });
        }
        let feature_size = len / targets;
        let coefficients = Array2::from_shape_vec((targets, feature_size), coefficients)
            .map_err(|_| ConfigError::CoefficientShape { len, targets })?;

        let intercepts = match intercepts.len() {
            0 => None,
            n if n == targets => Some(Array1::from(intercepts)),
            n => {
                tracing::warn!(
                    intercepts = n,
                    targets,
                    "intercepts length does not match targets; bias ignored"
                );
                None
            }
        };

        tracing::debug!(
            targets,
            feature_size,
            has_intercepts = intercepts.is_some(),
            post_transform = %post_transform,
            dtype = %T::DTYPE,
            "built linear regressor"
        );

        Ok(Self {
            coefficients,
            intercepts,
            post_transform,
            parallel_rows: true,
        })
    }

    /// Build from node attributes.
    ///
    /// | attribute        | kind     | default  |
    /// |------------------|----------|----------|
    /// | `targets`        | int      | required |
    /// | `coefficients`   | floats   | required |
    /// | `intercepts`     | floats   | empty    |
    /// | `post_transform` | string   | `NONE`   |
    pub fn from_attributes(attrs: &Attributes) -> Result<Self, ConfigError> {
        let intercepts = attrs.floats_or_empty("intercepts")?;
        let post_transform: PostTransform = attrs.string_or("post_transform", "NONE")?.parse()?;
        let targets = attrs.int("targets")?;
        let coefficients = attrs.floats("coefficients")?;

        let targets = usize::try_from(targets).map_err(|_| ConfigError::InvalidTargets(targets))?;

        Self::new(
            coefficients.iter().map(|&v| T::from_attr(v)).collect(),
            targets,
            intercepts.iter().map(|&v| T::from_attr(v)).collect(),
            post_transform,
        )
    }

    /// Enable or disable row-parallel bias-add and transform.
    pub fn with_parallel_rows(mut self, parallel_rows: bool) -> Self {
        self.parallel_rows = parallel_rows;
        self
    }

    /// Number of output columns per row.
    #[inline]
    pub fn targets(&self) -> usize {
        self.coefficients.nrows()
    }

    /// Number of input features per row.
    #[inline]
    pub fn feature_size(&self) -> usize {
        self.coefficients.ncols()
    }

    /// Coefficient matrix, shape `[targets, feature_size]`.
    #[inline]
    pub fn coefficients(&self) -> ArrayView2<'_, T> {
        self.coefficients.view()
    }

    /// Per-target bias, if one is applied.
    #[inline]
    pub fn intercepts(&self) -> Option<ArrayView1<'_, T>> {
        self.intercepts.as_ref().map(|b| b.view())
    }

    #[inline]
    pub fn post_transform(&self) -> PostTransform {
        self.post_transform
    }

    /// Score every row of `x`.
    ///
    /// A rank-1 input is one row of `feature_size` values. For higher ranks
    /// `shape[0]` is the row count and `shape[1]` the feature count; the
    /// first `N · feature_size` values of the row-major buffer are read.
    ///
    /// The multiply runs on `pool` when given; with row parallelism enabled
    /// the bias-add and transform passes do too.
    pub fn compute(&self, x: ArrayViewD<'_, T>, pool: Option<&ThreadPool>) -> Result<Array2<T>, ComputeError> {
        let (n, stride) = match x.shape() {
            [] => return Err(ComputeError::ScalarInput),
            [len] => (1, *len),
            [rows, cols, ..] => (*rows, *cols),
        };
        if stride != self.feature_size() {
            return Err(ComputeError::FeatureMismatch {
                expected: self.feature_size(),
                actual: stride,
            });
        }

        let needed = n * stride;
        if x.len() < needed {
            return Err(ComputeError::InputTooShort {
                needed,
                available: x.len(),
            });
        }

        tracing::trace!(rows = n, stride, targets = self.targets(), "linear regressor compute");

        let x = x.as_standard_layout();
        let flat = x.view().into_shape_with_order(x.len())?;
        let rows = flat.slice_move(s![..needed]).into_shape_with_order((n, stride))?;

        // [N, F] · [T, F]ᵀ → [N, T]
        let mut scores = Array2::zeros((n, self.targets()));
        gemm(
            Transpose::No,
            Transpose::Yes,
            T::one(),
            rows,
            self.coefficients.view(),
            T::zero(),
            scores.view_mut(),
            pool,
        );

        let row_pool = if self.parallel_rows { pool } else { None };
        run_in_pool(row_pool, |parallelism| {
            self.add_intercepts(scores.view_mut(), parallelism);
            self.post_transform.transform_rows(scores.view_mut(), parallelism);
        });

        Ok(scores)
    }

    /// Broadcast the bias across every row.
    fn add_intercepts(&self, mut scores: ArrayViewMut2<'_, T>, parallelism: Parallelism) {
        if let Some(intercepts) = &self.intercepts {
            parallelism.maybe_par_for_each(scores.axis_iter_mut(Axis(0)), |mut row| {
                row += intercepts;
            });
        }
    }
}

impl<T: Element> Kernel for LinearRegressor<T> {
    fn op_type(&self) -> &'static str {
        OP_TYPE
    }

    fn compute_tensors(&self, inputs: &[TensorValue], pool: Option<&ThreadPool>) -> Result<TensorValue, ComputeError> {
        let [x] = inputs else {
            return Err(ComputeError::InputCount {
                expected: "1",
                actual: inputs.len(),
            });
        };
        let scores = self.compute(typed_input::<T>(x)?, pool)?;
        Ok(T::into_tensor(scores.into_dyn()))
    }
}
