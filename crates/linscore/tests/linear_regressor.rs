//! End-to-end scoring tests for the LinearRegressor kernel.
//!
//! Covers:
//! - Zero models and bias broadcast
//! - Rank-1 vs rank-2 input equivalence
//! - Each post-transform on realistic score rows
//! - Both precisions
//! - Thread pool and row-parallel paths

use approx::assert_abs_diff_eq;
use linscore::{
    build_thread_pool, AttributeValue, Attributes, ComputeError, ConfigError, Element, LinearRegressor,
    PostTransform,
};
use ndarray::{arr0, array, Array2, ArrayD, IxDyn};
use rstest::rstest;

fn regressor<T: Element>(
    coefficients: &[f32],
    targets: i64,
    intercepts: &[f32],
    post_transform: &str,
) -> Result<LinearRegressor<T>, ConfigError> {
    let attrs = Attributes::new()
        .with("targets", AttributeValue::Int(targets))
        .with("coefficients", AttributeValue::Floats(coefficients.to_vec()))
        .with("intercepts", AttributeValue::Floats(intercepts.to_vec()))
        .with("post_transform", AttributeValue::String(post_transform.to_string()));
    LinearRegressor::from_attributes(&attrs)
}

// =============================================================================
// Basic scoring
// =============================================================================

#[test]
fn worked_example() {
    // feature_size = 2, targets = 1: 2·1 + 3·1 + 1 = 6
    let model = regressor::<f32>(&[2.0, 3.0], 1, &[1.0], "NONE").unwrap();
    let y = model.compute(array![[1.0f32, 1.0]].into_dyn().view(), None).unwrap();
    assert_eq!(y, array![[6.0]]);
}

#[test]
fn zero_model_gives_zero_scores() {
    let model = regressor::<f64>(&[0.0; 12], 3, &[0.0; 3], "NONE").unwrap();
    let x = Array2::from_shape_fn((5, 4), |(i, j)| (i * 4 + j) as f64);
    let y = model.compute(x.into_dyn().view(), None).unwrap();
    assert_eq!(y, Array2::<f64>::zeros((5, 3)));
}

#[test]
fn bias_is_broadcast_to_every_row() {
    let model = regressor::<f32>(&[0.0; 6], 3, &[1.5, -2.0, 0.25], "NONE").unwrap();
    let x = Array2::from_elem((4, 2), 9.0f32);
    let y = model.compute(x.into_dyn().view(), None).unwrap();
    for row in y.rows() {
        assert_eq!(row, array![1.5f32, -2.0, 0.25]);
    }
}

#[test]
fn empty_intercepts_give_raw_scores() {
    let with_bias = regressor::<f64>(&[1.0, 2.0], 1, &[0.0], "NONE").unwrap();
    let without = regressor::<f64>(&[1.0, 2.0], 1, &[], "NONE").unwrap();
    let x = array![[1.0, 2.0], [-3.0, 0.5]].into_dyn();
    assert_eq!(
        with_bias.compute(x.view(), None).unwrap(),
        without.compute(x.view(), None).unwrap()
    );
    assert_eq!(without.compute(x.view(), None).unwrap(), array![[5.0], [-2.0]]);
}

#[test]
fn rank_one_matches_single_row_batch() {
    let model = regressor::<f32>(&[0.5, -1.0, 2.0, 1.0, 1.0, 1.0], 2, &[0.1, 0.2], "LOGISTIC").unwrap();
    let flat = model.compute(array![1.0f32, 2.0, 3.0].into_dyn().view(), None).unwrap();
    let batch = model.compute(array![[1.0f32, 2.0, 3.0]].into_dyn().view(), None).unwrap();
    assert_eq!(flat.dim(), (1, 2));
    assert_eq!(flat, batch);
}

#[rstest]
#[case("NONE")]
#[case("SOFTMAX")]
#[case("LOGISTIC")]
#[case("SOFTMAX_ZERO")]
#[case("PROBIT")]
fn scalar_input_fails_for_every_transform(#[case] transform: &str) {
    let model = regressor::<f64>(&[1.0, 2.0], 2, &[], transform).unwrap();
    let err = model.compute(arr0(1.0f64).into_dyn().view(), None).unwrap_err();
    assert!(matches!(err, ComputeError::ScalarInput));
    assert_eq!(err.to_string(), "Input shape needs to be at least a single dimension.");
}

#[test]
fn feature_size_is_checked() {
    let model = regressor::<f32>(&[1.0, 2.0, 3.0], 1, &[], "NONE").unwrap();
    let err = model
        .compute(ArrayD::<f32>::zeros(IxDyn(&[4, 2])).view(), None)
        .unwrap_err();
    assert!(matches!(err, ComputeError::FeatureMismatch { expected: 3, actual: 2 }));
}

// =============================================================================
// Construction failures
// =============================================================================

#[rstest]
#[case(&[1.0, 2.0, 3.0], 2)]
#[case(&[1.0], 4)]
fn coefficients_must_fill_whole_rows(#[case] coefficients: &[f32], #[case] targets: i64) {
    let err = regressor::<f32>(coefficients, targets, &[], "NONE").unwrap_err();
    assert!(matches!(err, ConfigError::CoefficientShape { .. }));
}

#[test]
fn unrecognized_transform_fails() {
    let err = regressor::<f32>(&[1.0], 1, &[], "BOGUS").unwrap_err();
    assert!(matches!(err, ConfigError::UnknownTransform(ref s) if s == "BOGUS"));
}

#[test]
fn wrong_attribute_kind_fails() {
    let attrs = Attributes::new()
        .with("targets", AttributeValue::Float(1.0))
        .with("coefficients", AttributeValue::Floats(vec![1.0]));
    let err = LinearRegressor::<f32>::from_attributes(&attrs).unwrap_err();
    assert!(matches!(err, ConfigError::AttributeType { expected: "int", actual: "float", .. }));
}

// =============================================================================
// Post-transforms
// =============================================================================

#[test]
fn softmax_end_to_end() {
    // Identity coefficients: raw scores equal the inputs.
    let model = regressor::<f64>(&[1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0], 3, &[], "SOFTMAX").unwrap();
    let y = model
        .compute(array![[1.0, 2.0, 3.0], [0.0, 0.0, 0.0]].into_dyn().view(), None)
        .unwrap();

    let e = [1.0f64.exp(), 2.0f64.exp(), 3.0f64.exp()];
    let total: f64 = e.iter().sum();
    for j in 0..3 {
        assert_abs_diff_eq!(y[[0, j]], e[j] / total, epsilon = 1e-12);
        assert_abs_diff_eq!(y[[1, j]], 1.0 / 3.0, epsilon = 1e-12);
    }
}

#[test]
fn softmax_zero_end_to_end() {
    let model = regressor::<f32>(&[1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0], 3, &[], "SOFTMAX_ZERO").unwrap();
    let y = model.compute(array![[0.0f32, 1.0, 1.0]].into_dyn().view(), None).unwrap();
    assert_eq!(y[[0, 0]], 0.0);
    assert_abs_diff_eq!(y[[0, 1]], 0.5, epsilon = 1e-6);
    assert_abs_diff_eq!(y[[0, 2]], 0.5, epsilon = 1e-6);
}

#[test]
fn logistic_of_zero_score_is_half() {
    let model = regressor::<f32>(&[0.0, 0.0], 2, &[], "LOGISTIC").unwrap();
    let y = model.compute(array![[3.0f32], [-7.0]].into_dyn().view(), None).unwrap();
    assert!(y.iter().all(|&p| p == 0.5));
}

#[test]
fn probit_maps_scores_through_inverse_normal() {
    // score = x, bias 0.5: x = 0 → probit(0.5) = 0
    let model = regressor::<f64>(&[1.0], 1, &[0.5], "PROBIT").unwrap();
    let y = model
        .compute(array![[0.0], [0.475], [-0.4]].into_dyn().view(), None)
        .unwrap();
    assert_abs_diff_eq!(y[[0, 0]], 0.0, epsilon = 1e-9);
    assert_abs_diff_eq!(y[[1, 0]], 1.959_964, epsilon = 2e-3);
    assert_abs_diff_eq!(y[[2, 0]], -1.281_552, epsilon = 2e-3);
}

#[rstest]
#[case(PostTransform::None)]
#[case(PostTransform::Softmax)]
#[case(PostTransform::Logistic)]
#[case(PostTransform::SoftmaxZero)]
fn precisions_agree(#[case] transform: PostTransform) {
    let coefficients = [0.25f32, -0.5, 1.0, 0.75, 0.0, -1.25];
    let intercepts = [0.5f32, -0.5, 0.0];
    let m32 = regressor::<f32>(&coefficients, 3, &intercepts, transform.as_str()).unwrap();
    let m64 = regressor::<f64>(&coefficients, 3, &intercepts, transform.as_str()).unwrap();

    let x32 = array![[1.0f32, 2.0], [-0.5, 0.25], [3.0, -1.0]];
    let x64 = x32.mapv(f64::from);
    let y32 = m32.compute(x32.into_dyn().view(), None).unwrap();
    let y64 = m64.compute(x64.into_dyn().view(), None).unwrap();

    for (a, b) in y32.iter().zip(y64.iter()) {
        assert_abs_diff_eq!(f64::from(*a), *b, epsilon = 1e-5);
    }
}

// =============================================================================
// Parallelism
// =============================================================================

#[rstest]
#[case(PostTransform::Softmax, true)]
#[case(PostTransform::Softmax, false)]
#[case(PostTransform::Logistic, true)]
fn pooled_scoring_matches_serial(#[case] transform: PostTransform, #[case] parallel_rows: bool) {
    let features = 6;
    let targets = 4;
    let coefficients: Vec<f32> = (0..features * targets).map(|i| ((i % 5) as f32 - 2.0) * 0.3).collect();
    let model = regressor::<f64>(&coefficients, targets as i64, &[0.1, -0.1, 0.2, 0.0], transform.as_str())
        .unwrap()
        .with_parallel_rows(parallel_rows);
    let x = Array2::from_shape_fn((500, features), |(i, j)| ((i * 3 + j) % 13) as f64 * 0.1 - 0.6);

    let serial = model.compute(x.view().into_dyn(), None).unwrap();
    let pool = build_thread_pool(3).unwrap();
    let pooled = model.compute(x.view().into_dyn(), pool.as_ref()).unwrap();

    assert_eq!(serial.dim(), (500, targets));
    for (s, p) in serial.iter().zip(pooled.iter()) {
        assert_abs_diff_eq!(*s, *p, epsilon = 1e-12);
    }
}

#[test]
fn shared_instance_across_threads() {
    let model = regressor::<f32>(&[1.0, 2.0], 1, &[0.5], "NONE").unwrap();
    std::thread::scope(|scope| {
        for i in 0..4 {
            let model = &model;
            scope.spawn(move || {
                let v = i as f32;
                let y = model.compute(array![[v, v]].into_dyn().view(), None).unwrap();
                assert_eq!(y[[0, 0]], 3.0 * v + 0.5);
            });
        }
    });
}
