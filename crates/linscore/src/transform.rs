//! Post-transforms applied to raw linear scores.
//!
//! The [`PostTransform`] enum names the fixed set of functions that turn a
//! row of raw scores into calibrated outputs. It is resolved once from the
//! `post_transform` attribute when a kernel is built.
//!
//! # Variants
//!
//! - [`None`](PostTransform::None): raw scores are returned unchanged
//! - [`Softmax`](PostTransform::Softmax): row-wise softmax
//! - [`Logistic`](PostTransform::Logistic): elementwise logistic sigmoid
//! - [`SoftmaxZero`](PostTransform::SoftmaxZero): softmax over the non-zero scores only
//! - [`Probit`](PostTransform::Probit): elementwise inverse normal CDF

use std::fmt;
use std::str::FromStr;

use ndarray::{ArrayViewMut1, ArrayViewMut2, Axis};
use serde::{Deserialize, Serialize};

use crate::element::Element;
use crate::error::ConfigError;
use crate::utils::Parallelism;

/// Transform applied to each row of scores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PostTransform {
    /// Identity; output = raw score.
    #[default]
    None,

    /// `p_j = exp(s_j) / Σ_k exp(s_k)`.
    Softmax,

    /// `p_j = 1 / (1 + exp(-s_j))`.
    Logistic,

    /// Softmax where scores exactly equal to zero are structurally absent:
    /// they are left out of the normalization sum and output zero.
    SoftmaxZero,

    /// `p_j = √2 · erfinv(2·s_j − 1)`.
    Probit,
}

impl PostTransform {
    /// The attribute spelling of this transform.
    pub fn as_str(&self) -> &'static str {
        match self {
            PostTransform::None => "NONE",
            PostTransform::Softmax => "SOFTMAX",
            PostTransform::Logistic => "LOGISTIC",
            PostTransform::SoftmaxZero => "SOFTMAX_ZERO",
            PostTransform::Probit => "PROBIT",
        }
    }

    /// Apply the transformation in place to every row of `scores`.
    ///
    /// Rows are independent, so the parallel path writes exactly what the
    /// sequential path writes.
    pub fn transform_rows<T: Element>(&self, mut scores: ArrayViewMut2<'_, T>, parallelism: Parallelism) {
        if *self == PostTransform::None {
            return;
        }
        parallelism.maybe_par_for_each(scores.axis_iter_mut(Axis(0)), |row| self.apply_row(row));
    }

    /// Apply the transformation in place to one row of scores.
    ///
    /// NaN inputs propagate (garbage-in, garbage-out).
    #[inline]
    pub fn apply_row<T: Element>(&self, mut row: ArrayViewMut1<'_, T>) {
        match self {
            PostTransform::None => {}
            PostTransform::Softmax => softmax_inplace(row),
            PostTransform::Logistic => row.mapv_inplace(logistic),
            PostTransform::SoftmaxZero => softmax_zero_inplace(row),
            PostTransform::Probit => row.mapv_inplace(probit),
        }
    }
}

impl FromStr for PostTransform {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "NONE" => Ok(PostTransform::None),
            "SOFTMAX" => Ok(PostTransform::Softmax),
            "LOGISTIC" => Ok(PostTransform::Logistic),
            "SOFTMAX_ZERO" => Ok(PostTransform::SoftmaxZero),
            "PROBIT" => Ok(PostTransform::Probit),
            other => Err(ConfigError::UnknownTransform(other.to_string())),
        }
    }
}

impl fmt::Display for PostTransform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Row kernels
// =============================================================================

/// Numerically stable logistic sigmoid.
/// Clamps input to [-500, 500] to prevent overflow.
#[inline]
fn logistic<T: Element>(x: T) -> T {
    let bound = T::lit(500.0);
    let clamped = x.max(-bound).min(bound);
    if x.is_nan() {
        x
    } else if clamped >= T::zero() {
        T::one() / (T::one() + (-clamped).exp())
    } else {
        let e = clamped.exp();
        e / (T::one() + e)
    }
}

/// Numerically stable softmax in place.
/// Subtracts max before exponentiating to avoid overflow.
/// A NaN anywhere in the row turns the whole row NaN.
fn softmax_inplace<T: Element>(mut row: ArrayViewMut1<'_, T>) {
    if row.is_empty() {
        return;
    }

    let max = row.fold(T::neg_infinity(), |m, &x| m.max(x));

    let mut sum = T::zero();
    for x in row.iter_mut() {
        *x = (*x - max).exp();
        sum += *x;
    }

    if sum.is_nan() {
        row.fill(T::nan());
    } else if sum > T::zero() {
        row.mapv_inplace(|x| x / sum);
    }
}

/// Softmax over the non-zero entries; zero entries stay zero.
/// An all-zero row stays all zero; a NaN score turns the whole row NaN.
fn softmax_zero_inplace<T: Element>(mut row: ArrayViewMut1<'_, T>) {
    let zero = T::zero();
    let max = row
        .iter()
        .filter(|&&x| x != zero)
        .fold(T::neg_infinity(), |m, &x| m.max(x));

    let mut sum = zero;
    for x in row.iter_mut() {
        if *x != zero {
            *x = (*x - max).exp();
            sum += *x;
        }
    }

    if sum.is_nan() {
        row.fill(T::nan());
    } else if sum > zero {
        row.mapv_inplace(|x| x / sum);
    }
}

/// Inverse of the standard normal CDF.
#[inline]
fn probit<T: Element>(p: T) -> T {
    T::SQRT_2() * erf_inv(T::lit(2.0) * p - T::one())
}

/// Closed-form approximation of the inverse error function (a = 0.147).
///
/// Absolute error of the resulting probit stays below 2e-3 on (0, 1).
#[inline]
fn erf_inv<T: Element>(x: T) -> T {
    let a = T::lit(0.147);
    let half = T::lit(0.5);
    let sign = if x < T::zero() { -T::one() } else { T::one() };

    let ln = ((T::one() - x) * (T::one() + x)).ln();
    let v = T::lit(2.0) / (T::PI() * a) + half * ln;
    let v2 = ln / a;
    sign * ((v * v - v2).sqrt() - v).sqrt()
}
