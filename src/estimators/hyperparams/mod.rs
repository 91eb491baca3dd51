use crate::error::{RecommendError, Result};
use crate::Float;

mod factorization;
mod neighborhood;

pub use factorization::*;
pub use neighborhood::*;

/// The objective minimized by [`Svd`](crate::estimators::Svd).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Optimizer {
    /// Regularized squared error on the observed ratings, minimized by
    /// stochastic gradient descent.
    #[default]
    Sgd,
    /// Bayesian personalized ranking: widen the score gap between an observed
    /// and an unobserved item of the same user.
    Bpr,
}

/// How the neighborhood model aggregates neighbor ratings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KnnMode {
    /// Similarity-weighted average of the neighbor ratings.
    #[default]
    Basic,
    /// Weighted average of the neighbor deviations from their own mean, added
    /// back to the target's mean.
    Centered,
    /// Like `Centered`, with deviations expressed in units of each neighbor's
    /// standard deviation and rescaled by the target's.
    ZScore,
    /// Deviations from a fitted baseline model.
    Baseline,
}

fn to_f32<F: Float>(x: F) -> f32 {
    x.to_f32().unwrap_or(f32::NAN)
}

/// Fails with `err` unless `x` is finite and non-negative.
pub(crate) fn check_non_negative<F: Float>(x: F, err: fn(f32) -> RecommendError) -> Result<()> {
    if x.is_finite() && x >= F::zero() {
        Ok(())
    } else {
        Err(err(to_f32(x)))
    }
}

/// Fails with `err` unless `x` is finite and strictly positive.
pub(crate) fn check_positive<F: Float>(x: F, err: fn(f32) -> RecommendError) -> Result<()> {
    if x.is_finite() && x > F::zero() {
        Ok(())
    } else {
        Err(err(to_f32(x)))
    }
}

/// Fails with `err` unless `x` is finite.
pub(crate) fn check_finite<F: Float>(x: F, err: fn(f32) -> RecommendError) -> Result<()> {
    if x.is_finite() {
        Ok(())
    } else {
        Err(err(to_f32(x)))
    }
}

pub(crate) fn check_count(n: usize, err: fn(usize) -> RecommendError) -> Result<()> {
    match n {
        0 => Err(err(n)),
        _ => Ok(()),
    }
}

pub(crate) fn check_init_range<F: Float>(low: F, high: F) -> Result<()> {
    if low.is_finite() && high.is_finite() && low >= F::zero() && low < high {
        Ok(())
    } else {
        Err(RecommendError::InvalidInitRange(to_f32(low), to_f32(high)))
    }
}
