use ndarray::{Array1, ArrayView1};

use crate::datasets::Dataset;
use crate::error::{RecommendError, Result};
use crate::helpers::helpers::{argsort_by, descending};
use crate::{Float, ItemId, UserId};

/// Fit trait
///
/// The fittable trait allows a model to be trained on a dataset of ratings.
/// Fitting never mutates the dataset and, for a given seed, is deterministic:
/// each call returns a fresh fitted model.
pub trait Fit<F: Float> {
    type Object;

    fn fit(&self, dataset: &Dataset<F>) -> Result<Self::Object>;
}

/// Recommender trait
///
/// The capability interface of a fitted model. A model exposes a point
/// estimate through `predict` and/or an ordering of candidate items through
/// `rank`; calling an operation the model does not support returns
/// [`RecommendError::Unsupported`].
pub trait Recommender<F: Float> {
    /// Short model name used in error messages and logs.
    fn name(&self) -> &'static str;

    /// Predicts the rating (or preference score) of `user` for `item`.
    /// Unknown users or items receive the model's fallback estimate.
    fn predict(&self, _user: UserId, _item: ItemId) -> Result<F> {
        Err(RecommendError::Unsupported {
            operation: "predict",
            model: self.name(),
        })
    }

    /// Fails with [`RecommendError::Unsupported`] when models of this type do
    /// not implement `predict`. Callable before any model is fitted.
    fn check_predict() -> Result<()>
    where
        Self: Sized,
    {
        Ok(())
    }

    /// Orders `candidates` from most to least recommended for `user`.
    ///
    /// The default implementation sorts candidates by descending predicted
    /// score, breaking ties by ascending item identifier.
    fn rank(&self, user: UserId, candidates: &[ItemId]) -> Result<Vec<ItemId>> {
        let scores = candidates
            .iter()
            .map(|&item| self.predict(user, item))
            .collect::<Result<Array1<F>>>()?;
        Ok(rank_by_scores(candidates, scores.view()))
    }
}

/// Sorts `candidates` by descending `scores`, ties by ascending item identifier.
pub fn rank_by_scores<F: Float>(candidates: &[ItemId], scores: ArrayView1<F>) -> Vec<ItemId> {
    let keyed: Array1<(F, ItemId)> = scores
        .iter()
        .zip(candidates.iter())
        .map(|(&s, &item)| (s, item))
        .collect();
    argsort_by(&keyed, |a, b| descending(&a.0, &b.0).then(a.1.cmp(&b.1)))
        .into_iter()
        .map(|k| candidates[k])
        .collect()
}

/// Returns the `n` best items of `dataset` that `user` has not rated yet.
pub fn recommend<F, R>(model: &R, dataset: &Dataset<F>, user: UserId, n: usize) -> Result<Vec<ItemId>>
where
    F: Float,
    R: Recommender<F> + ?Sized,
{
    let candidates: Vec<ItemId> = dataset
        .item_ids()
        .iter()
        .copied()
        .filter(|&item| !dataset.contains(user, item))
        .collect();
    let mut ranked = model.rank(user, &candidates)?;
    ranked.truncate(n);
    Ok(ranked)
}
