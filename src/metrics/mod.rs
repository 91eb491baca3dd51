use std::collections::HashSet;
use std::fmt;

use tracing::debug;

use crate::datasets::Dataset;
use crate::error::{RecommendError, Result};
use crate::estimators::Recommender;
use crate::{Float, ItemId, UserId};

#[cfg(test)]
mod tests;

/// Cutoff of a ranking metric that takes the whole ranked list into account.
pub const UNBOUNDED: usize = usize::MAX;

/// Quality measures of a fitted model on a test partition.
///
/// Regression metrics compare `predict` to every test rating. Ranking metrics
/// rank, for every user of the test partition, all the items known to the
/// train or the test partition that the user did not rate in train, and score
/// the first `k` entries against the items the user rated in test. Their
/// value is the mean over the test users.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Evaluator {
    /// Root mean squared error.
    Rmse,
    /// Mean absolute error.
    Mae,
    /// Fraction of the top-`k` list that is relevant.
    Precision(usize),
    /// Fraction of the relevant items found in the top-`k` list.
    Recall(usize),
    /// Mean average precision, normalized by `min(|relevant|, k)`.
    Map(usize),
    /// Normalized discounted cumulative gain with binary relevance.
    Ndcg(usize),
    /// Reciprocal rank of the first relevant item.
    Mrr(usize),
}

impl Evaluator {
    /// The report name of the evaluator, e.g. `RMSE`, `Precision@5` or `NDCG`
    /// for an unbounded cutoff.
    pub fn name(&self) -> String {
        self.to_string()
    }

    /// The cutoff of a ranking evaluator, `None` for a regression evaluator.
    pub fn cutoff(&self) -> Option<usize> {
        match *self {
            Evaluator::Rmse | Evaluator::Mae => None,
            Evaluator::Precision(k)
            | Evaluator::Recall(k)
            | Evaluator::Map(k)
            | Evaluator::Ndcg(k)
            | Evaluator::Mrr(k) => Some(k),
        }
    }

    /// Fails with [`RecommendError::InvalidCutoff`] for a zero cutoff.
    pub fn check(&self) -> Result<()> {
        match self.cutoff() {
            Some(0) => Err(RecommendError::InvalidCutoff(0)),
            _ => Ok(()),
        }
    }

    /// Scores `model` on `test`. The `train` partition the model was fitted on
    /// defines the items excluded from each user's candidates.
    pub fn evaluate<F, R>(&self, model: &R, test: &Dataset<F>, train: &Dataset<F>) -> Result<F>
    where
        F: Float,
        R: Recommender<F> + ?Sized,
    {
        let scores = evaluate_all(std::slice::from_ref(self), model, test, train)?;
        Ok(scores[0])
    }

    fn score_list<F: Float>(&self, ranked: &[ItemId], relevant: &HashSet<ItemId>) -> F {
        let k = self.cutoff().unwrap_or(UNBOUNDED);
        let top = &ranked[..ranked.len().min(k)];
        let hits: Vec<usize> = top
            .iter()
            .enumerate()
            .filter(|(_, item)| relevant.contains(*item))
            .map(|(pos, _)| pos + 1)
            .collect();

        match self {
            Evaluator::Precision(_) => {
                if top.is_empty() {
                    F::zero()
                } else {
                    F::cast(hits.len()) / F::cast(top.len())
                }
            }
            Evaluator::Recall(_) => F::cast(hits.len()) / F::cast(relevant.len()),
            Evaluator::Map(_) => {
                let sum: F = hits
                    .iter()
                    .enumerate()
                    .map(|(n, &rank)| F::cast(n + 1) / F::cast(rank))
                    .sum();
                sum / F::cast(relevant.len().min(k))
            }
            Evaluator::Ndcg(_) => {
                let discount = |rank: usize| F::one() / F::cast(rank + 1).log2();
                let dcg: F = hits.iter().map(|&rank| discount(rank)).sum();
                let idcg: F = (1..=relevant.len().min(k)).map(discount).sum();
                if idcg > F::zero() {
                    dcg / idcg
                } else {
                    F::zero()
                }
            }
            Evaluator::Mrr(_) => hits
                .first()
                .map_or(F::zero(), |&rank| F::one() / F::cast(rank)),
            Evaluator::Rmse | Evaluator::Mae => F::zero(),
        }
    }
}

impl fmt::Display for Evaluator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (name, cutoff) = match *self {
            Evaluator::Rmse => ("RMSE", None),
            Evaluator::Mae => ("MAE", None),
            Evaluator::Precision(k) => ("Precision", Some(k)),
            Evaluator::Recall(k) => ("Recall", Some(k)),
            Evaluator::Map(k) => ("MAP", Some(k)),
            Evaluator::Ndcg(k) => ("NDCG", Some(k)),
            Evaluator::Mrr(k) => ("MRR", Some(k)),
        };
        match cutoff {
            Some(k) if k != UNBOUNDED => write!(f, "{}@{}", name, k),
            _ => write!(f, "{}", name),
        }
    }
}

/// Scores `model` with every evaluator, in order. The ranking of each test
/// user is computed once and shared by all the ranking evaluators.
pub fn evaluate_all<F, R>(
    evaluators: &[Evaluator],
    model: &R,
    test: &Dataset<F>,
    train: &Dataset<F>,
) -> Result<Vec<F>>
where
    F: Float,
    R: Recommender<F> + ?Sized,
{
    for evaluator in evaluators {
        evaluator.check()?;
    }

    let mut scores = vec![F::zero(); evaluators.len()];
    if evaluators.iter().any(|e| e.cutoff().is_none()) {
        let (rmse, mae) = regression_errors(model, test)?;
        for (score, evaluator) in scores.iter_mut().zip(evaluators) {
            match evaluator {
                Evaluator::Rmse => *score = rmse,
                Evaluator::Mae => *score = mae,
                _ => {}
            }
        }
    }

    if evaluators.iter().any(|e| e.cutoff().is_some()) {
        let all_items: Vec<ItemId> = {
            let mut seen = HashSet::new();
            train
                .item_ids()
                .iter()
                .chain(test.item_ids())
                .copied()
                .filter(|&item| seen.insert(item))
                .collect()
        };
        let mut sums = vec![F::zero(); evaluators.len()];
        let n_users = test.n_users();
        for &user in test.user_ids() {
            let relevant: HashSet<ItemId> = test
                .user_ratings(user)
                .into_iter()
                .map(|(item, _)| item)
                .collect();
            let ranked = rank_unseen(model, train, user, &all_items)?;
            for (sum, evaluator) in sums.iter_mut().zip(evaluators) {
                if evaluator.cutoff().is_some() {
                    *sum += evaluator.score_list::<F>(&ranked, &relevant);
                }
            }
        }
        for ((score, sum), evaluator) in scores.iter_mut().zip(sums).zip(evaluators) {
            if evaluator.cutoff().is_some() && n_users > 0 {
                *score = sum / F::cast(n_users);
            }
        }
    }

    for (evaluator, score) in evaluators.iter().zip(&scores) {
        debug!(evaluator = %evaluator, score = score.as_f64(), "evaluated");
    }
    Ok(scores)
}

/// Ranks the items of `all_items` that `user` did not rate in `train`.
fn rank_unseen<F, R>(
    model: &R,
    train: &Dataset<F>,
    user: UserId,
    all_items: &[ItemId],
) -> Result<Vec<ItemId>>
where
    F: Float,
    R: Recommender<F> + ?Sized,
{
    let candidates: Vec<ItemId> = all_items
        .iter()
        .copied()
        .filter(|&item| !train.contains(user, item))
        .collect();
    model.rank(user, &candidates)
}

/// RMSE and MAE of `predict` over the test ratings, zero for an empty test
/// partition.
fn regression_errors<F, R>(model: &R, test: &Dataset<F>) -> Result<(F, F)>
where
    F: Float,
    R: Recommender<F> + ?Sized,
{
    if test.is_empty() {
        return Ok((F::zero(), F::zero()));
    }
    let (mut squared, mut absolute) = (F::zero(), F::zero());
    for rating in test.ratings() {
        let err = model.predict(rating.user, rating.item)? - rating.value;
        squared += err * err;
        absolute += num_traits::Float::abs(err);
    }
    let n = F::cast(test.n_ratings());
    Ok(((squared / n).sqrt(), absolute / n))
}
