use ndarray::Array1;
use tracing::{debug, info};

use super::baseline::Baseline;
use super::hyperparams::{KnnMode, KnnParams, KnnValidParams};
use super::traits::{Fit, Recommender};
use super::{clip, require_ratings};
use crate::datasets::{Dataset, IdIndex};
use crate::error::Result;
use crate::helpers::helpers::descending;
use crate::similarity::SimilarityMatrix;
use crate::{Float, ItemId, UserId};

/// The neighborhood estimator
///
/// In the user-based orientation, the rating of `u` for `i` is estimated from
/// the ratings given to `i` by the users most similar to `u`. In the item-based
/// orientation, from the ratings given by `u` to the items most similar to `i`.
///
/// Only neighbors with a positive similarity computed over at least one
/// co-rated entry qualify. When fewer than `min_k` neighbors qualify, or when
/// the user or the item is unknown, the estimate falls back to:
/// - the global mean in [`KnnMode::Basic`],
/// - the mean of the target (user or item, following the orientation) in
///   [`KnnMode::Centered`] and [`KnnMode::ZScore`], the global mean if the
///   target is unknown,
/// - the baseline estimate in [`KnnMode::Baseline`].
#[derive(Debug, Clone)]
pub struct Knn<F> {
    mode: KnnMode,
    user_based: bool,
    k: usize,
    min_k: usize,
    similarities: SimilarityMatrix<F>,
    /// Rows of the opposite orientation: for each item (user-based) or user
    /// (item-based), the neighbors that rated it, along with the rating.
    rows: Vec<Vec<(usize, F)>>,
    means: Array1<F>,
    stds: Array1<F>,
    baseline: Option<Baseline<F>>,
    global_mean: F,
    users: IdIndex,
    items: IdIndex,
    scale: (F, F),
}

impl<F: Float> Knn<F> {
    /// This method instantiates a neighborhood estimator with default
    /// parameters.
    pub fn params() -> KnnParams<F> {
        KnnParams::new()
    }

    pub fn similarities(&self) -> &SimilarityMatrix<F> {
        &self.similarities
    }

    /// Orients a dense `(user, item)` pair as `(target, other)`.
    fn orient(&self, u: usize, i: usize) -> (usize, usize) {
        if self.user_based {
            (u, i)
        } else {
            (i, u)
        }
    }

    /// Baseline estimate of the pair `(target, neighbor rating entry)` in the
    /// configured orientation.
    fn baseline_of(&self, baseline: &Baseline<F>, x: usize, y: usize) -> F {
        let (u, i) = self.orient(x, y);
        baseline.estimate_dense(Some(u), Some(i))
    }

    fn fallback(&self, u: Option<usize>, i: Option<usize>) -> F {
        match (self.mode, &self.baseline) {
            (KnnMode::Baseline, Some(baseline)) => baseline.estimate_dense(u, i),
            (KnnMode::Centered, _) | (KnnMode::ZScore, _) => {
                let target = if self.user_based { u } else { i };
                target.map_or(self.global_mean, |x| self.means[x])
            }
            _ => self.global_mean,
        }
    }

    fn estimate(&self, u: Option<usize>, i: Option<usize>) -> F {
        let (u_idx, i_idx) = match (u, i) {
            (Some(u), Some(i)) => (u, i),
            _ => return self.fallback(u, i),
        };
        let (x, y) = self.orient(u_idx, i_idx);

        let mut neighbors: Vec<(F, usize, F)> = self.rows[y]
            .iter()
            .filter(|&&(n, _)| n != x)
            .filter_map(|&(n, r)| {
                let sim = self.similarities.get(x, n);
                (sim > F::zero() && self.similarities.overlap(x, n) > 0).then_some((sim, n, r))
            })
            .collect();
        if neighbors.is_empty() || neighbors.len() < self.min_k {
            return self.fallback(u, i);
        }
        neighbors.sort_by(|a, b| descending(&a.0, &b.0).then(a.1.cmp(&b.1)));
        neighbors.truncate(self.k);

        match (self.mode, &self.baseline) {
            (KnnMode::Basic, _) => weighted_mean(&neighbors, |_, r| r),
            (KnnMode::Centered, _) => {
                self.means[x] + weighted_mean(&neighbors, |n, r| r - self.means[n])
            }
            (KnnMode::ZScore, _) => {
                let std = |n: usize| non_zero(self.stds[n]);
                self.means[x]
                    + std(x) * weighted_mean(&neighbors, |n, r| (r - self.means[n]) / std(n))
            }
            (KnnMode::Baseline, Some(baseline)) => {
                self.baseline_of(baseline, x, y)
                    + weighted_mean(&neighbors, |n, r| r - self.baseline_of(baseline, n, y))
            }
            (KnnMode::Baseline, None) => weighted_mean(&neighbors, |_, r| r),
        }
    }
}

/// Similarity-weighted mean of `deviation(neighbor, rating)` over
/// `(similarity, neighbor, rating)` triples with positive similarities.
fn weighted_mean<F: Float>(neighbors: &[(F, usize, F)], deviation: impl Fn(usize, F) -> F) -> F {
    let (num, den) = neighbors
        .iter()
        .fold((F::zero(), F::zero()), |(num, den), &(sim, n, r)| {
            (num + sim * deviation(n, r), den + sim)
        });
    num / den
}

/// A zero standard deviation is treated as one.
fn non_zero<F: Float>(std: F) -> F {
    if std > F::zero() {
        std
    } else {
        F::one()
    }
}

impl<F: Float> Fit<F> for KnnValidParams<F> {
    type Object = Knn<F>;

    fn fit(&self, dataset: &Dataset<F>) -> Result<Self::Object> {
        require_ratings(dataset)?;
        let baseline = match self.mode() {
            KnnMode::Baseline => Some(self.baseline()?.fit(dataset)?),
            _ => None,
        };

        let (own_rows, rows, means, stds) = if self.user_based() {
            (
                dataset.user_rows(),
                dataset.item_rows(),
                dataset.user_means(),
                dataset.user_stds(),
            )
        } else {
            (
                dataset.item_rows(),
                dataset.user_rows(),
                dataset.item_means(),
                dataset.item_stds(),
            )
        };
        let similarities =
            SimilarityMatrix::compute(own_rows, means, self.similarity(), self.shrinkage());
        if self.verbose() {
            info!(
                entities = similarities.len(),
                user_based = self.user_based(),
                "neighborhood similarities computed"
            );
        } else {
            debug!(entities = similarities.len(), "neighborhood similarities computed");
        }

        Ok(Knn {
            mode: self.mode(),
            user_based: self.user_based(),
            k: self.k(),
            min_k: self.min_k(),
            similarities,
            rows: rows.to_vec(),
            means: means.to_owned(),
            stds: stds.to_owned(),
            baseline,
            global_mean: dataset.global_mean(),
            users: dataset.user_index().clone(),
            items: dataset.item_index().clone(),
            scale: dataset.rating_scale(),
        })
    }
}

impl<F: Float> Recommender<F> for Knn<F> {
    fn name(&self) -> &'static str {
        "knn"
    }

    fn predict(&self, user: UserId, item: ItemId) -> Result<F> {
        let est = self.estimate(self.users.get(user), self.items.get(item));
        Ok(clip(est, self.scale))
    }
}
