use ndarray::{Array1, Array2, Zip};
use ndarray_stats::QuantileExt;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::hyperparams::{CoClusteringParams, CoClusteringValidParams};
use super::traits::{Fit, Recommender};
use super::{clip, require_ratings};
use crate::datasets::{Dataset, IdIndex};
use crate::error::Result;
use crate::solvers::log_epoch;
use crate::{Float, ItemId, UserId};

/// The co-clustering estimator
#[derive(Debug, Clone, PartialEq)]
pub struct CoClustering<F> {
    user_clusters: Array1<usize>,
    item_clusters: Array1<usize>,
    averages: ClusterAverages<F>,
    user_means: Array1<F>,
    item_means: Array1<F>,
    global_mean: F,
    users: IdIndex,
    items: IdIndex,
    scale: (F, F),
}

/// Mean rating of every user cluster, item cluster and co-cluster. Empty
/// clusters take the global mean.
#[derive(Debug, Clone, PartialEq)]
struct ClusterAverages<F> {
    user: Array1<F>,
    item: Array1<F>,
    cocluster: Array2<F>,
}

impl<F: Float> ClusterAverages<F> {
    fn compute(
        dataset: &Dataset<F>,
        user_clusters: &Array1<usize>,
        item_clusters: &Array1<usize>,
        n_user_clusters: usize,
        n_item_clusters: usize,
    ) -> Self {
        let mut user_sum = Array1::<F>::zeros(n_user_clusters);
        let mut user_count = Array1::<usize>::zeros(n_user_clusters);
        let mut item_sum = Array1::<F>::zeros(n_item_clusters);
        let mut item_count = Array1::<usize>::zeros(n_item_clusters);
        let mut co_sum = Array2::<F>::zeros((n_user_clusters, n_item_clusters));
        let mut co_count = Array2::<usize>::zeros((n_user_clusters, n_item_clusters));

        for (u, i, r) in dataset.iter_dense() {
            let (cu, ci) = (user_clusters[u], item_clusters[i]);
            user_sum[cu] += r;
            user_count[cu] += 1;
            item_sum[ci] += r;
            item_count[ci] += 1;
            co_sum[[cu, ci]] += r;
            co_count[[cu, ci]] += 1;
        }

        let mu = dataset.global_mean();
        let mean = |sum: F, count: usize| match count {
            0 => mu,
            n => sum / F::cast(n),
        };
        ClusterAverages {
            user: Zip::from(&user_sum)
                .and(&user_count)
                .map_collect(|&s, &n| mean(s, n)),
            item: Zip::from(&item_sum)
                .and(&item_count)
                .map_collect(|&s, &n| mean(s, n)),
            cocluster: Zip::from(&co_sum)
                .and(&co_count)
                .map_collect(|&s, &n| mean(s, n)),
        }
    }
}

impl<F: Float> CoClustering<F> {
    /// This method instantiates a co-clustering estimator with default
    /// parameters.
    pub fn params() -> CoClusteringParams {
        CoClusteringParams::new()
    }

    /// Cluster of every user, in dense index order.
    pub fn user_clusters(&self) -> &Array1<usize> {
        &self.user_clusters
    }

    /// Cluster of every item, in dense index order.
    pub fn item_clusters(&self) -> &Array1<usize> {
        &self.item_clusters
    }
}

fn estimate<F: Float>(
    averages: &ClusterAverages<F>,
    cu: usize,
    ci: usize,
    user_mean: F,
    item_mean: F,
) -> F {
    averages.cocluster[[cu, ci]] + (user_mean - averages.user[cu]) + (item_mean - averages.item[ci])
}

/// Relocation: at every epoch, each user (then each item) moves to the
/// cluster minimizing the squared error of its ratings, all moves being
/// evaluated against the averages of the start of the epoch.
impl<F: Float> Fit<F> for CoClusteringValidParams {
    type Object = CoClustering<F>;

    fn fit(&self, dataset: &Dataset<F>) -> Result<Self::Object> {
        require_ratings(dataset)?;
        let (n_cu, n_ci) = (self.n_user_clusters(), self.n_item_clusters());
        let mut rng = StdRng::seed_from_u64(self.seed());
        let mut user_clusters: Array1<usize> =
            (0..dataset.n_users()).map(|_| rng.gen_range(0..n_cu)).collect();
        let mut item_clusters: Array1<usize> =
            (0..dataset.n_items()).map(|_| rng.gen_range(0..n_ci)).collect();
        let (user_means, item_means) = (dataset.user_means(), dataset.item_means());

        for epoch in 0..self.n_epochs() {
            let averages =
                ClusterAverages::compute(dataset, &user_clusters, &item_clusters, n_cu, n_ci);
            let mut loss = F::zero();

            let mut next_user_clusters = user_clusters.clone();
            for (u, row) in dataset.user_rows().iter().enumerate() {
                let errors: Array1<F> = (0..n_cu)
                    .map(|c| {
                        row.iter()
                            .map(|&(i, r)| {
                                let est = estimate(
                                    &averages,
                                    c,
                                    item_clusters[i],
                                    user_means[u],
                                    item_means[i],
                                );
                                (r - est) * (r - est)
                            })
                            .sum::<F>()
                    })
                    .collect();
                let best = errors.argmin().unwrap_or(user_clusters[u]);
                loss += errors[best];
                next_user_clusters[u] = best;
            }

            let mut next_item_clusters = item_clusters.clone();
            for (i, row) in dataset.item_rows().iter().enumerate() {
                let errors: Array1<F> = (0..n_ci)
                    .map(|c| {
                        row.iter()
                            .map(|&(u, r)| {
                                let est = estimate(
                                    &averages,
                                    user_clusters[u],
                                    c,
                                    user_means[u],
                                    item_means[i],
                                );
                                (r - est) * (r - est)
                            })
                            .sum::<F>()
                    })
                    .collect();
                next_item_clusters[i] = errors.argmin().unwrap_or(item_clusters[i]);
            }

            user_clusters = next_user_clusters;
            item_clusters = next_item_clusters;
            log_epoch(self.verbose(), "co-clustering", epoch, loss);
        }

        let averages =
            ClusterAverages::compute(dataset, &user_clusters, &item_clusters, n_cu, n_ci);
        Ok(CoClustering {
            user_clusters,
            item_clusters,
            averages,
            user_means: user_means.to_owned(),
            item_means: item_means.to_owned(),
            global_mean: dataset.global_mean(),
            users: dataset.user_index().clone(),
            items: dataset.item_index().clone(),
            scale: dataset.rating_scale(),
        })
    }
}

impl<F: Float> Recommender<F> for CoClustering<F> {
    fn name(&self) -> &'static str {
        "co-clustering"
    }

    /// Known pairs use the co-cluster estimate. A pair with a single known
    /// side gets that side's mean, an unknown pair the global mean.
    fn predict(&self, user: UserId, item: ItemId) -> Result<F> {
        let est = match (self.users.get(user), self.items.get(item)) {
            (Some(u), Some(i)) => estimate(
                &self.averages,
                self.user_clusters[u],
                self.item_clusters[i],
                self.user_means[u],
                self.item_means[i],
            ),
            (Some(u), None) => self.user_means[u],
            (None, Some(i)) => self.item_means[i],
            (None, None) => self.global_mean,
        };
        Ok(clip(est, self.scale))
    }
}
