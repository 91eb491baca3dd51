use ndarray::{Array1, ArrayView1};
use tracing::{debug, info};

use super::hyperparams::{BaselineParams, BaselineValidParams};
use super::traits::{Fit, Recommender};
use super::{clip, require_ratings};
use crate::datasets::{Dataset, IdIndex};
use crate::error::{RecommendError, Result};
use crate::solvers::{ensure_finite, log_epoch};
use crate::{Float, ItemId, UserId};

/// The baseline estimator
///
/// Predicts `mu + b_u + b_i`: the global mean corrected by a user bias and an
/// item bias. Unknown users or items contribute a zero bias.
#[derive(Debug, Clone, PartialEq)]
pub struct Baseline<F> {
    global_mean: F,
    user_bias: Array1<F>,
    item_bias: Array1<F>,
    users: IdIndex,
    items: IdIndex,
    scale: (F, F),
}

impl<F: Float> Baseline<F> {
    /// This method instantiates a baseline estimator with default parameters.
    pub fn params() -> BaselineParams<F> {
        BaselineParams::new()
    }

    pub fn global_mean(&self) -> F {
        self.global_mean
    }

    pub fn user_biases(&self) -> ArrayView1<F> {
        self.user_bias.view()
    }

    pub fn item_biases(&self) -> ArrayView1<F> {
        self.item_bias.view()
    }

    /// Baseline estimate for dense indices of the training dataset, without
    /// clipping.
    pub(crate) fn estimate_dense(&self, u: Option<usize>, i: Option<usize>) -> F {
        let mut est = self.global_mean;
        if let Some(u) = u {
            est += self.user_bias[u];
        }
        if let Some(i) = i {
            est += self.item_bias[i];
        }
        est
    }
}

/// Alternating closed-form updates of the biases:
/// ```ignore
/// b_u = sum_{i in I(u)} (r_ui - mu - b_i) / (reg_user + |I(u)|)
/// b_i = sum_{u in U(i)} (r_ui - mu - b_u) / (reg_item + |U(i)|)
/// ```
impl<F: Float> Fit<F> for BaselineValidParams<F> {
    type Object = Baseline<F>;

    fn fit(&self, dataset: &Dataset<F>) -> Result<Self::Object> {
        require_ratings(dataset)?;
        let mu = dataset.global_mean();
        let mut user_bias = Array1::<F>::zeros(dataset.n_users());
        let mut item_bias = Array1::<F>::zeros(dataset.n_items());

        let mut converged = false;
        for epoch in 0..self.max_epochs() {
            let mut max_change = F::zero();
            for (u, row) in dataset.user_rows().iter().enumerate() {
                let sum: F = row.iter().map(|&(i, r)| r - mu - item_bias[i]).sum();
                let b = sum / (self.reg_user() + F::cast(row.len()));
                max_change = max_change.max(num_traits::Float::abs(b - user_bias[u]));
                user_bias[u] = b;
            }
            for (i, row) in dataset.item_rows().iter().enumerate() {
                let sum: F = row.iter().map(|&(u, r)| r - mu - user_bias[u]).sum();
                let b = sum / (self.reg_item() + F::cast(row.len()));
                max_change = max_change.max(num_traits::Float::abs(b - item_bias[i]));
                item_bias[i] = b;
            }
            ensure_finite(&user_bias, "baseline", epoch)?;
            ensure_finite(&item_bias, "baseline", epoch)?;
            log_epoch(self.verbose(), "baseline", epoch, max_change);

            if max_change < self.tolerance() {
                converged = true;
                if self.verbose() {
                    info!(epoch, "baseline converged");
                }
                break;
            }
        }

        if !converged {
            if self.require_convergence() {
                return Err(RecommendError::NotConverged {
                    epochs: self.max_epochs(),
                });
            }
            debug!(epochs = self.max_epochs(), "baseline reached its epoch cap");
        }

        Ok(Baseline {
            global_mean: mu,
            user_bias,
            item_bias,
            users: dataset.user_index().clone(),
            items: dataset.item_index().clone(),
            scale: dataset.rating_scale(),
        })
    }
}

impl<F: Float> Recommender<F> for Baseline<F> {
    fn name(&self) -> &'static str {
        "baseline"
    }

    fn predict(&self, user: UserId, item: ItemId) -> Result<F> {
        let est = self.estimate_dense(self.users.get(user), self.items.get(item));
        Ok(clip(est, self.scale))
    }
}
