use ndarray::{Array1, Array2, Zip};
use tracing::{debug, info};

use super::hyperparams::{SlopeOneParams, SlopeOneValidParams};
use super::traits::{Fit, Recommender};
use super::{clip, require_ratings};
use crate::datasets::{Dataset, IdIndex};
use crate::error::Result;
use crate::{Float, ItemId, UserId};

/// The weighted SlopeOne estimator
///
/// `dev[i, j]` is the mean of `r_ui - r_uj` over the users who rated both
/// items, and `freq[i, j]` the number of such users. The rating of `u` for `i`
/// is then
/// ```ignore
/// sum_{j in I(u)} (r_uj + dev[i, j]) freq[i, j] / sum_{j in I(u)} freq[i, j]
/// ```
/// falling back to the mean of `u` (or the global mean for an unknown user)
/// when no item of `u` was co-rated with `i`.
#[derive(Debug, Clone, PartialEq)]
pub struct SlopeOne<F> {
    deviations: Array2<F>,
    frequencies: Array2<u32>,
    user_rows: Vec<Vec<(usize, F)>>,
    user_means: Array1<F>,
    global_mean: F,
    users: IdIndex,
    items: IdIndex,
    scale: (F, F),
}

impl<F: Float> SlopeOne<F> {
    /// This method instantiates a SlopeOne estimator.
    pub fn params() -> SlopeOneParams {
        SlopeOneParams::new()
    }

    /// Mean deviation of `i` over `j` and its support, in dense indices.
    pub fn deviation(&self, i: usize, j: usize) -> (F, usize) {
        (self.deviations[[i, j]], self.frequencies[[i, j]] as usize)
    }
}

impl<F: Float> Fit<F> for SlopeOneValidParams {
    type Object = SlopeOne<F>;

    fn fit(&self, dataset: &Dataset<F>) -> Result<Self::Object> {
        require_ratings(dataset)?;
        let n_items = dataset.n_items();
        let mut deviations = Array2::<F>::zeros((n_items, n_items));
        let mut frequencies = Array2::<u32>::zeros((n_items, n_items));
        for row in dataset.user_rows() {
            for &(i, r_i) in row {
                for &(j, r_j) in row {
                    if i != j {
                        deviations[[i, j]] += r_i - r_j;
                        frequencies[[i, j]] += 1;
                    }
                }
            }
        }
        Zip::from(&mut deviations)
            .and(&frequencies)
            .for_each(|d, &n| {
                if n > 0 {
                    *d /= F::cast(n);
                }
            });

        let pairs = frequencies.iter().filter(|&&n| n > 0).count();
        if self.verbose() {
            info!(items = n_items, pairs, "slope one deviations computed");
        } else {
            debug!(items = n_items, pairs, "slope one deviations computed");
        }

        Ok(SlopeOne {
            deviations,
            frequencies,
            user_rows: dataset.user_rows().to_vec(),
            user_means: dataset.user_means().to_owned(),
            global_mean: dataset.global_mean(),
            users: dataset.user_index().clone(),
            items: dataset.item_index().clone(),
            scale: dataset.rating_scale(),
        })
    }
}

impl<F: Float> Recommender<F> for SlopeOne<F> {
    fn name(&self) -> &'static str {
        "slope one"
    }

    fn predict(&self, user: UserId, item: ItemId) -> Result<F> {
        let u = match self.users.get(user) {
            Some(u) => u,
            None => return Ok(clip(self.global_mean, self.scale)),
        };
        let fallback = self.user_means[u];
        let i = match self.items.get(item) {
            Some(i) => i,
            None => return Ok(clip(fallback, self.scale)),
        };

        let (mut num, mut den) = (F::zero(), F::zero());
        for &(j, r_j) in &self.user_rows[u] {
            let (dev, freq) = self.deviation(i, j);
            if j != i && freq > 0 {
                let w = F::cast(freq);
                num += (r_j + dev) * w;
                den += w;
            }
        }
        let est = if den > F::zero() { num / den } else { fallback };
        Ok(clip(est, self.scale))
    }
}
