use ndarray::{Array1, Array2};
use rand::rngs::StdRng;
use rand::SeedableRng;

use super::hyperparams::{SvdppParams, SvdppValidParams};
use super::traits::{Fit, Recommender};
use super::{clip, require_ratings};
use crate::datasets::{Dataset, IdIndex};
use crate::error::Result;
use crate::solvers::{ensure_finite, log_epoch, normal_factors};
use crate::{Float, ItemId, UserId};

/// The SVD++ estimator
///
/// Extends [`Svd`](super::Svd) with an implicit feedback term: every item `j`
/// a user rated contributes a factor `y_j` to the user representation,
/// whatever the value of the rating.
#[derive(Debug, Clone, PartialEq)]
pub struct SvdPlusPlus<F> {
    global_mean: F,
    user_bias: Array1<F>,
    item_bias: Array1<F>,
    user_factors: Array2<F>,
    item_factors: Array2<F>,
    implicit_factors: Array2<F>,
    /// `|N(u)|^-1/2 * sum_{j in N(u)} y_j`, refreshed at the end of the fit.
    user_implicit: Array2<F>,
    users: IdIndex,
    items: IdIndex,
    scale: (F, F),
}

impl<F: Float> SvdPlusPlus<F> {
    /// This method instantiates a SVD++ estimator with default parameters.
    pub fn params() -> SvdppParams<F> {
        SvdppParams::new()
    }

    fn implicit_sum(&self, row: &[(usize, F)]) -> Array1<F> {
        let mut sum = Array1::<F>::zeros(self.implicit_factors.ncols());
        if row.is_empty() {
            return sum;
        }
        for &(j, _) in row {
            sum += &self.implicit_factors.row(j);
        }
        sum * F::cast(row.len()).sqrt().recip()
    }
}

/// Ratings are visited user by user. The implicit sum of a user is computed
/// once per visit, and the gradient of the `y_j` factors is accumulated over
/// the user's ratings and applied when the user is done.
impl<F: Float> Fit<F> for SvdppValidParams<F> {
    type Object = SvdPlusPlus<F>;

    fn fit(&self, dataset: &Dataset<F>) -> Result<Self::Object> {
        require_ratings(dataset)?;
        let (lr, reg) = (self.learning_rate(), self.reg());
        let n_factors = self.n_factors();
        let mut rng = StdRng::seed_from_u64(self.seed());
        let mut init = |n| normal_factors(n, n_factors, self.init_mean(), self.init_std(), &mut rng);
        let user_factors = init(dataset.n_users())?;
        let item_factors = init(dataset.n_items())?;
        let implicit_factors = init(dataset.n_items())?;

        let mut model = SvdPlusPlus {
            global_mean: dataset.global_mean(),
            user_bias: Array1::zeros(dataset.n_users()),
            item_bias: Array1::zeros(dataset.n_items()),
            user_factors,
            item_factors,
            implicit_factors,
            user_implicit: Array2::zeros((dataset.n_users(), n_factors)),
            users: dataset.user_index().clone(),
            items: dataset.item_index().clone(),
            scale: dataset.rating_scale(),
        };

        for epoch in 0..self.n_epochs() {
            let mut loss = F::zero();
            for (u, row) in dataset.user_rows().iter().enumerate() {
                if row.is_empty() {
                    continue;
                }
                let norm = F::cast(row.len()).sqrt().recip();
                let implicit = model.implicit_sum(row);
                let mut grad_y = Array1::<F>::zeros(n_factors);

                for &(i, r) in row {
                    let z = &model.user_factors.row(u) + &implicit;
                    let est = model.global_mean
                        + model.user_bias[u]
                        + model.item_bias[i]
                        + model.item_factors.row(i).dot(&z);
                    let err = r - est;
                    loss += err * err;

                    let (bu, bi) = (model.user_bias[u], model.item_bias[i]);
                    model.user_bias[u] += lr * (err - reg * bu);
                    model.item_bias[i] += lr * (err - reg * bi);
                    for f in 0..n_factors {
                        let pf = model.user_factors[[u, f]];
                        let qf = model.item_factors[[i, f]];
                        grad_y[f] += err * norm * qf;
                        model.user_factors[[u, f]] += lr * (err * qf - reg * pf);
                        model.item_factors[[i, f]] += lr * (err * z[f] - reg * qf);
                    }
                }

                let penalty = reg * F::cast(row.len());
                for &(j, _) in row {
                    for f in 0..n_factors {
                        let yf = model.implicit_factors[[j, f]];
                        model.implicit_factors[[j, f]] += lr * (grad_y[f] - penalty * yf);
                    }
                }
            }

            ensure_finite(&model.user_bias, "svd++", epoch)?;
            ensure_finite(&model.item_bias, "svd++", epoch)?;
            ensure_finite(&model.user_factors, "svd++", epoch)?;
            ensure_finite(&model.item_factors, "svd++", epoch)?;
            ensure_finite(&model.implicit_factors, "svd++", epoch)?;
            log_epoch(self.verbose(), "svd++", epoch, loss);
        }

        for (u, row) in dataset.user_rows().iter().enumerate() {
            let implicit = model.implicit_sum(row);
            model.user_implicit.row_mut(u).assign(&implicit);
        }
        Ok(model)
    }
}

impl<F: Float> Recommender<F> for SvdPlusPlus<F> {
    fn name(&self) -> &'static str {
        "svd++"
    }

    fn predict(&self, user: UserId, item: ItemId) -> Result<F> {
        let u = self.users.get(user);
        let i = self.items.get(item);
        let mut est = self.global_mean;
        if let Some(u) = u {
            est += self.user_bias[u];
        }
        if let Some(i) = i {
            est += self.item_bias[i];
        }
        if let (Some(u), Some(i)) = (u, i) {
            let z = &self.user_factors.row(u) + &self.user_implicit.row(u);
            est += self.item_factors.row(i).dot(&z);
        }
        Ok(clip(est, self.scale))
    }
}
