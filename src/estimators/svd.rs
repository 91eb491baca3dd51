use ndarray::{Array1, Array2, ArrayView2, Zip};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::hyperparams::{Optimizer, SvdParams, SvdValidParams};
use super::traits::{Fit, Recommender};
use super::{clip, require_ratings};
use crate::datasets::{Dataset, IdIndex};
use crate::error::Result;
use crate::helpers::helpers::sigmoid;
use crate::solvers::{ensure_finite, epoch_order, log_epoch, normal_factors};
use crate::{Float, ItemId, UserId};

/// The SVD estimator
///
/// A biased latent factor model. In regression mode it predicts
/// ```ignore
/// r_ui = mu + b_u + b_i + p_u . q_i
/// ```
/// and in ranking mode ([`Optimizer::Bpr`]) it scores items with
/// `b_i + p_u . q_i`, which is only meaningful to order items.
#[derive(Debug, Clone, PartialEq)]
pub struct Svd<F> {
    optimizer: Optimizer,
    global_mean: F,
    user_bias: Array1<F>,
    item_bias: Array1<F>,
    user_factors: Array2<F>,
    item_factors: Array2<F>,
    users: IdIndex,
    items: IdIndex,
    scale: (F, F),
}

impl<F: Float> Svd<F> {
    /// This method instantiates a SVD estimator with default parameters.
    pub fn params() -> SvdParams<F> {
        SvdParams::new()
    }

    pub fn user_factors(&self) -> ArrayView2<F> {
        self.user_factors.view()
    }

    pub fn item_factors(&self) -> ArrayView2<F> {
        self.item_factors.view()
    }
}

impl<F: Float> Fit<F> for SvdValidParams<F> {
    type Object = Svd<F>;

    fn fit(&self, dataset: &Dataset<F>) -> Result<Self::Object> {
        require_ratings(dataset)?;
        let mut rng = StdRng::seed_from_u64(self.seed());
        let mut model = Svd {
            optimizer: self.optimizer(),
            global_mean: dataset.global_mean(),
            user_bias: Array1::zeros(dataset.n_users()),
            item_bias: Array1::zeros(dataset.n_items()),
            user_factors: normal_factors(
                dataset.n_users(),
                self.n_factors(),
                self.init_mean(),
                self.init_std(),
                &mut rng,
            )?,
            item_factors: normal_factors(
                dataset.n_items(),
                self.n_factors(),
                self.init_mean(),
                self.init_std(),
                &mut rng,
            )?,
            users: dataset.user_index().clone(),
            items: dataset.item_index().clone(),
            scale: dataset.rating_scale(),
        };

        let samples: Vec<(usize, usize, F)> = dataset.iter_dense().collect();
        for epoch in 0..self.n_epochs() {
            let objective = match self.optimizer() {
                Optimizer::Sgd => {
                    let order = epoch_order(samples.len(), self.shuffle(), &mut rng);
                    model.sgd_epoch(&samples, &order, self.learning_rate(), self.reg())
                }
                Optimizer::Bpr => model.bpr_epoch(
                    dataset,
                    &samples,
                    self.learning_rate(),
                    self.reg(),
                    &mut rng,
                ),
            };
            ensure_finite(&model.user_bias, "svd", epoch)?;
            ensure_finite(&model.item_bias, "svd", epoch)?;
            ensure_finite(&model.user_factors, "svd", epoch)?;
            ensure_finite(&model.item_factors, "svd", epoch)?;
            log_epoch(self.verbose(), "svd", epoch, objective);
        }
        Ok(model)
    }
}

impl<F: Float> Svd<F> {
    /// One pass of stochastic gradient descent on the squared error. Returns
    /// the sum of the squared errors seen during the pass.
    fn sgd_epoch(&mut self, samples: &[(usize, usize, F)], order: &[usize], lr: F, reg: F) -> F {
        let mut loss = F::zero();
        for &k in order {
            let (u, i, r) = samples[k];
            let est = self.global_mean
                + self.user_bias[u]
                + self.item_bias[i]
                + self.user_factors.row(u).dot(&self.item_factors.row(i));
            let err = r - est;
            loss += err * err;

            let (bu, bi) = (self.user_bias[u], self.item_bias[i]);
            self.user_bias[u] += lr * (err - reg * bu);
            self.item_bias[i] += lr * (err - reg * bi);
            Zip::from(self.user_factors.row_mut(u))
                .and(self.item_factors.row_mut(i))
                .for_each(|p, q| {
                    let (pf, qf) = (*p, *q);
                    *p += lr * (err * qf - reg * pf);
                    *q += lr * (err * pf - reg * qf);
                });
        }
        loss
    }

    /// One pass of Bayesian personalized ranking: as many `(u, i, j)` triples
    /// as there are training ratings, with `i` observed and `j` unobserved for
    /// `u`. Returns the sum of `ln sigmoid(x_uij)`.
    fn bpr_epoch(
        &mut self,
        dataset: &Dataset<F>,
        samples: &[(usize, usize, F)],
        lr: F,
        reg: F,
        rng: &mut StdRng,
    ) -> F {
        let n_items = dataset.n_items();
        let mut log_likelihood = F::zero();
        for _ in 0..samples.len() {
            let (u, i, _) = samples[rng.gen_range(0..samples.len())];
            let row = dataset.user_row(u);
            if row.len() >= n_items {
                continue;
            }
            let j = loop {
                let j = rng.gen_range(0..n_items);
                if row.binary_search_by_key(&j, |&(k, _)| k).is_err() {
                    break j;
                }
            };

            let x = self.item_bias[i] - self.item_bias[j]
                + self.user_factors.row(u).dot(&self.item_factors.row(i))
                - self.user_factors.row(u).dot(&self.item_factors.row(j));
            log_likelihood += sigmoid(x).ln();
            let g = sigmoid(-x);

            let (bi, bj) = (self.item_bias[i], self.item_bias[j]);
            self.item_bias[i] += lr * (g - reg * bi);
            self.item_bias[j] += lr * (-g - reg * bj);
            for f in 0..self.user_factors.ncols() {
                let pf = self.user_factors[[u, f]];
                let qi = self.item_factors[[i, f]];
                let qj = self.item_factors[[j, f]];
                self.user_factors[[u, f]] += lr * (g * (qi - qj) - reg * pf);
                self.item_factors[[i, f]] += lr * (g * pf - reg * qi);
                self.item_factors[[j, f]] += lr * (-g * pf - reg * qj);
            }
        }
        log_likelihood
    }
}

impl<F: Float> Recommender<F> for Svd<F> {
    fn name(&self) -> &'static str {
        "svd"
    }

    /// Unknown users or items get zero bias and factor terms, so an unknown
    /// pair falls back to the global mean in regression mode.
    fn predict(&self, user: UserId, item: ItemId) -> Result<F> {
        let u = self.users.get(user);
        let i = self.items.get(item);
        let interaction = match (u, i) {
            (Some(u), Some(i)) => self.user_factors.row(u).dot(&self.item_factors.row(i)),
            _ => F::zero(),
        };
        let item_bias = i.map_or(F::zero(), |i| self.item_bias[i]);
        match self.optimizer {
            Optimizer::Sgd => {
                let user_bias = u.map_or(F::zero(), |u| self.user_bias[u]);
                let est = self.global_mean + user_bias + item_bias + interaction;
                Ok(clip(est, self.scale))
            }
            Optimizer::Bpr => Ok(item_bias + interaction),
        }
    }
}
