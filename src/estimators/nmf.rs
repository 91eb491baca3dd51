use ndarray::{Array2, ArrayView2};
use rand::rngs::StdRng;
use rand::SeedableRng;

use super::hyperparams::{NmfParams, NmfValidParams};
use super::traits::{Fit, Recommender};
use super::{clip, require_ratings};
use crate::datasets::{Dataset, IdIndex};
use crate::error::Result;
use crate::solvers::{ensure_finite, log_epoch, uniform_factors};
use crate::{Float, ItemId, UserId};

/// The non-negative matrix factorization estimator
///
/// Predicts `p_u . q_i` with non-negative factors. Pairs involving an unknown
/// user or item are estimated by the global mean.
#[derive(Debug, Clone, PartialEq)]
pub struct Nmf<F> {
    global_mean: F,
    user_factors: Array2<F>,
    item_factors: Array2<F>,
    users: IdIndex,
    items: IdIndex,
    scale: (F, F),
}

impl<F: Float> Nmf<F> {
    /// This method instantiates a NMF estimator with default parameters.
    pub fn params() -> NmfParams<F> {
        NmfParams::new()
    }

    pub fn user_factors(&self) -> ArrayView2<F> {
        self.user_factors.view()
    }

    pub fn item_factors(&self) -> ArrayView2<F> {
        self.item_factors.view()
    }
}

/// Regularized multiplicative updates. For every factor `f`:
/// ```ignore
/// p_uf <- p_uf * sum_i q_if r_ui / (sum_i q_if r^_ui + |I(u)| reg p_uf)
/// q_if <- q_if * sum_u p_uf r_ui / (sum_u p_uf r^_ui + |U(i)| reg q_if)
/// ```
/// Both updates use the estimates `r^` of the start of the epoch. A factor
/// whose denominator vanishes is left unchanged, so factors never turn
/// negative.
impl<F: Float> Fit<F> for NmfValidParams<F> {
    type Object = Nmf<F>;

    fn fit(&self, dataset: &Dataset<F>) -> Result<Self::Object> {
        require_ratings(dataset)?;
        let n_factors = self.n_factors();
        let mut rng = StdRng::seed_from_u64(self.seed());
        let mut user_factors = uniform_factors(
            dataset.n_users(),
            n_factors,
            self.init_low(),
            self.init_high(),
            &mut rng,
        )?;
        let mut item_factors = uniform_factors(
            dataset.n_items(),
            n_factors,
            self.init_low(),
            self.init_high(),
            &mut rng,
        )?;

        for epoch in 0..self.n_epochs() {
            let mut user_num = Array2::<F>::zeros(user_factors.dim());
            let mut user_denom = Array2::<F>::zeros(user_factors.dim());
            let mut item_num = Array2::<F>::zeros(item_factors.dim());
            let mut item_denom = Array2::<F>::zeros(item_factors.dim());

            let mut loss = F::zero();
            for (u, i, r) in dataset.iter_dense() {
                let est = user_factors.row(u).dot(&item_factors.row(i));
                loss += (r - est) * (r - est);
                for f in 0..n_factors {
                    user_num[[u, f]] += item_factors[[i, f]] * r;
                    user_denom[[u, f]] += item_factors[[i, f]] * est;
                    item_num[[i, f]] += user_factors[[u, f]] * r;
                    item_denom[[i, f]] += user_factors[[u, f]] * est;
                }
            }

            multiplicative_update(
                &mut user_factors,
                &user_num,
                &user_denom,
                dataset.user_rows(),
                self.reg(),
            );
            multiplicative_update(
                &mut item_factors,
                &item_num,
                &item_denom,
                dataset.item_rows(),
                self.reg(),
            );

            ensure_finite(&user_factors, "nmf", epoch)?;
            ensure_finite(&item_factors, "nmf", epoch)?;
            log_epoch(self.verbose(), "nmf", epoch, loss);
        }

        Ok(Nmf {
            global_mean: dataset.global_mean(),
            user_factors,
            item_factors,
            users: dataset.user_index().clone(),
            items: dataset.item_index().clone(),
            scale: dataset.rating_scale(),
        })
    }
}

fn multiplicative_update<F: Float>(
    factors: &mut Array2<F>,
    num: &Array2<F>,
    denom: &Array2<F>,
    rows: &[Vec<(usize, F)>],
    reg: F,
) {
    for (k, row) in rows.iter().enumerate() {
        let n = F::cast(row.len());
        for f in 0..factors.ncols() {
            let d = denom[[k, f]] + n * reg * factors[[k, f]];
            if d > F::zero() {
                factors[[k, f]] *= num[[k, f]] / d;
            }
        }
    }
}

impl<F: Float> Recommender<F> for Nmf<F> {
    fn name(&self) -> &'static str {
        "nmf"
    }

    fn predict(&self, user: UserId, item: ItemId) -> Result<F> {
        let est = match (self.users.get(user), self.items.get(item)) {
            (Some(u), Some(i)) => self.user_factors.row(u).dot(&self.item_factors.row(i)),
            _ => self.global_mean,
        };
        Ok(clip(est, self.scale))
    }
}
