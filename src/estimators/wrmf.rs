use ndarray::{Array1, Array2, ArrayView2};
use rand::rngs::StdRng;
use rand::SeedableRng;

use super::hyperparams::{WrmfParams, WrmfValidParams};
use super::require_ratings;
use super::traits::{Fit, Recommender};
use crate::datasets::{Dataset, IdIndex};
use crate::error::Result;
use crate::solvers::{ensure_finite, gram, log_epoch, normal_factors, ridge_solve};
use crate::{Float, ItemId, UserId};

/// The weighted regularized matrix factorization estimator
///
/// Scores `x_u . y_i` estimate the preference of a user for an item, learnt
/// from implicit feedback. Scores are not ratings: the model is meant to be
/// evaluated with ranking metrics. Unknown users or items score zero.
#[derive(Debug, Clone, PartialEq)]
pub struct Wrmf<F> {
    user_factors: Array2<F>,
    item_factors: Array2<F>,
    users: IdIndex,
    items: IdIndex,
}

impl<F: Float> Wrmf<F> {
    /// This method instantiates a WRMF estimator with default parameters.
    pub fn params() -> WrmfParams<F> {
        WrmfParams::new()
    }

    pub fn user_factors(&self) -> ArrayView2<F> {
        self.user_factors.view()
    }

    pub fn item_factors(&self) -> ArrayView2<F> {
        self.item_factors.view()
    }
}

/// Alternating least squares over all `(user, item)` pairs. The contribution
/// of the unobserved pairs is folded into the precomputed `Y^T Y`, so that each
/// per-entity system only iterates over the observed pairs:
/// ```ignore
/// x_u = (Y^T Y + Y^T (C_u - I) Y + reg I)^-1 Y^T C_u p_u
/// ```
impl<F: Float> Fit<F> for WrmfValidParams<F> {
    type Object = Wrmf<F>;

    fn fit(&self, dataset: &Dataset<F>) -> Result<Self::Object> {
        require_ratings(dataset)?;
        let mut rng = StdRng::seed_from_u64(self.seed());
        let mut user_factors = normal_factors(
            dataset.n_users(),
            self.n_factors(),
            self.init_mean(),
            self.init_std(),
            &mut rng,
        )?;
        let mut item_factors = normal_factors(
            dataset.n_items(),
            self.n_factors(),
            self.init_mean(),
            self.init_std(),
            &mut rng,
        )?;

        for epoch in 0..self.n_epochs() {
            als_half_step(
                &mut user_factors,
                item_factors.view(),
                dataset.user_rows(),
                self.alpha(),
                self.reg(),
                "user",
            )?;
            als_half_step(
                &mut item_factors,
                user_factors.view(),
                dataset.item_rows(),
                self.alpha(),
                self.reg(),
                "item",
            )?;
            ensure_finite(&user_factors, "wrmf", epoch)?;
            ensure_finite(&item_factors, "wrmf", epoch)?;

            let loss = dataset
                .iter_dense()
                .map(|(u, i, r)| {
                    let err = F::one() - user_factors.row(u).dot(&item_factors.row(i));
                    (F::one() + self.alpha() * r) * err * err
                })
                .sum::<F>();
            log_epoch(self.verbose(), "wrmf", epoch, loss);
        }

        Ok(Wrmf {
            user_factors,
            item_factors,
            users: dataset.user_index().clone(),
            items: dataset.item_index().clone(),
        })
    }
}

/// Solves for every row of `X` while holding `Y` fixed.
fn als_half_step<F: Float>(
    X: &mut Array2<F>,
    Y: ArrayView2<F>,
    rows: &[Vec<(usize, F)>],
    alpha: F,
    reg: F,
    entity: &'static str,
) -> Result<()> {
    let YtY = gram(Y);
    let n_factors = Y.ncols();
    for (k, row) in rows.iter().enumerate() {
        let mut A = YtY.clone();
        let mut b = Array1::<F>::zeros(n_factors);
        for &(j, r) in row {
            let confidence = F::one() + alpha * r;
            let y = Y.row(j);
            for p in 0..n_factors {
                for q in 0..n_factors {
                    A[[p, q]] += (confidence - F::one()) * y[p] * y[q];
                }
            }
            b.scaled_add(confidence, &y);
        }
        let x = ridge_solve(A, b.view(), reg, entity)?;
        X.row_mut(k).assign(&x);
    }
    Ok(())
}

impl<F: Float> Recommender<F> for Wrmf<F> {
    fn name(&self) -> &'static str {
        "wrmf"
    }

    fn predict(&self, user: UserId, item: ItemId) -> Result<F> {
        match (self.users.get(user), self.items.get(item)) {
            (Some(u), Some(i)) => Ok(self.user_factors.row(u).dot(&self.item_factors.row(i))),
            _ => Ok(F::zero()),
        }
    }
}
