use ndarray::{Array1, Array2, ArrayBase, ArrayView1, ArrayView2, Data, Dimension};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand_distr::{Distribution, Normal, Uniform};
use tracing::{debug, info};

use crate::error::{RecommendError, Result};
use crate::helpers::cholesky::solve_lin_sys_by_cholesky;
use crate::Float;


/// Draws a `(n_rows, n_factors)` factor matrix from a normal distribution.
pub fn normal_factors<F: Float>(
    n_rows: usize,
    n_factors: usize,
    mean: F,
    std: F,
    rng: &mut StdRng,
) -> Result<Array2<F>> {
    let normal = Normal::new(mean.as_f64(), std.as_f64())
        .map_err(|_| RecommendError::InvalidInitStdDev(std.as_f64() as f32))?;
    Ok(Array2::from_shape_simple_fn((n_rows, n_factors), || {
        F::cast(normal.sample(&mut *rng))
    }))
}

/// Draws a `(n_rows, n_factors)` factor matrix uniformly in `[low, high)`.
pub fn uniform_factors<F: Float>(
    n_rows: usize,
    n_factors: usize,
    low: F,
    high: F,
    rng: &mut StdRng,
) -> Result<Array2<F>> {
    if !(low < high) {
        return Err(RecommendError::InvalidInitRange(
            low.as_f64() as f32,
            high.as_f64() as f32,
        ));
    }
    let uniform = Uniform::new(low.as_f64(), high.as_f64());
    Ok(Array2::from_shape_simple_fn((n_rows, n_factors), || {
        F::cast(uniform.sample(&mut *rng))
    }))
}

/// The order in which an epoch visits `n` samples: the natural order, or a
/// fresh permutation when `shuffle` is set.
pub fn epoch_order(n: usize, shuffle: bool, rng: &mut StdRng) -> Vec<usize> {
    let mut order: Vec<usize> = (0..n).collect();
    if shuffle {
        order.shuffle(rng);
    }
    order
}

/// Fails with [`RecommendError::Diverged`] if any entry of `arr` is NaN or
/// infinite.
pub fn ensure_finite<F, S, D>(
    arr: &ArrayBase<S, D>,
    model: &'static str,
    epoch: usize,
) -> Result<()>
where
    F: Float,
    S: Data<Elem = F>,
    D: Dimension,
{
    if arr.iter().all(|x| x.is_finite()) {
        Ok(())
    } else {
        Err(RecommendError::Diverged { model, epoch })
    }
}

/// Computes `Y^T Y`.
pub fn gram<F: Float>(Y: ArrayView2<F>) -> Array2<F> {
    Y.t().dot(&Y)
}

/// Solves the ridge system `(A + reg * I) x = b` of one alternating least
/// squares update. `A` is consumed to hold the regularized matrix.
pub fn ridge_solve<F: Float>(
    mut A: Array2<F>,
    b: ArrayView1<F>,
    reg: F,
    entity: &'static str,
) -> Result<Array1<F>> {
    A.diag_mut().mapv_inplace(|d| d + reg);
    solve_lin_sys_by_cholesky(A.view(), b).map_err(|_| RecommendError::SingularSystem(entity))
}

/// Reports the progress of a training epoch, at `info` level when the model
/// is verbose and at `debug` level otherwise.
pub fn log_epoch<F: Float>(verbose: bool, model: &'static str, epoch: usize, objective: F) {
    let objective = objective.as_f64();
    if verbose {
        info!(model, epoch, objective, "epoch done");
    } else {
        debug!(model, epoch, objective, "epoch done");
    }
}
