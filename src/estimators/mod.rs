use crate::datasets::Dataset;
use crate::error::{RecommendError, Result};
use crate::Float;

#[cfg(test)]
mod tests;

pub mod baseline;
pub mod co_clustering;
pub mod hyperparams;
pub mod item_pop;
pub mod knn;
pub mod nmf;
pub mod param_guard;
pub mod slope_one;
pub mod svd;
pub mod svdpp;
pub mod traits;
pub mod wrmf;

pub use baseline::Baseline;
pub use co_clustering::CoClustering;
pub use hyperparams::{KnnMode, Optimizer};
pub use item_pop::ItemPop;
pub use knn::Knn;
pub use nmf::Nmf;
pub use param_guard::ParamGuard;
pub use slope_one::SlopeOne;
pub use svd::Svd;
pub use svdpp::SvdPlusPlus;
pub use traits::{recommend, Fit, Recommender};
pub use wrmf::Wrmf;

/// Rating estimates are clipped to the rating scale of the training set.
pub(crate) fn clip<F: Float>(est: F, (low, high): (F, F)) -> F {
    est.max(low).min(high)
}

pub(crate) fn require_ratings<F: Float>(dataset: &Dataset<F>) -> Result<()> {
    if dataset.is_empty() {
        Err(RecommendError::EmptyDataset)
    } else {
        Ok(())
    }
}
