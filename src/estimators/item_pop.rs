use std::marker::PhantomData;

use tracing::{debug, info};

use super::hyperparams::{ItemPopParams, ItemPopValidParams};
use super::require_ratings;
use super::traits::{Fit, Recommender};
use crate::datasets::{Dataset, IdIndex};
use crate::error::{RecommendError, Result};
use crate::{Float, ItemId, UserId};

/// The item popularity recommender
///
/// Non-personalized: candidates are ordered by their number of training
/// ratings, most rated first, ties broken by ascending item identifier. Items
/// absent from the training set have a popularity of zero. Only `rank` is
/// supported.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemPop<F> {
    counts: Vec<usize>,
    items: IdIndex,
    phantom: PhantomData<F>,
}

const NAME: &str = "item popularity";

impl<F: Float> ItemPop<F> {
    /// This method instantiates an item popularity recommender.
    pub fn params() -> ItemPopParams {
        ItemPopParams::new()
    }

    /// Number of training ratings of `item`.
    pub fn popularity(&self, item: ItemId) -> usize {
        self.items.get(item).map_or(0, |i| self.counts[i])
    }
}

impl<F: Float> Fit<F> for ItemPopValidParams {
    type Object = ItemPop<F>;

    fn fit(&self, dataset: &Dataset<F>) -> Result<Self::Object> {
        require_ratings(dataset)?;
        let counts: Vec<usize> = dataset.item_rows().iter().map(Vec::len).collect();
        if self.verbose() {
            info!(items = counts.len(), "item popularity counted");
        } else {
            debug!(items = counts.len(), "item popularity counted");
        }
        Ok(ItemPop {
            counts,
            items: dataset.item_index().clone(),
            phantom: PhantomData,
        })
    }
}

impl<F: Float> Recommender<F> for ItemPop<F> {
    fn name(&self) -> &'static str {
        NAME
    }

    fn check_predict() -> Result<()> {
        Err(RecommendError::Unsupported {
            operation: "predict",
            model: NAME,
        })
    }

    fn rank(&self, _user: UserId, candidates: &[ItemId]) -> Result<Vec<ItemId>> {
        let mut ranked = candidates.to_vec();
        ranked.sort_by(|a, b| {
            self.popularity(*b)
                .cmp(&self.popularity(*a))
                .then(a.cmp(b))
        });
        Ok(ranked)
    }
}
