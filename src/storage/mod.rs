//! Persistence collaborators of the recommendation service.
//!
//! A backend stores the ratings, the items that may be recommended, the
//! per-user top lists and a few named counters. The traits only describe the
//! operations; [`MemoryStore`] is the in-memory reference backend.

use std::collections::HashMap;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use tracing::debug;

use crate::datasets::{Dataset, IdIndex, Rating};
use crate::error::{RecommendError, Result};
use crate::{Float, ItemId, UserId};


/// Meta entry holding the schema version of a backend.
pub const META_VERSION: &str = "version";

/// Meta entry holding the number of ratings at the last recommendation
/// refresh.
pub const META_LAST_COUNT: &str = "last_count";

/// Rating storage.
pub trait RatingStore<F: Float> {
    /// Inserts a rating, replacing the value of an existing `(user, item)`
    /// pair.
    fn put_rating(&mut self, rating: Rating<F>) -> Result<()>;

    /// Every stored rating, in insertion order of their `(user, item)` pair.
    fn ratings(&self) -> Result<Vec<Rating<F>>>;

    /// Number of stored ratings.
    fn rating_count(&self) -> Result<usize> {
        Ok(self.ratings()?.len())
    }

    /// Builds a [`Dataset`] from the stored ratings.
    fn load_dataset(&self) -> Result<Dataset<F>> {
        Ok(Dataset::new(self.ratings()?))
    }
}

/// Storage of the per-user recommendation lists.
pub trait RecommendationStore {
    /// Stores the ordered top list of `user`, replacing any previous list.
    /// The position of an item is its index in `items`.
    fn put_recommendations(&mut self, user: UserId, items: &[ItemId]) -> Result<()>;

    /// The top list of `user` ordered by position, empty if none was stored.
    fn recommendations(&self, user: UserId) -> Result<Vec<ItemId>>;
}

/// Named integer counters.
pub trait MetaStore {
    /// The value of `name`, [`RecommendError::MissingMeta`] if it was never
    /// set.
    fn get_meta(&self, name: &str) -> Result<i64>;

    fn set_meta(&mut self, name: &str, value: i64) -> Result<()>;

    fn version(&self) -> Result<i64> {
        self.get_meta(META_VERSION)
    }

    /// Number of ratings at the last refresh.
    fn last_rating_count(&self) -> Result<i64> {
        self.get_meta(META_LAST_COUNT)
    }
}

/// The items that may be recommended.
pub trait Catalog {
    /// Registers `item`. Registering an item twice is a no-op.
    fn put_item(&mut self, item: ItemId) -> Result<()>;

    /// All the items, in registration order.
    fn items(&self) -> Result<Vec<ItemId>>;

    /// Up to `n` distinct items drawn at random.
    fn random_items(&self, _n: usize, _seed: u64) -> Result<Vec<ItemId>> {
        Err(RecommendError::Unsupported {
            operation: "random_items",
            model: "catalog",
        })
    }

    /// Up to `n` items, most rated first.
    fn popular_items(&self, _n: usize) -> Result<Vec<ItemId>> {
        Err(RecommendError::Unsupported {
            operation: "popular_items",
            model: "catalog",
        })
    }
}

/// In-memory backend implementing every storage trait.
///
/// Rating an item registers it in the catalog.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore<F> {
    ratings: Vec<Rating<F>>,
    rating_index: HashMap<(UserId, ItemId), usize>,
    items: IdIndex,
    item_counts: Vec<usize>,
    recommendations: HashMap<UserId, Vec<ItemId>>,
    meta: HashMap<String, i64>,
}

impl<F: Float> MemoryStore<F> {
    pub fn new() -> Self {
        MemoryStore {
            ratings: Vec::new(),
            rating_index: HashMap::new(),
            items: IdIndex::new(),
            item_counts: Vec::new(),
            recommendations: HashMap::new(),
            meta: HashMap::new(),
        }
    }

    /// Users holding a stored top list.
    pub fn users_with_recommendations(&self) -> usize {
        self.recommendations.len()
    }

    fn register(&mut self, item: ItemId) -> usize {
        let i = self.items.insert(item);
        if i == self.item_counts.len() {
            self.item_counts.push(0);
        }
        i
    }
}

impl<F: Float> RatingStore<F> for MemoryStore<F> {
    fn put_rating(&mut self, rating: Rating<F>) -> Result<()> {
        match self.rating_index.get(&(rating.user, rating.item)) {
            Some(&k) => self.ratings[k].value = rating.value,
            None => {
                self.rating_index
                    .insert((rating.user, rating.item), self.ratings.len());
                self.ratings.push(rating);
                let i = self.register(rating.item);
                self.item_counts[i] += 1;
            }
        }
        Ok(())
    }

    fn ratings(&self) -> Result<Vec<Rating<F>>> {
        Ok(self.ratings.clone())
    }

    fn rating_count(&self) -> Result<usize> {
        Ok(self.ratings.len())
    }
}

impl<F: Float> RecommendationStore for MemoryStore<F> {
    fn put_recommendations(&mut self, user: UserId, items: &[ItemId]) -> Result<()> {
        debug!(user, items = items.len(), "top list stored");
        self.recommendations.insert(user, items.to_vec());
        Ok(())
    }

    fn recommendations(&self, user: UserId) -> Result<Vec<ItemId>> {
        Ok(self.recommendations.get(&user).cloned().unwrap_or_default())
    }
}

impl<F: Float> MetaStore for MemoryStore<F> {
    fn get_meta(&self, name: &str) -> Result<i64> {
        self.meta
            .get(name)
            .copied()
            .ok_or_else(|| RecommendError::MissingMeta(name.to_string()))
    }

    fn set_meta(&mut self, name: &str, value: i64) -> Result<()> {
        self.meta.insert(name.to_string(), value);
        Ok(())
    }
}

impl<F: Float> Catalog for MemoryStore<F> {
    fn put_item(&mut self, item: ItemId) -> Result<()> {
        self.register(item);
        Ok(())
    }

    fn items(&self) -> Result<Vec<ItemId>> {
        Ok(self.items.ids().to_vec())
    }

    fn random_items(&self, n: usize, seed: u64) -> Result<Vec<ItemId>> {
        let mut rng = StdRng::seed_from_u64(seed);
        Ok(self
            .items
            .ids()
            .choose_multiple(&mut rng, n)
            .copied()
            .collect())
    }

    fn popular_items(&self, n: usize) -> Result<Vec<ItemId>> {
        let mut items: Vec<(usize, ItemId)> = self
            .item_counts
            .iter()
            .zip(self.items.ids())
            .map(|(&count, &item)| (count, item))
            .collect();
        items.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));
        Ok(items.into_iter().take(n).map(|(_, item)| item).collect())
    }
}
