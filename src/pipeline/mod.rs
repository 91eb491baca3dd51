//! Periodic refresh of the stored recommendation lists.

use tracing::{debug, info};

use crate::datasets::Dataset;
use crate::error::{RecommendError, Result};
use crate::estimators::{Fit, Recommender};
use crate::storage::{Catalog, MetaStore, RatingStore, RecommendationStore, META_LAST_COUNT};
use crate::{Float, ItemId, UserId};


/// When and how much to recommend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshPolicy {
    top_n: usize,
    min_new_ratings: usize,
}

impl Default for RefreshPolicy {
    fn default() -> Self {
        RefreshPolicy {
            top_n: 10,
            min_new_ratings: 0,
        }
    }
}

impl RefreshPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Length of every stored top list.
    ///
    /// Defaults to `10` if not set.
    pub fn top_n(mut self, top_n: usize) -> Self {
        self.top_n = top_n;
        self
    }

    /// Number of ratings that must arrive after the last refresh before the
    /// model is refitted. The first refresh always runs.
    ///
    /// Defaults to `0` if not set.
    pub fn min_new_ratings(mut self, min_new_ratings: usize) -> Self {
        self.min_new_ratings = min_new_ratings;
        self
    }
}

/// What a refresh did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// Too few new ratings, or none at all. Nothing was written.
    Skipped { new_ratings: usize },
    /// The model was refitted on `ratings` ratings and the top list of
    /// `users` users was rewritten.
    Refreshed { users: usize, ratings: usize },
}

/// Refits the model configured by `params` on the ratings of `store` and
/// rewrites the top list of every rating user, if enough ratings arrived since
/// the last refresh.
///
/// A user's candidates are the catalog items they have not rated. On success
/// the current rating count is recorded under the `last_count` meta entry. A
/// failed fit leaves the store untouched.
pub fn refresh_recommendations<F, S, P>(
    store: &mut S,
    params: &P,
    policy: &RefreshPolicy,
) -> Result<RefreshOutcome>
where
    F: Float,
    S: RatingStore<F> + RecommendationStore + MetaStore + Catalog + ?Sized,
    P: Fit<F>,
    P::Object: Recommender<F>,
{
    if policy.top_n == 0 {
        return Err(RecommendError::InvalidCutoff(0));
    }

    let current = store.rating_count()?;
    let last = match store.last_rating_count() {
        Ok(last) => Some(last.max(0) as usize),
        Err(RecommendError::MissingMeta(_)) => None,
        Err(err) => return Err(err),
    };
    let new_ratings = current.saturating_sub(last.unwrap_or(0));
    let due = match last {
        Some(_) => new_ratings > 0 && new_ratings >= policy.min_new_ratings,
        None => current > 0,
    };
    if !due {
        debug!(current, new_ratings, "refresh skipped");
        return Ok(RefreshOutcome::Skipped { new_ratings });
    }

    let dataset = store.load_dataset()?;
    let model = params.fit(&dataset)?;
    let catalog = store.items()?;
    let lists = top_lists(&model, &dataset, &catalog, policy.top_n)?;
    let users = lists.len();
    for (user, items) in lists {
        store.put_recommendations(user, &items)?;
    }
    store.set_meta(META_LAST_COUNT, current as i64)?;

    info!(model = model.name(), users, ratings = current, "recommendations refreshed");
    Ok(RefreshOutcome::Refreshed {
        users,
        ratings: current,
    })
}

fn top_lists<F, R>(
    model: &R,
    dataset: &Dataset<F>,
    catalog: &[ItemId],
    top_n: usize,
) -> Result<Vec<(UserId, Vec<ItemId>)>>
where
    F: Float,
    R: Recommender<F> + ?Sized,
{
    dataset
        .user_ids()
        .iter()
        .map(|&user| {
            let candidates: Vec<ItemId> = catalog
                .iter()
                .copied()
                .filter(|&item| !dataset.contains(user, item))
                .collect();
            let mut ranked = model.rank(user, &candidates)?;
            ranked.truncate(top_n);
            Ok((user, ranked))
        })
        .collect()
}
