use ndarray::Array1;
use std::collections::HashMap;

use crate::{ItemId, UserId};


mod impl_dataset;
mod impl_id_index;

/// A single observation: `user` gave `item` the rating `value`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rating<F> {
    pub user: UserId,
    pub item: ItemId,
    pub value: F,
}

impl<F> Rating<F> {
    pub fn new(user: UserId, item: ItemId, value: F) -> Self {
        Rating { user, item, value }
    }
}

/// Bidirectional mapping between raw identifiers and contiguous indices.
///
/// Indices are handed out in order of first appearance, so two datasets built
/// from the same rating sequence share the same indexing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IdIndex {
    dense: HashMap<i64, usize>,
    ids: Vec<i64>,
}

/// An immutable in-memory index over rating observations.
///
/// Besides the ordered ratings, a dataset holds the per-user and per-item rows
/// of the rating matrix (each sorted by counterpart index), the global mean and
/// the per-entity means and standard deviations. Everything is computed once
/// at construction.
#[derive(Debug, Clone)]
pub struct Dataset<F> {
    ratings: Vec<Rating<F>>,
    entries: Vec<(usize, usize)>,
    users: IdIndex,
    items: IdIndex,
    user_rows: Vec<Vec<(usize, F)>>,
    item_rows: Vec<Vec<(usize, F)>>,
    global_mean: F,
    user_means: Array1<F>,
    item_means: Array1<F>,
    user_stds: Array1<F>,
    item_stds: Array1<F>,
    scale: (F, F),
}

/// A `(train, test)` pair produced by a splitter.
#[derive(Debug, Clone)]
pub struct Fold<F> {
    pub train: Dataset<F>,
    pub test: Dataset<F>,
}
