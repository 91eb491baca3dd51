use ndarray::{Array1, ArrayView1};

use super::{Dataset, IdIndex, Rating};
use crate::{Float, ItemId, UserId};

/// This implementation block builds the derived indices of a dataset.
impl<F: Float> Dataset<F> {
    /// Builds a dataset and all its derived indices in a single pass over the
    /// ratings (plus a sort of every row).
    pub fn new(ratings: Vec<Rating<F>>) -> Dataset<F> {
        let mut users = IdIndex::new();
        let mut items = IdIndex::new();
        let entries: Vec<(usize, usize)> = ratings
            .iter()
            .map(|r| (users.insert(r.user), items.insert(r.item)))
            .collect();

        let mut user_rows = vec![Vec::new(); users.len()];
        let mut item_rows = vec![Vec::new(); items.len()];
        for (rating, &(u, i)) in ratings.iter().zip(entries.iter()) {
            user_rows[u].push((i, rating.value));
            item_rows[i].push((u, rating.value));
        }
        for row in user_rows.iter_mut().chain(item_rows.iter_mut()) {
            row.sort_by_key(|&(j, _)| j);
        }

        let global_mean = match ratings.len() {
            0 => F::zero(),
            n => ratings.iter().map(|r| r.value).sum::<F>() / F::cast(n),
        };
        let scale = ratings
            .iter()
            .map(|r| (r.value, r.value))
            .reduce(|(lo, hi), (v, _)| (lo.min(v), hi.max(v)))
            .unwrap_or((F::zero(), F::zero()));

        let (user_means, user_stds) = row_moments(&user_rows);
        let (item_means, item_stds) = row_moments(&item_rows);

        Dataset {
            ratings,
            entries,
            users,
            items,
            user_rows,
            item_rows,
            global_mean,
            user_means,
            item_means,
            user_stds,
            item_stds,
            scale,
        }
    }

    /// Builds a new dataset from the ratings at `indices`, in that order.
    pub fn subset(&self, indices: &[usize]) -> Dataset<F> {
        Dataset::new(indices.iter().map(|&k| self.ratings[k]).collect())
    }
}

/// Mean and population standard deviation of every row. Empty rows get zeros.
fn row_moments<F: Float>(rows: &[Vec<(usize, F)>]) -> (Array1<F>, Array1<F>) {
    let mut means = Array1::<F>::zeros(rows.len());
    let mut stds = Array1::<F>::zeros(rows.len());
    for (k, row) in rows.iter().enumerate() {
        if row.is_empty() {
            continue;
        }
        let n = F::cast(row.len());
        let mean = row.iter().map(|&(_, v)| v).sum::<F>() / n;
        let var = row.iter().map(|&(_, v)| (v - mean).powi(2)).sum::<F>() / n;
        means[k] = mean;
        stds[k] = var.sqrt();
    }
    (means, stds)
}

impl<F: Float> FromIterator<Rating<F>> for Dataset<F> {
    fn from_iter<I: IntoIterator<Item = Rating<F>>>(iter: I) -> Self {
        Dataset::new(iter.into_iter().collect())
    }
}

/// This implementation block provides getters over the raw-identifier view of
/// the dataset.
impl<F: Float> Dataset<F> {
    pub fn ratings(&self) -> &[Rating<F>] {
        &self.ratings
    }

    pub fn n_ratings(&self) -> usize {
        self.ratings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ratings.is_empty()
    }

    pub fn n_users(&self) -> usize {
        self.users.len()
    }

    pub fn n_items(&self) -> usize {
        self.items.len()
    }

    pub fn user_ids(&self) -> &[UserId] {
        self.users.ids()
    }

    pub fn item_ids(&self) -> &[ItemId] {
        self.items.ids()
    }

    pub fn global_mean(&self) -> F {
        self.global_mean
    }

    /// Smallest and largest rating value, `(0, 0)` for an empty dataset.
    pub fn rating_scale(&self) -> (F, F) {
        self.scale
    }

    pub fn user_mean(&self, user: UserId) -> Option<F> {
        self.users.get(user).map(|u| self.user_means[u])
    }

    pub fn item_mean(&self, item: ItemId) -> Option<F> {
        self.items.get(item).map(|i| self.item_means[i])
    }

    pub fn user_std(&self, user: UserId) -> Option<F> {
        self.users.get(user).map(|u| self.user_stds[u])
    }

    pub fn item_std(&self, item: ItemId) -> Option<F> {
        self.items.get(item).map(|i| self.item_stds[i])
    }

    /// Number of ratings given by `user`, zero if unknown.
    pub fn user_count(&self, user: UserId) -> usize {
        self.users
            .get(user)
            .map_or(0, |u| self.user_rows[u].len())
    }

    /// Number of ratings received by `item`, zero if unknown.
    pub fn item_count(&self, item: ItemId) -> usize {
        self.items
            .get(item)
            .map_or(0, |i| self.item_rows[i].len())
    }

    /// The `(item, rating)` pairs of `user`, empty if unknown.
    pub fn user_ratings(&self, user: UserId) -> Vec<(ItemId, F)> {
        self.users.get(user).map_or_else(Vec::new, |u| {
            self.user_rows[u]
                .iter()
                .map(|&(i, v)| (self.items.id(i), v))
                .collect()
        })
    }

    /// The `(user, rating)` pairs of `item`, empty if unknown.
    pub fn item_ratings(&self, item: ItemId) -> Vec<(UserId, F)> {
        self.items.get(item).map_or_else(Vec::new, |i| {
            self.item_rows[i]
                .iter()
                .map(|&(u, v)| (self.users.id(u), v))
                .collect()
        })
    }

    pub fn contains(&self, user: UserId, item: ItemId) -> bool {
        match (self.users.get(user), self.items.get(item)) {
            (Some(u), Some(i)) => self.user_rows[u]
                .binary_search_by_key(&i, |&(j, _)| j)
                .is_ok(),
            _ => false,
        }
    }
}

/// This implementation block exposes the dense-index view used by the
/// estimators.
impl<F: Float> Dataset<F> {
    pub fn user_index(&self) -> &IdIndex {
        &self.users
    }

    pub fn item_index(&self) -> &IdIndex {
        &self.items
    }

    /// Iterates over `(user index, item index, rating)` in rating order.
    pub fn iter_dense(&self) -> impl Iterator<Item = (usize, usize, F)> + '_ {
        self.entries
            .iter()
            .zip(self.ratings.iter())
            .map(|(&(u, i), r)| (u, i, r.value))
    }

    /// Ratings of the user at index `u`, sorted by item index.
    pub fn user_row(&self, u: usize) -> &[(usize, F)] {
        &self.user_rows[u]
    }

    /// Ratings of the item at index `i`, sorted by user index.
    pub fn item_row(&self, i: usize) -> &[(usize, F)] {
        &self.item_rows[i]
    }

    pub fn user_rows(&self) -> &[Vec<(usize, F)>] {
        &self.user_rows
    }

    pub fn item_rows(&self) -> &[Vec<(usize, F)>] {
        &self.item_rows
    }

    pub fn user_means(&self) -> ArrayView1<F> {
        self.user_means.view()
    }

    pub fn item_means(&self) -> ArrayView1<F> {
        self.item_means.view()
    }

    pub fn user_stds(&self) -> ArrayView1<F> {
        self.user_stds.view()
    }

    pub fn item_stds(&self) -> ArrayView1<F> {
        self.item_stds.view()
    }
}
