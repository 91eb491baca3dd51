use std::collections::HashMap;

use super::IdIndex;

impl IdIndex {
    pub fn new() -> Self {
        IdIndex::default()
    }

    /// Returns the index of `id`, registering it if it is new.
    pub fn insert(&mut self, id: i64) -> usize {
        let next = self.ids.len();
        let idx = *self.dense.entry(id).or_insert(next);
        if idx == next {
            self.ids.push(id);
        }
        idx
    }

    pub fn get(&self, id: i64) -> Option<usize> {
        self.dense.get(&id).copied()
    }

    /// Raw identifier at `idx`. Panics if `idx` is out of range.
    pub fn id(&self, idx: usize) -> i64 {
        self.ids[idx]
    }

    pub fn ids(&self) -> &[i64] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

impl FromIterator<i64> for IdIndex {
    fn from_iter<I: IntoIterator<Item = i64>>(iter: I) -> Self {
        let mut index = IdIndex {
            dense: HashMap::new(),
            ids: Vec::new(),
        };
        for id in iter {
            index.insert(id);
        }
        index
    }
}
