//! Ordered multimap for bounded best-K selection.
//!
//! Thin layer over `BTreeMap<K, VecDeque<V>>` that keeps every value for a
//! duplicated key instead of replacing it. The seeding sweep holds the K
//! best-scoring pose candidates in one of these: insert until full, then
//! evict through [`SortedMultiMap::pop_min`] whenever a new candidate beats
//! the current minimum.

use std::collections::{BTreeMap, VecDeque};

/// Map from ordered keys to one or more values each.
///
/// Values that share a key are kept in insertion order.
#[derive(Debug, Clone)]
pub struct SortedMultiMap<K, V> {
    entries: BTreeMap<K, VecDeque<V>>,
    len: usize,
}

impl<K: Ord, V> SortedMultiMap<K, V> {
    pub fn new() -> Self {
        Self { entries: BTreeMap::new(), len: 0 }
    }

    /// Total number of stored values across all keys.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Inserts a value under `key`, keeping earlier values for the same key.
    pub fn insert(&mut self, key: K, value: V) {
        self.entries.entry(key).or_default().push_back(value);
        self.len += 1;
    }

    /// Smallest key currently stored.
    pub fn min_key(&self) -> Option<&K> {
        self.entries.keys().next()
    }

    /// Removes and returns the value least by key, oldest first among equals.
    pub fn pop_min(&mut self) -> Option<(K, V)>
    where
        K: Clone,
    {
        let mut entry = self.entries.first_entry()?;
        let key = entry.key().clone();
        let queue = entry.get_mut();
        let value = queue.pop_front()?;
        if queue.is_empty() {
            entry.remove();
        }
        self.len -= 1;
        Some((key, value))
    }

    /// Iterates `(key, value)` pairs in ascending key order, insertion order
    /// within each key.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.entries.iter().flat_map(|(key, values)| values.iter().map(move |v| (key, v)))
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.len = 0;
    }
}

impl<K: Ord, V> Default for SortedMultiMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}
