//! A [`SimpleMapIndex`] gated by an entry-admission filter: only entries
//! the filter accepts are ever indexed, making the index partial by
//! construction whenever any entry is rejected.

use std::any::Any;
use std::hash::Hash;
use std::sync::Arc;

use crate::entry::Entry;
use crate::error::Result;
use crate::extractor::Extractor;
use crate::filter::Filter;
use crate::index::inverse::Inverse;
use crate::index::registry::MapIndex;
use crate::index::simple::{ForwardLookup, IndexConfig, SimpleMapIndex};

/// Wraps a [`SimpleMapIndex`] with an admission filter. Matches the
/// upstream design point for point: `insert`/`update` only delegate when
/// the filter accepts the entry; `remove` checks the *original* value so
/// entries that were never admitted are never spuriously retracted from
/// postings they were never filed under.
pub struct ConditionalIndex<K, V, T>
where
    K: Ord + Clone + Hash,
    T: Hash + Eq + Clone,
{
    filter: Arc<dyn Filter<K, V>>,
    inner: SimpleMapIndex<K, V, T>,
    forward_enabled: bool,
    partial: bool,
}

impl<K, V, T> ConditionalIndex<K, V, T>
where
    K: Ord + Clone + Hash,
    T: Hash + Eq + Clone,
{
    pub fn new(
        filter: Arc<dyn Filter<K, V>>,
        extractor: Arc<dyn Extractor<V, T>>,
        config: IndexConfig<T>,
    ) -> Self {
        let forward_enabled = config.forward_index;
        ConditionalIndex { filter, inner: SimpleMapIndex::new(extractor, config), forward_enabled, partial: false }
    }

    /// Admission-gated split-collection index; see
    /// [`SimpleMapIndex::new_split`].
    pub fn new_split(
        filter: Arc<dyn Filter<K, V>>,
        extractor: Arc<dyn Extractor<V, std::collections::BTreeSet<T>>>,
        config: IndexConfig<T>,
    ) -> Self {
        let forward_enabled = config.forward_index;
        ConditionalIndex { filter, inner: SimpleMapIndex::new_split(extractor, config), forward_enabled, partial: false }
    }

    pub fn filter(&self) -> &Arc<dyn Filter<K, V>> {
        &self.filter
    }

    pub fn is_forward_index_supported(&self) -> bool {
        self.forward_enabled
    }

    pub fn contents(&self) -> &Inverse<T, K> {
        self.inner.contents()
    }

    pub fn get(&self, key: &K) -> ForwardLookup<T> {
        if self.forward_enabled {
            self.inner.get(key)
        } else {
            ForwardLookup::NoValue
        }
    }

    /// Evaluate the admission filter; a filter that errors is treated as
    /// rejection (mirrors the upstream "don't drop the index upon
    /// exception" handling — a user-supplied admission predicate failing
    /// must not poison index maintenance).
    fn admits(&mut self, entry: &Entry<K, V>) -> bool {
        match self.filter.evaluate_entry(entry) {
            Ok(true) => true,
            Ok(false) => {
                self.partial = true;
                false
            }
            Err(_) => {
                self.partial = true;
                false
            }
        }
    }

    fn admitted_original(&self, entry: &Entry<K, V>) -> bool {
        match entry.get_original_value() {
            None => true, // no snapshot to check against: assume it may have been admitted
            Some(_) => self.filter.evaluate_original_entry(entry).unwrap_or(false),
        }
    }
}

impl<K, V, T> MapIndex<K, V> for ConditionalIndex<K, V, T>
where
    K: Ord + Clone + Hash + Send + Sync + 'static,
    V: Send + Sync + 'static,
    T: Hash + Eq + Clone + Send + Sync + 'static,
{
    fn insert(&mut self, entry: &Entry<K, V>) -> Result<()> {
        if self.admits(entry) {
            self.inner.insert(entry)
        } else {
            Ok(())
        }
    }

    fn update(&mut self, entry: &Entry<K, V>) -> Result<()> {
        if self.admits(entry) {
            self.inner.update(entry)
        } else {
            self.inner.remove(entry)
        }
    }

    fn remove(&mut self, entry: &Entry<K, V>) -> Result<()> {
        if !self.admitted_original(entry) {
            // was never in the index: nothing to retract.
            return Ok(());
        }
        self.inner.remove(entry)
    }

    fn is_partial(&self) -> bool {
        self.partial || self.inner.is_partial()
    }

    fn is_ordered(&self) -> bool {
        self.inner.is_ordered()
    }

    fn len(&self) -> usize {
        self.inner.len()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[cfg(test)]
#[path = "conditional_test.rs"]
mod conditional_test;
