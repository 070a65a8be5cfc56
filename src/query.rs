//! `DataMap`: a `BTreeMap`-backed store paired with an [`IndexRegistry`],
//! driving filter evaluation, sort and paging end to end.
//!
//! Plays the same "reference composable index" role the teacher's
//! `Rdms<K, V, I>` (`rdms.rs`) plays over `Index<K, V>` implementations,
//! without attempting to reproduce the teacher's LSM/MVCC/on-disk
//! machinery -- that's explicitly out of scope here. Embedding
//! applications that already own a map abstraction wire an
//! [`IndexRegistry`] directly against their own store instead.

use std::collections::{BTreeMap, BTreeSet};
use std::hash::Hash;
use std::sync::Arc;

use rayon::prelude::*;

use crate::comparator::Comparator;
use crate::entry::Entry;
use crate::err_at;
use crate::error::Result;
use crate::extractor::{ExtractorHandle, ExtractorObj};
use crate::filter::{Filter, Page};
use crate::index::{IndexAwareExtractor, IndexConfig, IndexRegistry, IndexSource, MapIndex, SimpleMapIndex};

/// Below this many surviving keys, residual-filter evaluation runs
/// sequentially; at or above it, the driver fans out across `rayon`'s
/// global pool. Mirrors the teacher's `Q: 'static + Sync + Send` bound on
/// `mq/filter.rs`'s channel-filter pipeline: parallel dispatch only pays
/// for itself once a batch is large enough to amortize the overhead.
pub const PARALLEL_THRESHOLD: usize = 256;

/// An in-memory key/value store with a registry of attached indexes.
pub struct DataMap<K, V>
where
    K: Ord + Clone + Hash + Send + Sync + 'static,
    V: Send + Sync + 'static,
{
    data: BTreeMap<K, V>,
    indexes: IndexRegistry<K, V>,
}

impl<K, V> Default for DataMap<K, V>
where
    K: Ord + Clone + Hash + Send + Sync + 'static,
    V: Send + Sync + 'static,
{
    fn default() -> Self {
        DataMap { data: BTreeMap::new(), indexes: IndexRegistry::new() }
    }
}

impl<K, V> DataMap<K, V>
where
    K: Ord + Clone + Hash + Send + Sync + 'static,
    V: Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &K) -> Option<&V> {
        self.data.get(key)
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.data.contains_key(key)
    }

    pub fn keys(&self) -> BTreeSet<K> {
        self.data.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn indexes(&self) -> &IndexRegistry<K, V> {
        &self.indexes
    }

    /// Insert or replace `key -> value`, routing the mutation to every
    /// registered index as an `Insert` or `Update` per whether `key` was
    /// already present.
    pub fn put(&mut self, key: K, value: V) -> Result<()>
    where
        V: Clone,
    {
        match self.data.get(&key).cloned() {
            Some(original) => {
                let entry = Entry::new(key.clone(), value.clone()).with_original(original);
                self.indexes.notify_update(&entry)?;
            }
            None => {
                let entry = Entry::new(key.clone(), value.clone());
                self.indexes.notify_insert(&entry)?;
            }
        }
        self.data.insert(key, value);
        Ok(())
    }

    /// Remove `key`, routing a `Remove` mutation to every registered
    /// index. Returns the removed value, if any.
    pub fn delete(&mut self, key: &K) -> Result<Option<V>>
    where
        V: Clone,
    {
        match self.data.remove(key) {
            Some(value) => {
                let mut entry = Entry::new(key.clone(), value.clone());
                entry.remove(false)?;
                self.indexes.notify_remove(&entry)?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    /// Register an index over `source`, back-filling it from every entry
    /// already present. Idempotent when called again with an extractor
    /// of the same identity; fails with `InvalidArgument` on a
    /// conflicting re-registration (an index is already registered under
    /// that extractor's name+target).
    ///
    /// `source` accepts either a plain `Arc<dyn Extractor<V, T>>` (gets a
    /// `SimpleMapIndex` built for it) or an
    /// `Arc<dyn IndexAwareExtractor<K, V, T>>`, which delegates index
    /// construction — and, on removal, teardown — to the extractor
    /// itself.
    pub fn add_index<T>(&mut self, source: impl Into<IndexSource<K, V, T>>, config: IndexConfig<T>) -> Result<()>
    where
        T: Hash + Eq + Clone + Send + Sync + 'static,
        V: Clone,
    {
        let source = source.into();
        let handle = match &source {
            IndexSource::Simple(e) => ExtractorHandle::new(e.name().to_string(), e.target()),
            IndexSource::Aware(e) => ExtractorHandle::new(e.name().to_string(), e.target()),
        };
        if self.indexes.contains(&handle) {
            return err_at!(InvalidArgument, msg: "index already registered for {}", handle.name());
        }

        match source {
            IndexSource::Simple(extractor) => {
                let mut index = SimpleMapIndex::new(extractor, config);
                for (k, v) in self.data.iter() {
                    index.insert(&Entry::new(k.clone(), v.clone()))?;
                }
                self.indexes.insert_index(handle, Box::new(index));
            }
            IndexSource::Aware(extractor) => {
                let mut index = extractor.clone().create_index(config);
                for (k, v) in self.data.iter() {
                    index.insert(&Entry::new(k.clone(), v.clone()))?;
                }
                let teardown_extractor = extractor.clone();
                self.indexes.insert_index_with_teardown(
                    handle,
                    index,
                    Box::new(move |idx| teardown_extractor.destroy_index(idx)),
                );
            }
        }
        Ok(())
    }

    /// Unregister whatever index is keyed by `handle`. Returns `true` if
    /// an index was actually removed.
    pub fn remove_index(&mut self, handle: &ExtractorHandle) -> bool {
        self.indexes.remove_index(handle).is_some()
    }

    /// Keys matching `filter`: narrows via `apply_index` first, then
    /// evaluates any residual entry-by-entry.
    pub fn key_set(&self, filter: &dyn Filter<K, V>) -> Result<BTreeSet<K>>
    where
        V: Clone,
    {
        let mut keys = self.keys();
        if let Some(residual) = filter.apply_index(&self.indexes, &mut keys)? {
            self.retain_matching(residual.as_ref(), &mut keys)?;
        }
        Ok(keys)
    }

    /// `(key, value)` pairs matching `filter`, in key order.
    pub fn entry_set(&self, filter: &dyn Filter<K, V>) -> Result<Vec<(K, V)>>
    where
        V: Clone,
    {
        let keys = self.key_set(filter)?;
        Ok(keys.into_iter().filter_map(|k| self.data.get(&k).cloned().map(|v| (k, v))).collect())
    }

    /// `entry_set`, additionally sorted by `comparator` (natural order of
    /// `V` when the caller supplies [`crate::comparator::NaturalOrder`]).
    ///
    /// Sorts via `try_compare`: `sort_by`'s closure must return a bare
    /// `Ordering`, so the first error `try_compare` raises is stashed and
    /// `Ordering::Equal` returned in its place to keep the sort
    /// well-behaved; the stashed error is propagated once sorting
    /// finishes.
    pub fn entry_set_sorted(&self, filter: &dyn Filter<K, V>, comparator: &dyn Comparator<V>) -> Result<Vec<(K, V)>>
    where
        V: Clone,
    {
        let mut entries = self.entry_set(filter)?;
        let first_error: std::cell::RefCell<Option<crate::error::Error>> = std::cell::RefCell::new(None);
        entries.sort_by(|(_, a), (_, b)| match comparator.try_compare(a, b) {
            Ok(ordering) => ordering,
            Err(e) => {
                first_error.borrow_mut().get_or_insert(e);
                std::cmp::Ordering::Equal
            }
        });
        match first_error.into_inner() {
            Some(e) => Err(e),
            None => Ok(entries),
        }
    }

    /// Extract one page out of `sorted` entries (as produced by
    /// [`DataMap::entry_set_sorted`]), using `page`'s anchor to avoid
    /// rescanning from the start when possible.
    pub fn page_slice<'a>(sorted: &'a [(K, V)], page: &Page<V>) -> &'a [(K, V)]
    where
        V: Clone,
    {
        let values: Vec<V> = sorted.iter().map(|(_, v)| v.clone()).collect();
        let (start, end) = page.bounds(&values);
        &sorted[start..end]
    }

    /// Evaluate `residual` against every key still in `keys`, dropping
    /// those that fail. Fans out across `rayon` once the candidate set is
    /// large enough to amortize the dispatch overhead (see
    /// [`PARALLEL_THRESHOLD`]); keys absent from the backing map (stale
    /// by the time the residual runs) are dropped rather than treated as
    /// matches.
    ///
    /// Evaluates via `evaluate_entry` rather than `evaluate`: a residual
    /// built by a combinator's `apply_index` (e.g. `Any`'s `Key(matched)`
    /// union term) can only be decided with key access, not value alone.
    fn retain_matching(&self, residual: &dyn Filter<K, V>, keys: &mut BTreeSet<K>) -> Result<()>
    where
        V: Clone,
    {
        let candidates: Vec<K> = keys.iter().cloned().collect();
        let matches = |k: K| -> Result<Option<K>> {
            match self.data.get(&k) {
                Some(v) => {
                    let entry = Entry::new(k.clone(), v.clone());
                    Ok(residual.evaluate_entry(&entry)?.then_some(k))
                }
                None => Ok(None),
            }
        };
        let kept: BTreeSet<K> = if candidates.len() >= PARALLEL_THRESHOLD {
            candidates
                .into_par_iter()
                .map(matches)
                .collect::<Result<Vec<Option<K>>>>()?
                .into_iter()
                .flatten()
                .collect()
        } else {
            candidates.into_iter().map(matches).collect::<Result<Vec<Option<K>>>>()?.into_iter().flatten().collect()
        };
        *keys = kept;
        Ok(())
    }
}

#[cfg(test)]
#[path = "query_test.rs"]
mod query_test;
