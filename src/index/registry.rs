//! Type-erased index registry: `ValueExtractor -> MapIndex` keyed map.
//!
//! Different extractors in the same map generally produce different
//! extracted types `T`; a registry that must hold all of them in one
//! collection can't be generic over `T`. `MapIndex<K, V>` is therefore
//! `T`-free and object-safe, and the handful of operations that need the
//! concrete `T` (leaf filters statically know their own `T`) downcast via
//! [`std::any::Any`] — the conventional way type-erased plugin registries
//! are written in Rust, and the same split this crate's own
//! `Box<dyn Index<K, V>>` composition relies on elsewhere.

use std::any::Any;
use std::collections::HashMap;

use crate::entry::Entry;
use crate::error::Result;
use crate::extractor::ExtractorHandle;

/// Object-safe half of an index: lifecycle hooks the query driver and map
/// listener call without needing to know `T`.
pub trait MapIndex<K, V>: Send + Sync {
    fn insert(&mut self, entry: &Entry<K, V>) -> Result<()>;
    fn update(&mut self, entry: &Entry<K, V>) -> Result<()>;
    fn remove(&mut self, entry: &Entry<K, V>) -> Result<()>;

    /// True once any key has been excluded from the index (extraction
    /// failure, or admission-filter rejection for a `ConditionalIndex`).
    fn is_partial(&self) -> bool;

    fn is_ordered(&self) -> bool;

    /// Number of distinct extracted values currently indexed.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Downcast support for leaf filters that know their own `T`.
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// `extractor -> index` map, read-mostly from the query driver's
/// perspective and mutated only by `add_index`/`remove_index` and the
/// per-entry insert/update/remove dispatch on mutation.
pub struct IndexRegistry<K, V> {
    indexes: HashMap<ExtractorHandle, Box<dyn MapIndex<K, V>>>,
    teardown: HashMap<ExtractorHandle, Box<dyn FnOnce(&mut dyn MapIndex<K, V>) + Send>>,
}

impl<K, V> Default for IndexRegistry<K, V> {
    fn default() -> Self {
        IndexRegistry { indexes: HashMap::new(), teardown: HashMap::new() }
    }
}

impl<K, V> IndexRegistry<K, V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, handle: &ExtractorHandle) -> Option<&(dyn MapIndex<K, V>)> {
        self.indexes.get(handle).map(|b| b.as_ref())
    }

    pub fn get_mut(&mut self, handle: &ExtractorHandle) -> Option<&mut (dyn MapIndex<K, V>)> {
        self.indexes.get_mut(handle).map(|b| b.as_mut())
    }

    pub fn contains(&self, handle: &ExtractorHandle) -> bool {
        self.indexes.contains_key(handle)
    }

    pub fn insert_index(&mut self, handle: ExtractorHandle, index: Box<dyn MapIndex<K, V>>) {
        self.indexes.insert(handle, index);
    }

    /// Registers `index` alongside a teardown hook run (with mutable
    /// access to the index) when it's later unregistered. The bridge
    /// `IndexAwareExtractor::destroy_index` needs: the registry itself
    /// is erased over the extracted type `T`, so it can't hold a typed
    /// extractor reference to call back into directly.
    pub fn insert_index_with_teardown(
        &mut self,
        handle: ExtractorHandle,
        index: Box<dyn MapIndex<K, V>>,
        teardown: Box<dyn FnOnce(&mut dyn MapIndex<K, V>) + Send>,
    ) {
        self.indexes.insert(handle.clone(), index);
        self.teardown.insert(handle, teardown);
    }

    pub fn remove_index(&mut self, handle: &ExtractorHandle) -> Option<Box<dyn MapIndex<K, V>>> {
        let mut removed = self.indexes.remove(handle)?;
        if let Some(hook) = self.teardown.remove(handle) {
            hook(removed.as_mut());
        }
        Some(removed)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ExtractorHandle, &Box<dyn MapIndex<K, V>>)> {
        self.indexes.iter()
    }

    /// Route a map mutation to every registered index.
    pub fn notify_insert(&mut self, entry: &Entry<K, V>) -> Result<()> {
        for index in self.indexes.values_mut() {
            index.insert(entry)?;
        }
        Ok(())
    }

    pub fn notify_update(&mut self, entry: &Entry<K, V>) -> Result<()> {
        for index in self.indexes.values_mut() {
            index.update(entry)?;
        }
        Ok(())
    }

    pub fn notify_remove(&mut self, entry: &Entry<K, V>) -> Result<()> {
        for index in self.indexes.values_mut() {
            index.remove(entry)?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "registry_test.rs"]
mod registry_test;
