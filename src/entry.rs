//! The unit evaluated by filters and threaded through index maintenance.

use crate::{err_at, error::Result, extractor::Extractor};

/// Applies a targeted mutation to an entry's value in place, given some
/// caller-supplied `new` payload (e.g. "set this sub-field to `new`").
/// Mirrors Coherence's `InvocableMap.ValueUpdater`, adapted so the
/// mutation writes directly into the entry's value rather than
/// constructing and returning a whole replacement.
pub trait ValueUpdater<V, U>: Send + Sync {
    fn update(&self, value: &mut V, new: U);
}

/// A value slot that may hold a live value or record a tombstone; distinct
/// from `Option<V>` because a `None` in `Entry::original` means "no
/// snapshot was captured", not "value was absent".
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Slot<V> {
    Present(V),
    Deleted,
}

impl<V> Slot<V> {
    pub fn as_ref(&self) -> Option<&V> {
        match self {
            Slot::Present(v) => Some(v),
            Slot::Deleted => None,
        }
    }
}

/// `(key, value, original_value?)` — evaluated by filters, mutated by
/// triggers, and fed to index maintenance on insert/update/remove.
///
/// `original` is populated only while evaluating a mutation (the
/// pre-commit snapshot used by `ConditionalIndex::remove` and by
/// `SimpleMapIndex::update`'s old-value lookup); plain entries read from a
/// map carry `original: None`.
#[derive(Clone, Debug)]
pub struct Entry<K, V> {
    key: K,
    value: Slot<V>,
    original: Option<Slot<V>>,
    removable: bool,
}

impl<K, V> Entry<K, V> {
    pub fn new(key: K, value: V) -> Self {
        Entry { key, value: Slot::Present(value), original: None, removable: true }
    }

    pub fn deleted(key: K) -> Self {
        Entry { key, value: Slot::Deleted, original: None, removable: true }
    }

    /// An entry view backed by an immutable snapshot: `remove` fails with
    /// `NotSupported` rather than mutating a slot nobody can commit.
    pub fn immutable(key: K, value: V) -> Self {
        Entry { key, value: Slot::Present(value), original: None, removable: false }
    }

    pub fn with_original(mut self, original: V) -> Self {
        self.original = Some(Slot::Present(original));
        self
    }

    pub fn get_key(&self) -> &K {
        &self.key
    }

    pub fn get_value(&self) -> Option<&V> {
        self.value.as_ref()
    }

    pub fn is_present(&self) -> bool {
        matches!(self.value, Slot::Present(_))
    }

    pub fn is_original_present(&self) -> bool {
        matches!(self.original, Some(Slot::Present(_)))
    }

    pub fn get_original_value(&self) -> Option<&V> {
        self.original.as_ref().and_then(Slot::as_ref)
    }

    pub fn set_value(&mut self, value: V) {
        self.set_value_synthetic(value, false)
    }

    pub fn set_value_synthetic(&mut self, value: V, synthetic: bool) {
        if self.original.is_none() {
            self.original = Some(std::mem::replace(&mut self.value, Slot::Deleted));
        }
        self.value = Slot::Present(value);
        let _ = synthetic; // advisory only: backing store decides side-effect skipping
    }

    /// Apply `updater` to this entry's current value with `new`,
    /// capturing the pre-mutation value the same way `set_value` does.
    /// Fails with `NotSupported` on an immutable entry view or a deleted
    /// entry (there is no value to update in place).
    pub fn update<U>(&mut self, updater: &dyn ValueUpdater<V, U>, new: U) -> Result<()>
    where
        V: Clone,
    {
        if !self.removable {
            return err_at!(NotSupported, msg: "update is not supported on an immutable entry view");
        }
        match &mut self.value {
            Slot::Present(v) => {
                if self.original.is_none() {
                    self.original = Some(Slot::Present(v.clone()));
                }
                updater.update(v, new);
                Ok(())
            }
            Slot::Deleted => err_at!(NotSupported, msg: "update is not supported on a deleted entry"),
        }
    }

    /// Mark this entry for removal. Fails with `NotSupported` when the
    /// entry is a view over an immutable snapshot.
    pub fn remove(&mut self, synthetic: bool) -> Result<()> {
        if !self.removable {
            return err_at!(NotSupported, msg: "remove is not supported on an immutable entry view");
        }
        if self.original.is_none() {
            self.original = Some(std::mem::replace(&mut self.value, Slot::Deleted));
        } else {
            self.value = Slot::Deleted;
        }
        let _ = synthetic;
        Ok(())
    }

    /// Apply a value-targeted extractor to this entry's current value.
    /// Returns `None` both when the value is absent and when the
    /// extractor declares `Target::Key` (callers that don't already know
    /// an extractor's target should check it first).
    pub fn extract<T>(&self, extractor: &dyn Extractor<V, T>) -> Option<T> {
        match extractor.target() {
            crate::extractor::Target::Value => self.get_value().and_then(|v| extractor.extract(v)),
            crate::extractor::Target::Key => None,
        }
    }

    /// Apply a key-targeted extractor to this entry's key.
    pub fn extract_key<T>(&self, extractor: &dyn Extractor<K, T>) -> Option<T> {
        match extractor.target() {
            crate::extractor::Target::Key => extractor.extract(&self.key),
            crate::extractor::Target::Value => None,
        }
    }

    /// Apply a value-targeted extractor to this entry's original (pre-
    /// mutation) value, if one was captured.
    pub fn extract_original<T>(&self, extractor: &dyn Extractor<V, T>) -> Option<T> {
        match extractor.target() {
            crate::extractor::Target::Value => self.get_original_value().and_then(|v| extractor.extract(v)),
            crate::extractor::Target::Key => None,
        }
    }
}

#[cfg(test)]
#[path = "entry_test.rs"]
mod entry_test;
