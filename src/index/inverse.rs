//! The value -> key-set side of a `MapIndex`.

use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use crate::comparator::Comparator;

/// `extracted value -> set<key>`, in either a comparator-ordered or a
/// hashed representation.
///
/// The ordered variant cannot be `std::collections::BTreeMap` because its
/// ordering is injected at runtime via a [`Comparator`] trait object
/// rather than fixed per-type by `Ord`; it is instead a comparator-sorted
/// `Vec` searched with `binary_search_by`, the same "write the sorted
/// container by hand" approach this crate's storage engines take for
/// their own on-disk and in-memory trees.
pub enum Inverse<T, K>
where
    K: Ord,
{
    Ordered { comparator: Arc<dyn Comparator<T>>, entries: Vec<(T, BTreeSet<K>)> },
    Hashed { table: HashMap<T, BTreeSet<K>> },
}

impl<T, K> Inverse<T, K>
where
    K: Ord + Clone,
{
    pub fn ordered(comparator: Arc<dyn Comparator<T>>) -> Self {
        Inverse::Ordered { comparator, entries: Vec::new() }
    }

    pub fn hashed() -> Self {
        Inverse::Hashed { table: HashMap::new() }
    }

    pub fn is_ordered(&self) -> bool {
        matches!(self, Inverse::Ordered { .. })
    }

    pub fn len(&self) -> usize {
        match self {
            Inverse::Ordered { entries, .. } => entries.len(),
            Inverse::Hashed { table } => table.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Lookup the posting set for an exact value.
    pub fn get(&self, value: &T) -> Option<&BTreeSet<K>>
    where
        T: std::hash::Hash + Eq,
    {
        match self {
            Inverse::Ordered { comparator, entries } => entries
                .binary_search_by(|(v, _)| comparator.compare(v, value))
                .ok()
                .map(|i| &entries[i].1),
            Inverse::Hashed { table } => table.get(value),
        }
    }

    /// Insert `key` under `value`, reusing the stored value reference when
    /// an equal one already exists (memory-sharing optimization mirrored
    /// from the upstream index design).
    pub fn add(&mut self, value: T, key: K)
    where
        T: std::hash::Hash + Eq,
    {
        match self {
            Inverse::Ordered { comparator, entries } => {
                match entries.binary_search_by(|(v, _)| comparator.compare(v, &value)) {
                    Ok(i) => {
                        entries[i].1.insert(key);
                    }
                    Err(i) => {
                        let mut set = BTreeSet::new();
                        set.insert(key);
                        entries.insert(i, (value, set));
                    }
                }
            }
            Inverse::Hashed { table } => {
                table.entry(value).or_insert_with(BTreeSet::new).insert(key);
            }
        }
    }

    /// Remove `key` from `value`'s posting; drops the posting entirely
    /// when it becomes empty. Returns `false` if the posting (or the key
    /// within it) was not found.
    pub fn discard(&mut self, value: &T, key: &K) -> bool
    where
        T: std::hash::Hash + Eq,
    {
        match self {
            Inverse::Ordered { comparator, entries } => {
                match entries.binary_search_by(|(v, _)| comparator.compare(v, value)) {
                    Ok(i) => {
                        let present = entries[i].1.remove(key);
                        if entries[i].1.is_empty() {
                            entries.remove(i);
                        }
                        present
                    }
                    Err(_) => false,
                }
            }
            Inverse::Hashed { table } => {
                let (present, empty) = match table.get_mut(value) {
                    Some(set) => (set.remove(key), set.is_empty()),
                    None => (false, false),
                };
                if empty {
                    table.remove(value);
                }
                present
            }
        }
    }

    /// All postings whose value is `< bound` (or `<= bound` when
    /// `inclusive`). Requires the ordered variant; returns empty for the
    /// hashed variant (callers check `is_ordered` first).
    pub fn head(&self, bound: &T, inclusive: bool) -> Vec<&BTreeSet<K>> {
        match self {
            Inverse::Ordered { comparator, entries } => entries
                .iter()
                .take_while(|(v, _)| {
                    let ord = comparator.compare(v, bound);
                    ord == Ordering::Less || (inclusive && ord == Ordering::Equal)
                })
                .map(|(_, s)| s)
                .collect(),
            Inverse::Hashed { .. } => Vec::new(),
        }
    }

    /// All postings whose value is `> bound` (or `>= bound` when
    /// `inclusive`). Requires the ordered variant.
    pub fn tail(&self, bound: &T, inclusive: bool) -> Vec<&BTreeSet<K>> {
        match self {
            Inverse::Ordered { comparator, entries } => entries
                .iter()
                .skip_while(|(v, _)| {
                    let ord = comparator.compare(v, bound);
                    ord == Ordering::Less || (!inclusive && ord == Ordering::Equal)
                })
                .map(|(_, s)| s)
                .collect(),
            Inverse::Hashed { .. } => Vec::new(),
        }
    }

    /// All postings with `lo (<=|<) value (<=|<) hi`. Requires the ordered
    /// variant.
    pub fn range(&self, lo: &T, lo_inclusive: bool, hi: &T, hi_inclusive: bool) -> Vec<&BTreeSet<K>> {
        match self {
            Inverse::Ordered { comparator, entries } => entries
                .iter()
                .filter(|(v, _)| {
                    let above_lo = match comparator.compare(v, lo) {
                        Ordering::Greater => true,
                        Ordering::Equal => lo_inclusive,
                        Ordering::Less => false,
                    };
                    let below_hi = match comparator.compare(v, hi) {
                        Ordering::Less => true,
                        Ordering::Equal => hi_inclusive,
                        Ordering::Greater => false,
                    };
                    above_lo && below_hi
                })
                .map(|(_, s)| s)
                .collect(),
            Inverse::Hashed { .. } => Vec::new(),
        }
    }

    /// Iterate all postings, regardless of representation — the fallback
    /// path for filters that must scan an unordered index.
    pub fn iter(&self) -> Box<dyn Iterator<Item = (&T, &BTreeSet<K>)> + '_> {
        match self {
            Inverse::Ordered { entries, .. } => Box::new(entries.iter().map(|(v, s)| (v, s))),
            Inverse::Hashed { table } => Box::new(table.iter()),
        }
    }
}

#[cfg(test)]
#[path = "inverse_test.rs"]
mod inverse_test;
