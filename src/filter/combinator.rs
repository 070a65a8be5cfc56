//! Boolean combinators over the leaf predicates in `filter::leaf`.

use std::collections::BTreeSet;
use std::hash::Hash;

use crate::entry::Entry;
use crate::error::Result;
use crate::filter::leaf::Key;
use crate::filter::Filter;
use crate::index::registry::IndexRegistry;

/// Conjunction of `filters`. `apply_index` orders children cheapest-first
/// (by `effectiveness`) and applies them in sequence, each one narrowing
/// the shared `keys` set that the next child sees; unresolved children
/// are collected into a residual `All`.
pub struct All<K, V> {
    pub filters: Vec<Box<dyn Filter<K, V>>>,
}

impl<K, V> All<K, V> {
    pub fn new(filters: Vec<Box<dyn Filter<K, V>>>) -> Self {
        All { filters }
    }

    pub fn and(left: Box<dyn Filter<K, V>>, right: Box<dyn Filter<K, V>>) -> Self {
        All { filters: vec![left, right] }
    }
}

impl<K, V> Filter<K, V> for All<K, V>
where
    K: Ord + Clone + Hash + Send + Sync + 'static,
    V: Send + Sync + 'static,
{
    fn evaluate(&self, value: &V) -> bool {
        self.filters.iter().all(|f| f.evaluate(value))
    }

    fn evaluate_entry(&self, entry: &Entry<K, V>) -> Result<bool> {
        for f in &self.filters {
            if !f.evaluate_entry(entry)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn effectiveness(&self, indexes: &IndexRegistry<K, V>, keys: &BTreeSet<K>) -> usize {
        self.filters.iter().map(|f| f.effectiveness(indexes, keys)).min().unwrap_or(crate::filter::EVAL_COST)
    }

    fn apply_index(
        &self,
        indexes: &IndexRegistry<K, V>,
        keys: &mut BTreeSet<K>,
    ) -> Result<Option<Box<dyn Filter<K, V>>>>
    where
        K: Ord + Clone,
    {
        let mut order: Vec<&Box<dyn Filter<K, V>>> = self.filters.iter().collect();
        order.sort_by_key(|f| f.effectiveness(indexes, keys));

        let mut residuals: Vec<Box<dyn Filter<K, V>>> = Vec::new();
        for f in order {
            if keys.is_empty() {
                break;
            }
            if let Some(residual) = f.apply_index(indexes, keys)? {
                residuals.push(residual);
            }
        }

        match residuals.len() {
            0 => Ok(None),
            1 => Ok(Some(residuals.into_iter().next().unwrap())),
            _ => Ok(Some(Box::new(All { filters: residuals }))),
        }
    }

    fn box_clone(&self) -> Box<dyn Filter<K, V>> {
        Box::new(All { filters: self.filters.iter().map(|f| f.box_clone()).collect() })
    }
}

/// Disjunction of `filters`. Each child is applied against an independent
/// copy of the incoming key-set; a child that fully resolves contributes
/// its survivors directly, one that doesn't contributes a residual scoped
/// to the keys it couldn't decide.
pub struct Any<K, V> {
    pub filters: Vec<Box<dyn Filter<K, V>>>,
}

impl<K, V> Any<K, V> {
    pub fn new(filters: Vec<Box<dyn Filter<K, V>>>) -> Self {
        Any { filters }
    }

    pub fn or(left: Box<dyn Filter<K, V>>, right: Box<dyn Filter<K, V>>) -> Self {
        Any { filters: vec![left, right] }
    }
}

impl<K, V> Filter<K, V> for Any<K, V>
where
    K: Ord + Clone + Hash + Send + Sync + 'static,
    V: Send + Sync + 'static,
{
    fn evaluate(&self, value: &V) -> bool {
        self.filters.iter().any(|f| f.evaluate(value))
    }

    fn evaluate_entry(&self, entry: &Entry<K, V>) -> Result<bool> {
        for f in &self.filters {
            if f.evaluate_entry(entry)? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn effectiveness(&self, indexes: &IndexRegistry<K, V>, keys: &BTreeSet<K>) -> usize {
        // Or must consider every child, so it's only as cheap as the
        // single most expensive one.
        self.filters.iter().map(|f| f.effectiveness(indexes, keys)).max().unwrap_or(crate::filter::EVAL_COST)
    }

    fn apply_index(
        &self,
        indexes: &IndexRegistry<K, V>,
        keys: &mut BTreeSet<K>,
    ) -> Result<Option<Box<dyn Filter<K, V>>>>
    where
        K: Ord + Clone,
    {
        let mut matched: BTreeSet<K> = BTreeSet::new();
        let mut residuals: Vec<Box<dyn Filter<K, V>>> = Vec::new();

        for f in &self.filters {
            let mut candidates = keys.clone();
            match f.apply_index(indexes, &mut candidates)? {
                None => matched.extend(candidates),
                Some(residual) => residuals.push(residual),
            }
        }

        if residuals.is_empty() {
            keys.retain(|k| matched.contains(k));
            return Ok(None);
        }

        // Keys some child already proved a match for bypass residual
        // evaluation entirely via a pass-through `Key` disjunct; the
        // remaining children still need an entry-by-entry OR.
        residuals.push(Box::new(Key::new(matched)));
        Ok(Some(Box::new(Any { filters: residuals })))
    }

    fn box_clone(&self) -> Box<dyn Filter<K, V>> {
        Box::new(Any { filters: self.filters.iter().map(|f| f.box_clone()).collect() })
    }
}

/// Complement of `inner`.
pub struct Not<K, V> {
    pub inner: Box<dyn Filter<K, V>>,
}

impl<K, V> Not<K, V> {
    pub fn new(inner: Box<dyn Filter<K, V>>) -> Self {
        Not { inner }
    }
}

impl<K, V> Filter<K, V> for Not<K, V>
where
    K: Ord + Clone + Hash + Send + Sync + 'static,
    V: Send + Sync + 'static,
{
    fn evaluate(&self, value: &V) -> bool {
        !self.inner.evaluate(value)
    }

    fn evaluate_entry(&self, entry: &Entry<K, V>) -> Result<bool> {
        Ok(!self.inner.evaluate_entry(entry)?)
    }

    fn apply_index(
        &self,
        indexes: &IndexRegistry<K, V>,
        keys: &mut BTreeSet<K>,
    ) -> Result<Option<Box<dyn Filter<K, V>>>>
    where
        K: Ord + Clone,
    {
        // A partial index cannot prove a key fails `inner`: its absence
        // from a posting may be an exclusion artifact rather than a
        // genuine predicate miss. Restrict `inner` to a throwaway copy of
        // `keys` so a full resolution only ever removes keys we can trust.
        let original: BTreeSet<K> = keys.clone();
        let mut remaining = original.clone();
        match self.inner.apply_index(indexes, &mut remaining)? {
            None => {
                // `remaining` holds exactly the keys that matched `inner`;
                // the complement is the answer.
                keys.retain(|k| !remaining.contains(k));
                Ok(None)
            }
            Some(residual) => {
                // `removed_by_inner` keys are ones `inner` already proved
                // fail, so `Not(inner)` holds for them unconditionally —
                // they must survive into `keys` rather than be dropped.
                // `remaining` keys are still undecided and need
                // `Not(residual)` evaluated per-entry. Compose the two as
                // a disjunction, with `Key(removed_by_inner)` bypassing
                // the residual entirely for the already-confirmed group
                // (an `All`/AND would wrongly re-subject them to it).
                let removed_by_inner: BTreeSet<K> =
                    original.iter().filter(|k| !remaining.contains(*k)).cloned().collect();
                Ok(Some(Box::new(Any {
                    filters: vec![Box::new(Key::new(removed_by_inner)), Box::new(Not { inner: residual })],
                })))
            }
        }
    }

    fn box_clone(&self) -> Box<dyn Filter<K, V>> {
        Box::new(Not { inner: self.inner.box_clone() })
    }
}

/// Exclusive-or of two filters, evaluated per-entry only.
pub struct Xor<K, V> {
    pub left: Box<dyn Filter<K, V>>,
    pub right: Box<dyn Filter<K, V>>,
}

impl<K, V> Xor<K, V> {
    pub fn new(left: Box<dyn Filter<K, V>>, right: Box<dyn Filter<K, V>>) -> Self {
        Xor { left, right }
    }
}

impl<K, V> Filter<K, V> for Xor<K, V>
where
    K: Ord + Clone + Hash + Send + Sync + 'static,
    V: Send + Sync + 'static,
{
    fn evaluate(&self, value: &V) -> bool {
        self.left.evaluate(value) != self.right.evaluate(value)
    }

    fn evaluate_entry(&self, entry: &Entry<K, V>) -> Result<bool> {
        Ok(self.left.evaluate_entry(entry)? != self.right.evaluate_entry(entry)?)
    }

    fn effectiveness(&self, _indexes: &IndexRegistry<K, V>, _keys: &BTreeSet<K>) -> usize {
        usize::MAX
    }

    fn box_clone(&self) -> Box<dyn Filter<K, V>> {
        Box::new(Xor { left: self.left.box_clone(), right: self.right.box_clone() })
    }
}

#[cfg(test)]
#[path = "combinator_test.rs"]
mod combinator_test;
