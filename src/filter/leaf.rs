//! Leaf predicates: extractor + literal (or literal set) comparisons.

use std::collections::BTreeSet;
use std::hash::Hash;
use std::sync::Arc;

use crate::entry::Entry;
use crate::error::Result;
use crate::extractor::{Extractor, ExtractorObj};
use crate::filter::Filter;
use crate::index::registry::IndexRegistry;

/// Looks up an extractor's index in `indexes` and downcasts it to the
/// concrete `SimpleMapIndex<K, V, T>` shape leaf filters need. Returns
/// `None` when no index is registered for this extractor, or when one is
/// registered under an incompatible `T` (a `TypeMismatch` situation that
/// callers handle by falling back to entry-by-entry evaluation rather
/// than erroring — `apply_index`'s contract never hard-fails on a missing
/// index).
///
/// Takes `name`/`target` rather than a `&dyn ExtractorObj` so callers can
/// pass `self.extractor.name()`/`.target()` straight off their own
/// `Arc<dyn Extractor<V, T>>` without upcasting that trait object to
/// `dyn ExtractorObj` (supertrait methods are callable directly on a
/// subtrait object; only *coercing the object's type itself* would need
/// upcasting, which this crate's targeted toolchain cannot rely on).
fn lookup<'a, K, V, T>(
    indexes: &'a IndexRegistry<K, V>,
    name: &str,
    target: crate::extractor::Target,
) -> Option<&'a crate::index::simple::SimpleMapIndex<K, V, T>>
where
    K: Ord + Clone + Hash + Send + Sync + 'static,
    V: Send + Sync + 'static,
    T: Hash + Eq + Clone + Send + Sync + 'static,
{
    let handle = crate::extractor::ExtractorHandle::new(name, target);
    indexes.get(&handle)?.as_any().downcast_ref()
}

/// `extractor(value) == literal`.
pub struct Equals<K, V, T> {
    pub extractor: Arc<dyn Extractor<V, T>>,
    pub literal: T,
    _marker: std::marker::PhantomData<fn(&K)>,
}

impl<K, V, T> Equals<K, V, T> {
    pub fn new(extractor: Arc<dyn Extractor<V, T>>, literal: T) -> Self {
        Equals { extractor, literal, _marker: std::marker::PhantomData }
    }
}

impl<K, V, T> Filter<K, V> for Equals<K, V, T>
where
    K: Ord + Clone + Hash + Send + Sync + 'static,
    V: Send + Sync + 'static,
    T: Hash + Eq + Clone + Send + Sync + 'static + PartialOrd,
{
    fn evaluate(&self, value: &V) -> bool {
        self.extractor.extract(value).map(|v| v == self.literal).unwrap_or(false)
    }

    fn effectiveness(&self, indexes: &IndexRegistry<K, V>, keys: &BTreeSet<K>) -> usize {
        match lookup::<K, V, T>(indexes, self.extractor.name(), self.extractor.target()) {
            Some(_) => 1,
            None => crate::filter::EVAL_COST.saturating_mul(keys.len().max(1)),
        }
    }

    fn apply_index(
        &self,
        indexes: &IndexRegistry<K, V>,
        keys: &mut BTreeSet<K>,
    ) -> Result<Option<Box<dyn Filter<K, V>>>>
    where
        K: Ord + Clone,
    {
        match lookup::<K, V, T>(indexes, self.extractor.name(), self.extractor.target()) {
            Some(idx) => {
                let matches = idx.contents().get(&self.literal).cloned().unwrap_or_default();
                keys.retain(|k| matches.contains(k));
                Ok(None)
            }
            None => Ok(Some(self.box_clone())),
        }
    }

    fn box_clone(&self) -> Box<dyn Filter<K, V>> {
        Box::new(Equals { extractor: self.extractor.clone(), literal: self.literal.clone(), _marker: std::marker::PhantomData })
    }
}

/// `extractor(value) != literal`.
pub struct NotEquals<K, V, T> {
    pub extractor: Arc<dyn Extractor<V, T>>,
    pub literal: T,
    _marker: std::marker::PhantomData<fn(&K)>,
}

impl<K, V, T> NotEquals<K, V, T> {
    pub fn new(extractor: Arc<dyn Extractor<V, T>>, literal: T) -> Self {
        NotEquals { extractor, literal, _marker: std::marker::PhantomData }
    }
}

impl<K, V, T> Filter<K, V> for NotEquals<K, V, T>
where
    K: Ord + Clone + Hash + Send + Sync + 'static,
    V: Send + Sync + 'static,
    T: Hash + Eq + Clone + Send + Sync + 'static + PartialOrd,
{
    fn evaluate(&self, value: &V) -> bool {
        self.extractor.extract(value).map(|v| v != self.literal).unwrap_or(false)
    }

    fn apply_index(
        &self,
        indexes: &IndexRegistry<K, V>,
        keys: &mut BTreeSet<K>,
    ) -> Result<Option<Box<dyn Filter<K, V>>>>
    where
        K: Ord + Clone,
    {
        match lookup::<K, V, T>(indexes, self.extractor.name(), self.extractor.target()) {
            Some(idx) if !idx.is_partial() => {
                let excluded = idx.contents().get(&self.literal).cloned().unwrap_or_default();
                keys.retain(|k| !excluded.contains(k));
                Ok(None)
            }
            _ => Ok(Some(self.box_clone())),
        }
    }

    fn box_clone(&self) -> Box<dyn Filter<K, V>> {
        Box::new(NotEquals { extractor: self.extractor.clone(), literal: self.literal.clone(), _marker: std::marker::PhantomData })
    }
}

/// Shared shape for the four ordered-range leaves below.
enum RangeKind {
    Greater,
    GreaterEquals,
    Less,
    LessEquals,
}

struct RangeLeaf<K, V, T> {
    extractor: Arc<dyn Extractor<V, T>>,
    bound: T,
    kind: RangeKind,
    _marker: std::marker::PhantomData<fn(&K)>,
}

impl<K, V, T> Filter<K, V> for RangeLeaf<K, V, T>
where
    K: Ord + Clone + Hash + Send + Sync + 'static,
    V: Send + Sync + 'static,
    T: Hash + Eq + Clone + Send + Sync + 'static + PartialOrd,
{
    fn evaluate(&self, value: &V) -> bool {
        let v = match self.extractor.extract(value) {
            Some(v) => v,
            None => return false,
        };
        match self.kind {
            RangeKind::Greater => v > self.bound,
            RangeKind::GreaterEquals => v >= self.bound,
            RangeKind::Less => v < self.bound,
            RangeKind::LessEquals => v <= self.bound,
        }
    }

    fn apply_index(
        &self,
        indexes: &IndexRegistry<K, V>,
        keys: &mut BTreeSet<K>,
    ) -> Result<Option<Box<dyn Filter<K, V>>>>
    where
        K: Ord + Clone,
    {
        let idx = match lookup::<K, V, T>(indexes, self.extractor.name(), self.extractor.target()) {
            Some(idx) if idx.is_ordered() && !idx.is_partial() => idx,
            _ => return Ok(Some(self.box_clone())),
        };
        let postings = match self.kind {
            RangeKind::Greater => idx.contents().tail(&self.bound, false),
            RangeKind::GreaterEquals => idx.contents().tail(&self.bound, true),
            RangeKind::Less => idx.contents().head(&self.bound, false),
            RangeKind::LessEquals => idx.contents().head(&self.bound, true),
        };
        let total_postings = idx.len();
        let matched: BTreeSet<K> = postings.into_iter().flatten().cloned().collect();
        // head-heavy optimization: if the matching side holds more than
        // half the index, it is cheaper to remove the complementary
        // (smaller) side than to retain the larger one.
        if matched.len() * 2 > total_postings.max(1) {
            let complement: BTreeSet<K> = idx
                .contents()
                .iter()
                .filter(|(v, _)| !matched_contains(&self.kind, &self.bound, v))
                .flat_map(|(_, s)| s.iter().cloned())
                .collect();
            keys.retain(|k| !complement.contains(k));
        } else {
            keys.retain(|k| matched.contains(k));
        }
        Ok(None)
    }

    fn box_clone(&self) -> Box<dyn Filter<K, V>> {
        Box::new(RangeLeaf {
            extractor: self.extractor.clone(),
            bound: self.bound.clone(),
            kind: match self.kind {
                RangeKind::Greater => RangeKind::Greater,
                RangeKind::GreaterEquals => RangeKind::GreaterEquals,
                RangeKind::Less => RangeKind::Less,
                RangeKind::LessEquals => RangeKind::LessEquals,
            },
            _marker: std::marker::PhantomData,
        })
    }
}

fn matched_contains<T: PartialOrd>(kind: &RangeKind, bound: &T, v: &T) -> bool {
    match kind {
        RangeKind::Greater => v > bound,
        RangeKind::GreaterEquals => v >= bound,
        RangeKind::Less => v < bound,
        RangeKind::LessEquals => v <= bound,
    }
}

macro_rules! range_wrapper {
    ($name:ident, $kind:expr) => {
        pub struct $name<K, V, T> {
            inner: RangeLeaf<K, V, T>,
        }

        impl<K, V, T> $name<K, V, T> {
            pub fn new(extractor: Arc<dyn Extractor<V, T>>, bound: T) -> Self {
                $name { inner: RangeLeaf { extractor, bound, kind: $kind, _marker: std::marker::PhantomData } }
            }
        }

        impl<K, V, T> Filter<K, V> for $name<K, V, T>
        where
            K: Ord + Clone + Hash + Send + Sync + 'static,
            V: Send + Sync + 'static,
            T: Hash + Eq + Clone + Send + Sync + 'static + PartialOrd,
        {
            fn evaluate(&self, value: &V) -> bool {
                self.inner.evaluate(value)
            }
            fn apply_index(
                &self,
                indexes: &IndexRegistry<K, V>,
                keys: &mut BTreeSet<K>,
            ) -> Result<Option<Box<dyn Filter<K, V>>>>
            where
                K: Ord + Clone,
            {
                self.inner.apply_index(indexes, keys)
            }
            fn box_clone(&self) -> Box<dyn Filter<K, V>> {
                Box::new($name { inner: RangeLeaf { extractor: self.inner.extractor.clone(), bound: self.inner.bound.clone(), kind: $kind, _marker: std::marker::PhantomData } })
            }
        }
    };
}

range_wrapper!(Greater, RangeKind::Greater);
range_wrapper!(GreaterEquals, RangeKind::GreaterEquals);
range_wrapper!(Less, RangeKind::Less);
range_wrapper!(LessEquals, RangeKind::LessEquals);

/// `lo (<=|<) extractor(value) (<=|<) hi`, composed internally as a
/// conjunction of the two ordered bounds above but able to collapse to a
/// single `subMap`-shaped range walk when an ordered index is available.
pub struct Between<K, V, T> {
    pub extractor: Arc<dyn Extractor<V, T>>,
    pub lo: T,
    pub lo_inclusive: bool,
    pub hi: T,
    pub hi_inclusive: bool,
    _marker: std::marker::PhantomData<fn(&K)>,
}

impl<K, V, T> Between<K, V, T> {
    pub fn new(extractor: Arc<dyn Extractor<V, T>>, lo: T, lo_inclusive: bool, hi: T, hi_inclusive: bool) -> Self {
        Between { extractor, lo, lo_inclusive, hi, hi_inclusive, _marker: std::marker::PhantomData }
    }
}

impl<K, V, T> Filter<K, V> for Between<K, V, T>
where
    K: Ord + Clone + Hash + Send + Sync + 'static,
    V: Send + Sync + 'static,
    T: Hash + Eq + Clone + Send + Sync + 'static + PartialOrd,
{
    fn evaluate(&self, value: &V) -> bool {
        let v = match self.extractor.extract(value) {
            Some(v) => v,
            None => return false,
        };
        let above_lo = if self.lo_inclusive { v >= self.lo } else { v > self.lo };
        let below_hi = if self.hi_inclusive { v <= self.hi } else { v < self.hi };
        above_lo && below_hi
    }

    fn apply_index(
        &self,
        indexes: &IndexRegistry<K, V>,
        keys: &mut BTreeSet<K>,
    ) -> Result<Option<Box<dyn Filter<K, V>>>>
    where
        K: Ord + Clone,
    {
        match lookup::<K, V, T>(indexes, self.extractor.name(), self.extractor.target()) {
            Some(idx) if idx.is_ordered() && !idx.is_partial() => {
                let matched: BTreeSet<K> = idx
                    .contents()
                    .range(&self.lo, self.lo_inclusive, &self.hi, self.hi_inclusive)
                    .into_iter()
                    .flatten()
                    .cloned()
                    .collect();
                keys.retain(|k| matched.contains(k));
                Ok(None)
            }
            _ => Ok(Some(self.box_clone())),
        }
    }

    fn box_clone(&self) -> Box<dyn Filter<K, V>> {
        Box::new(Between {
            extractor: self.extractor.clone(),
            lo: self.lo.clone(),
            lo_inclusive: self.lo_inclusive,
            hi: self.hi.clone(),
            hi_inclusive: self.hi_inclusive,
            _marker: std::marker::PhantomData,
        })
    }
}

/// `extractor(value) ∈ set`.
pub struct In<K, V, T> {
    pub extractor: Arc<dyn Extractor<V, T>>,
    pub set: BTreeSet<T>,
    _marker: std::marker::PhantomData<fn(&K)>,
}

impl<K, V, T: Ord> In<K, V, T> {
    pub fn new(extractor: Arc<dyn Extractor<V, T>>, set: impl IntoIterator<Item = T>) -> Self {
        In { extractor, set: set.into_iter().collect(), _marker: std::marker::PhantomData }
    }
}

impl<K, V, T> Filter<K, V> for In<K, V, T>
where
    K: Ord + Clone + Hash + Send + Sync + 'static,
    V: Send + Sync + 'static,
    T: Hash + Eq + Ord + Clone + Send + Sync + 'static,
{
    fn evaluate(&self, value: &V) -> bool {
        self.extractor.extract(value).map(|v| self.set.contains(&v)).unwrap_or(false)
    }

    fn apply_index(
        &self,
        indexes: &IndexRegistry<K, V>,
        keys: &mut BTreeSet<K>,
    ) -> Result<Option<Box<dyn Filter<K, V>>>>
    where
        K: Ord + Clone,
    {
        match lookup::<K, V, T>(indexes, self.extractor.name(), self.extractor.target()) {
            Some(idx) => {
                let matched: BTreeSet<K> =
                    self.set.iter().filter_map(|v| idx.contents().get(v)).flatten().cloned().collect();
                keys.retain(|k| matched.contains(k));
                Ok(None)
            }
            None => Ok(Some(self.box_clone())),
        }
    }

    fn box_clone(&self) -> Box<dyn Filter<K, V>> {
        Box::new(In { extractor: self.extractor.clone(), set: self.set.clone(), _marker: std::marker::PhantomData })
    }
}

/// `literal ∈ extractor(value)` for a collection-valued attribute.
pub struct Contains<K, V, T> {
    pub extractor: Arc<dyn Extractor<V, BTreeSet<T>>>,
    pub literal: T,
    _marker: std::marker::PhantomData<fn(&K)>,
}

impl<K, V, T> Contains<K, V, T> {
    pub fn new(extractor: Arc<dyn Extractor<V, BTreeSet<T>>>, literal: T) -> Self {
        Contains { extractor, literal, _marker: std::marker::PhantomData }
    }
}

impl<K, V, T> Filter<K, V> for Contains<K, V, T>
where
    K: Ord + Clone + Hash + Send + Sync + 'static,
    V: Send + Sync + 'static,
    T: Hash + Eq + Ord + Clone + Send + Sync + 'static,
{
    fn evaluate(&self, value: &V) -> bool {
        self.extractor.extract(value).map(|set| set.contains(&self.literal)).unwrap_or(false)
    }

    fn apply_index(
        &self,
        indexes: &IndexRegistry<K, V>,
        keys: &mut BTreeSet<K>,
    ) -> Result<Option<Box<dyn Filter<K, V>>>>
    where
        K: Ord + Clone,
    {
        match lookup::<K, V, T>(indexes, self.extractor.name(), self.extractor.target()) {
            Some(idx) => {
                let matched = idx.contents().get(&self.literal).cloned().unwrap_or_default();
                keys.retain(|k| matched.contains(k));
                Ok(None)
            }
            None => Ok(Some(self.box_clone())),
        }
    }

    fn box_clone(&self) -> Box<dyn Filter<K, V>> {
        Box::new(Contains { extractor: self.extractor.clone(), literal: self.literal.clone(), _marker: std::marker::PhantomData })
    }
}

/// `set ⊆ extractor(value)` for a collection-valued attribute.
pub struct ContainsAll<K, V, T> {
    pub extractor: Arc<dyn Extractor<V, BTreeSet<T>>>,
    pub set: BTreeSet<T>,
    _marker: std::marker::PhantomData<fn(&K)>,
}

impl<K, V, T: Ord> ContainsAll<K, V, T> {
    pub fn new(extractor: Arc<dyn Extractor<V, BTreeSet<T>>>, set: impl IntoIterator<Item = T>) -> Self {
        ContainsAll { extractor, set: set.into_iter().collect(), _marker: std::marker::PhantomData }
    }
}

impl<K, V, T> Filter<K, V> for ContainsAll<K, V, T>
where
    K: Ord + Clone + Hash + Send + Sync + 'static,
    V: Send + Sync + 'static,
    T: Hash + Eq + Ord + Clone + Send + Sync + 'static,
{
    fn evaluate(&self, value: &V) -> bool {
        self.extractor.extract(value).map(|set| self.set.is_subset(&set)).unwrap_or(false)
    }

    fn apply_index(
        &self,
        indexes: &IndexRegistry<K, V>,
        keys: &mut BTreeSet<K>,
    ) -> Result<Option<Box<dyn Filter<K, V>>>>
    where
        K: Ord + Clone,
    {
        match lookup::<K, V, T>(indexes, self.extractor.name(), self.extractor.target()) {
            Some(idx) => {
                if self.set.is_empty() {
                    return Ok(None);
                }
                let mut iter = self.set.iter();
                let first = iter.next().unwrap();
                let mut matched = idx.contents().get(first).cloned().unwrap_or_default();
                for v in iter {
                    let posting = idx.contents().get(v).cloned().unwrap_or_default();
                    matched = matched.intersection(&posting).cloned().collect();
                }
                keys.retain(|k| matched.contains(k));
                Ok(None)
            }
            None => Ok(Some(self.box_clone())),
        }
    }

    fn box_clone(&self) -> Box<dyn Filter<K, V>> {
        Box::new(ContainsAll { extractor: self.extractor.clone(), set: self.set.clone(), _marker: std::marker::PhantomData })
    }
}

/// `set ∩ extractor(value) ≠ ∅` for a collection-valued attribute.
pub struct ContainsAny<K, V, T> {
    pub extractor: Arc<dyn Extractor<V, BTreeSet<T>>>,
    pub set: BTreeSet<T>,
    _marker: std::marker::PhantomData<fn(&K)>,
}

impl<K, V, T: Ord> ContainsAny<K, V, T> {
    pub fn new(extractor: Arc<dyn Extractor<V, BTreeSet<T>>>, set: impl IntoIterator<Item = T>) -> Self {
        ContainsAny { extractor, set: set.into_iter().collect(), _marker: std::marker::PhantomData }
    }
}

impl<K, V, T> Filter<K, V> for ContainsAny<K, V, T>
where
    K: Ord + Clone + Hash + Send + Sync + 'static,
    V: Send + Sync + 'static,
    T: Hash + Eq + Ord + Clone + Send + Sync + 'static,
{
    fn evaluate(&self, value: &V) -> bool {
        self.extractor.extract(value).map(|set| !self.set.is_disjoint(&set)).unwrap_or(false)
    }

    fn apply_index(
        &self,
        indexes: &IndexRegistry<K, V>,
        keys: &mut BTreeSet<K>,
    ) -> Result<Option<Box<dyn Filter<K, V>>>>
    where
        K: Ord + Clone,
    {
        match lookup::<K, V, T>(indexes, self.extractor.name(), self.extractor.target()) {
            Some(idx) => {
                let matched: BTreeSet<K> =
                    self.set.iter().filter_map(|v| idx.contents().get(v)).flatten().cloned().collect();
                keys.retain(|k| matched.contains(k));
                Ok(None)
            }
            None => Ok(Some(self.box_clone())),
        }
    }

    fn box_clone(&self) -> Box<dyn Filter<K, V>> {
        Box::new(ContainsAny { extractor: self.extractor.clone(), set: self.set.clone(), _marker: std::marker::PhantomData })
    }
}

/// Retain only the given keys. Internal helper (not meant to be
/// constructed directly by library users); produced by combinators like
/// `Not::apply_index` to carry a pre-computed key set forward.
pub struct Key<K> {
    pub keys: BTreeSet<K>,
}

impl<K> Key<K> {
    pub fn new(keys: BTreeSet<K>) -> Self {
        Key { keys }
    }
}

impl<K, V> Filter<K, V> for Key<K>
where
    K: Ord + Clone + Send + Sync + 'static,
    V: Send + Sync + 'static,
{
    fn evaluate(&self, _value: &V) -> bool {
        // Key membership cannot be decided from the value alone; callers
        // always reach this filter through `evaluate_entry`/`apply_index`.
        false
    }

    fn evaluate_entry(&self, entry: &Entry<K, V>) -> Result<bool> {
        Ok(self.keys.contains(entry.get_key()))
    }

    fn apply_index(
        &self,
        _indexes: &IndexRegistry<K, V>,
        keys: &mut BTreeSet<K>,
    ) -> Result<Option<Box<dyn Filter<K, V>>>>
    where
        K: Ord + Clone,
    {
        keys.retain(|k| self.keys.contains(k));
        Ok(None)
    }

    fn box_clone(&self) -> Box<dyn Filter<K, V>> {
        Box::new(Key { keys: self.keys.clone() })
    }
}

/// Restrict to `keys`, then delegate to `inner`.
pub struct InKeySet<K, V> {
    pub inner: Box<dyn Filter<K, V>>,
    pub keys: BTreeSet<K>,
}

impl<K, V> InKeySet<K, V> {
    pub fn new(inner: Box<dyn Filter<K, V>>, keys: BTreeSet<K>) -> Self {
        InKeySet { inner, keys }
    }
}

impl<K, V> Filter<K, V> for InKeySet<K, V>
where
    K: Ord + Clone + Send + Sync + 'static,
    V: Send + Sync + 'static,
{
    fn evaluate(&self, value: &V) -> bool {
        self.inner.evaluate(value)
    }

    fn evaluate_entry(&self, entry: &Entry<K, V>) -> Result<bool> {
        if !self.keys.contains(entry.get_key()) {
            return Ok(false);
        }
        self.inner.evaluate_entry(entry)
    }

    fn apply_index(
        &self,
        indexes: &IndexRegistry<K, V>,
        keys: &mut BTreeSet<K>,
    ) -> Result<Option<Box<dyn Filter<K, V>>>>
    where
        K: Ord + Clone,
    {
        keys.retain(|k| self.keys.contains(k));
        self.inner.apply_index(indexes, keys)
    }

    fn box_clone(&self) -> Box<dyn Filter<K, V>> {
        Box::new(InKeySet { inner: self.inner.box_clone(), keys: self.keys.clone() })
    }
}

#[cfg(test)]
#[path = "leaf_test.rs"]
mod leaf_test;
