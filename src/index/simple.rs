//! Maintains a forward (optional) and inverse index for one extractor.

use std::any::Any;
use std::collections::{HashMap, HashSet};
use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;

use crate::comparator::{Comparator, NaturalOrder};
use crate::entry::Entry;
use crate::error::Result;
use crate::extractor::{Extractor, ExtractorObj};
use crate::index::inverse::Inverse;
use crate::index::registry::MapIndex;
use crate::log_throttle::LogThrottle;

/// Whether an extracted collection value is exploded into one posting per
/// element ("split") or indexed once as a single composite attribute.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Multiplicity {
    Split,
    Composite,
}

/// Construction-time configuration snapshot for a [`SimpleMapIndex`],
/// playing the role a `toml`-loaded config struct plays for on-disk
/// components elsewhere in this crate: there is no file to load here, so
/// the idiomatic analogue is a plain struct validated once at
/// construction.
pub struct IndexConfig<T> {
    pub ordered: bool,
    pub comparator: Option<Arc<dyn Comparator<T>>>,
    pub forward_index: bool,
    pub multiplicity: Multiplicity,
}

impl<T: Ord + 'static> Default for IndexConfig<T> {
    fn default() -> Self {
        IndexConfig {
            ordered: false,
            comparator: None,
            forward_index: true,
            multiplicity: Multiplicity::Split,
        }
    }
}

/// One value extracted from an entry, exploded (if a collection and
/// `Multiplicity::Split`) into the one-or-more postings it was filed
/// under. Tracked per key so `update`/`remove` can retract exactly the
/// postings `insert` created.
type PostedValues<T> = Vec<T>;

/// How a `SimpleMapIndex` gets its postings out of an entry's value: a
/// scalar extractor files one posting per key, a collection (split)
/// extractor files one posting per element — the mechanism behind
/// `Contains`/`ContainsAll`/`ContainsAny`'s per-element index lookups.
enum ExtractKind<V, T> {
    Scalar(Arc<dyn Extractor<V, T>>),
    Split(Arc<dyn Extractor<V, std::collections::BTreeSet<T>>>),
}

impl<V, T> ExtractKind<V, T> {
    fn extract(&self, value: &V) -> Option<PostedValues<T>> {
        match self {
            ExtractKind::Scalar(e) => e.extract(value).map(|v| vec![v]),
            ExtractKind::Split(e) => e.extract(value).map(|set| set.into_iter().collect()),
        }
    }

    fn identity(&self) -> crate::extractor::ExtractorHandle {
        // `.of(e.as_ref())` would need upcasting `&dyn Extractor<..>` to
        // `&dyn ExtractorObj`; calling the supertrait methods directly
        // needs no such coercion.
        match self {
            ExtractKind::Scalar(e) => crate::extractor::ExtractorHandle::new(e.name(), e.target()),
            ExtractKind::Split(e) => crate::extractor::ExtractorHandle::new(e.name(), e.target()),
        }
    }
}

/// Maintains a forward index (`key -> extracted`, optional) and inverse
/// index (`extracted -> set<key>`, required) for a single extractor.
///
/// `Multiplicity::Split` fans a collection-valued extraction out into one
/// posting per element (constructed via [`SimpleMapIndex::new_split`]);
/// `Composite` indexes the collection itself as one opaque `T` (the
/// ordinary [`SimpleMapIndex::new`] path, with `T` instantiated to the
/// collection type).
pub struct SimpleMapIndex<K, V, T>
where
    K: Ord + Clone + Hash,
    T: Hash + Eq + Clone,
{
    extractor: ExtractKind<V, T>,
    forward: Option<HashMap<K, PostedValues<T>>>,
    inverse: Inverse<T, K>,
    excluded: HashSet<K>,
    multiplicity: Multiplicity,
    throttle: LogThrottle,
}

/// Sentinel distinguishing "no forward index configured" from "key absent
/// from the forward index" (both surface as `None` from `get`, but the
/// upstream design gives them distinct named outcomes).
pub enum ForwardLookup<'a, T> {
    NoValue,
    Value(&'a T),
}

impl<K, V, T> SimpleMapIndex<K, V, T>
where
    K: Ord + Clone + Hash,
    T: Hash + Eq + Clone,
{
    pub fn new(extractor: Arc<dyn Extractor<V, T>>, config: IndexConfig<T>) -> Self {
        Self::with_kind(ExtractKind::Scalar(extractor), config)
    }

    /// Builds an index over a collection-valued extractor, filing one
    /// posting per element (`Multiplicity::Split`) so `Contains`,
    /// `ContainsAll` and `ContainsAny` can intersect/union per-element
    /// postings directly instead of scanning whole collections.
    pub fn new_split(extractor: Arc<dyn Extractor<V, std::collections::BTreeSet<T>>>, config: IndexConfig<T>) -> Self {
        Self::with_kind(ExtractKind::Split(extractor), config)
    }

    fn with_kind(extractor: ExtractKind<V, T>, config: IndexConfig<T>) -> Self {
        let inverse = if config.ordered {
            let comparator = config.comparator.unwrap_or_else(|| {
                Arc::new(NaturalOrderAdapter::default()) as Arc<dyn Comparator<T>>
            });
            Inverse::ordered(comparator)
        } else {
            Inverse::hashed()
        };
        SimpleMapIndex {
            extractor,
            forward: if config.forward_index { Some(HashMap::new()) } else { None },
            inverse,
            excluded: HashSet::new(),
            multiplicity: config.multiplicity,
            throttle: LogThrottle::new(Duration::from_secs(10)),
        }
    }

    pub fn contents(&self) -> &Inverse<T, K> {
        &self.inverse
    }

    pub fn get(&self, key: &K) -> ForwardLookup<T> {
        match &self.forward {
            None => ForwardLookup::NoValue,
            Some(fwd) => match fwd.get(key).and_then(|vs| vs.first()) {
                Some(v) => ForwardLookup::Value(v),
                None => ForwardLookup::NoValue,
            },
        }
    }

    /// This index's extractor identity, usable as an `IndexRegistry` key
    /// regardless of whether it was built scalar or split.
    pub fn extractor_handle(&self) -> crate::extractor::ExtractorHandle {
        self.extractor.identity()
    }

    fn extracted_values(&self, value: &V) -> Option<PostedValues<T>> {
        match self.multiplicity {
            Multiplicity::Split => self.extractor.extract(value),
            Multiplicity::Composite => self.extractor.extract(value).map(|mut vs| {
                vs.truncate(1);
                vs
            }),
        }
    }

    fn insert_values(&mut self, key: &K, values: PostedValues<T>) {
        for v in values.iter() {
            self.inverse.add(v.clone(), key.clone());
        }
        if let Some(fwd) = self.forward.as_mut() {
            fwd.insert(key.clone(), values);
        }
        self.excluded.remove(key);
    }

    fn remove_values(&mut self, key: &K, values: &[T]) {
        for v in values {
            if !self.inverse.discard(v, key) {
                self.throttle.fire(
                    "gridquery::index",
                    &format!("missing posting while removing key from index"),
                );
            }
        }
        if let Some(fwd) = self.forward.as_mut() {
            fwd.remove(key);
        }
    }

    fn forward_values(&self, key: &K) -> Option<PostedValues<T>> {
        self.forward.as_ref().and_then(|fwd| fwd.get(key).cloned())
    }

    /// Remove `key` from every posting that might hold it — the fallback
    /// used by `update` when neither a forward index nor an original
    /// value is available to pinpoint which posting to retract from.
    /// Documented performance cliff: this is an O(index size) scan.
    fn remove_from_all_postings(&mut self, key: &K) {
        let stale: Vec<T> = self
            .inverse
            .iter()
            .filter(|(_, keys)| keys.contains(key))
            .map(|(v, _)| v.clone())
            .collect();
        for v in stale {
            self.inverse.discard(&v, key);
        }
    }
}

impl<K, V, T> MapIndex<K, V> for SimpleMapIndex<K, V, T>
where
    K: Ord + Clone + Hash + Send + Sync + 'static,
    V: Send + Sync + 'static,
    T: Hash + Eq + Clone + Send + Sync + 'static,
{
    fn insert(&mut self, entry: &Entry<K, V>) -> Result<()> {
        match entry.get_value() {
            None => Ok(()),
            Some(value) => match self.extracted_values(value) {
                Some(values) => {
                    self.insert_values(entry.get_key(), values);
                    Ok(())
                }
                None => {
                    self.excluded.insert(entry.get_key().clone());
                    Ok(())
                }
            },
        }
    }

    fn update(&mut self, entry: &Entry<K, V>) -> Result<()> {
        let key = entry.get_key().clone();
        let old_values = if let Some(values) = self.forward_values(&key) {
            Some(values)
        } else if let Some(original) = entry.get_original_value() {
            self.extracted_values(original)
        } else {
            None
        };

        let new_values = match entry.get_value() {
            Some(v) => self.extracted_values(v),
            None => None,
        };

        match (old_values, new_values) {
            (Some(old), Some(new)) if old == new => Ok(()),
            (Some(old), new) => {
                self.remove_values(&key, &old);
                self.excluded.remove(&key);
                if let Some(new) = new {
                    self.insert_values(&key, new);
                } else {
                    self.excluded.insert(key);
                }
                Ok(())
            }
            (None, new) => {
                // no pinpointed old posting: scan defensively, then add
                // the new one if any (documented performance cliff).
                self.remove_from_all_postings(&key);
                if let Some(fwd) = self.forward.as_mut() {
                    fwd.remove(&key);
                }
                match new {
                    Some(new) => self.insert_values(&key, new),
                    None => {
                        self.excluded.insert(key);
                    }
                }
                Ok(())
            }
        }
    }

    fn remove(&mut self, entry: &Entry<K, V>) -> Result<()> {
        let key = entry.get_key().clone();
        let values = self
            .forward_values(&key)
            .or_else(|| entry.get_value().and_then(|v| self.extracted_values(v)))
            .or_else(|| entry.get_original_value().and_then(|v| self.extracted_values(v)));

        match values {
            Some(values) => self.remove_values(&key, &values),
            None => self.remove_from_all_postings(&key),
        }
        self.excluded.remove(&key);
        Ok(())
    }

    fn is_partial(&self) -> bool {
        !self.excluded.is_empty()
    }

    fn is_ordered(&self) -> bool {
        self.inverse.is_ordered()
    }

    fn len(&self) -> usize {
        self.inverse.len()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Adapts `T: Ord` into a [`Comparator<T>`] object, used when the index is
/// ordered but the caller didn't supply an explicit comparator.
struct NaturalOrderAdapter<T>(std::marker::PhantomData<fn(&T)>);

impl<T> Default for NaturalOrderAdapter<T> {
    fn default() -> Self {
        NaturalOrderAdapter(std::marker::PhantomData)
    }
}

impl<T: Ord + Send + Sync> Comparator<T> for NaturalOrderAdapter<T> {
    fn compare(&self, a: &T, b: &T) -> std::cmp::Ordering {
        NaturalOrder.compare(a, b)
    }
}

#[cfg(test)]
#[path = "simple_test.rs"]
mod simple_test;
