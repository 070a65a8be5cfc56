//! Composable predicate algebra: leaf comparisons, boolean combinators,
//! and the `apply_index` cooperation protocol that lets a predicate
//! narrow a key-set using available `MapIndex`es before falling back to
//! entry-by-entry evaluation.

use std::collections::BTreeSet;

use crate::entry::Entry;
use crate::error::Result;
use crate::index::registry::IndexRegistry;

mod combinator;
mod leaf;
mod like;
mod limit;

pub use combinator::{All, Any, Not, Xor};
pub use leaf::{
    Between, Contains, ContainsAll, ContainsAny, Equals, Greater, GreaterEquals, In, InKeySet, Key, Less,
    LessEquals, NotEquals,
};
pub use like::Like;
pub use limit::{Limit, Page};

/// Flat per-entry evaluation cost used by the default, non-index-aware
/// effectiveness estimate.
pub const EVAL_COST: usize = 1000;

/// A predicate over entries of a `(K, V)` map.
///
/// Every filter can be evaluated directly (`evaluate`/`evaluate_entry`);
/// filters with an index-assisted fast path additionally narrow a key-set
/// via `apply_index` before any per-entry evaluation happens.
pub trait Filter<K, V>: Send + Sync {
    fn evaluate(&self, value: &V) -> bool;

    fn evaluate_entry(&self, entry: &Entry<K, V>) -> Result<bool> {
        Ok(entry.get_value().map(|v| self.evaluate(v)).unwrap_or(false))
    }

    /// Evaluate against an entry's pre-mutation snapshot. Used by
    /// `ConditionalIndex::remove` to decide whether a departing entry was
    /// ever admitted into the index.
    fn evaluate_original_entry(&self, entry: &Entry<K, V>) -> Result<bool> {
        Ok(entry.get_original_value().map(|v| self.evaluate(v)).unwrap_or(false))
    }

    /// Rough cost estimate used to order `All`/`Any` children cheapest
    /// first. Index-aware leaves override this with a cheap constant or a
    /// range-size estimate; the default assumes a full per-entry scan.
    fn effectiveness(&self, _indexes: &IndexRegistry<K, V>, keys: &BTreeSet<K>) -> usize {
        EVAL_COST.saturating_mul(keys.len().max(1))
    }

    /// Narrow `keys` in place using available indexes.
    ///
    /// Returns `Ok(None)` when the filter fully resolved membership: every
    /// key remaining in `keys` is known to match, and no further
    /// evaluation is needed. Returns `Ok(Some(residual))` when some keys
    /// could not be decided from indexes alone and must be evaluated
    /// entry-by-entry with `residual` (which may just be `self`, boxed,
    /// when the filter has no index-assisted path at all).
    fn apply_index(
        &self,
        _indexes: &IndexRegistry<K, V>,
        _keys: &mut BTreeSet<K>,
    ) -> Result<Option<Box<dyn Filter<K, V>>>>
    where
        K: Ord + Clone,
    {
        Ok(Some(self.box_clone()))
    }

    /// Boxed clone, needed because a `Box<dyn Filter<K, V>>` must be
    /// produced without requiring callers to know the concrete type (and
    /// trait objects can't derive `Clone`).
    fn box_clone(&self) -> Box<dyn Filter<K, V>>;
}

impl<K, V> Clone for Box<dyn Filter<K, V>> {
    fn clone(&self) -> Self {
        self.box_clone()
    }
}
