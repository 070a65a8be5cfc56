//! Paging wrapper: a `Filter` decorator that narrows an already-decided
//! key/entry set down to one page, with an anchor-based fast path for
//! forward/backward paging over a sorted result.

use std::collections::BTreeSet;
use std::hash::Hash;

use crate::error::{Error, Result};
use crate::filter::Filter;
use crate::index::registry::IndexRegistry;

/// Which direction the caller is paging relative to the page it last saw.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Anchor<V> {
    /// No prior page observed, or the caller jumped to a non-adjacent
    /// page: positioning must fall back to an offset walk from the start.
    None,
    /// Paging forward: last value of the previous page.
    Top(V),
    /// Paging backward: first value of the page after the one being
    /// returned to.
    Bottom(V),
}

/// Paging state for one `Limit` filter instance. Mutated as pages are
/// requested; `Limit` itself stays `Send + Sync` by keeping this behind
/// an internal mutex-free, single-owner design — callers drive paging
/// sequentially against one query session, mirroring the teacher's
/// single-threaded-per-query contract (see the concurrency model).
pub struct Page<V> {
    page: usize,
    size: usize,
    anchor: Anchor<V>,
}

impl<V: Clone + PartialOrd> Page<V> {
    pub fn new(size: usize) -> Self {
        Page { page: 0, size, anchor: Anchor::None }
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Advance to the next page, recording `bottom` (the last value of
    /// the page just produced) as the top anchor for the next slice.
    pub fn advance(&mut self, bottom: V) {
        self.page += 1;
        self.anchor = Anchor::Top(bottom);
    }

    /// Step back to the previous page, recording `top` (the first value
    /// of the page just left) as the bottom anchor.
    pub fn retreat(&mut self, top: V) {
        if self.page > 0 {
            self.page -= 1;
        }
        self.anchor = Anchor::Bottom(top);
    }

    /// Jump to an arbitrary page. Adjacent pages keep no anchor (so the
    /// binary-search fast path is unavailable on the next call); a jump
    /// straight back to the current page is a no-op.
    pub fn set(&mut self, page: usize) {
        if page == self.page {
            return;
        }
        self.page = page;
        self.anchor = Anchor::None;
    }

    /// Compute this page's `[start, end)` range over `sorted`, a fully
    /// materialized, ascending-sorted array. When an anchor is available,
    /// a binary search positions the cursor directly instead of an
    /// `O(page * size)` walk from the front. Exposed separately from
    /// [`Page::slice`] so callers paging a parallel array (e.g. `(K, V)`
    /// entries sorted by their `V` projection) can reuse the same
    /// positioning logic without materializing a `V`-only copy of their
    /// own collection twice.
    pub fn bounds(&self, sorted: &[V]) -> (usize, usize) {
        let start = match &self.anchor {
            Anchor::Top(v) => sorted.partition_point(|x| x < v),
            Anchor::Bottom(v) => {
                let pos = sorted.partition_point(|x| x < v);
                pos.saturating_sub(self.size)
            }
            Anchor::None => self.page.saturating_mul(self.size),
        };
        let start = start.min(sorted.len());
        let end = (start + self.size).min(sorted.len());
        (start, end)
    }

    /// Extract this page's slice out of `sorted`. See [`Page::bounds`].
    pub fn slice<'a>(&self, sorted: &'a [V]) -> &'a [V] {
        let (start, end) = self.bounds(sorted);
        &sorted[start..end]
    }
}

/// Wraps `inner` with a page boundary. `apply_index`/`evaluate` delegate
/// straight through to `inner`; actual page extraction happens once the
/// query driver has a fully materialized, sorted result (`Page::slice`),
/// since a page boundary generally can't be decided index-locally.
pub struct Limit<K, V> {
    pub inner: Box<dyn Filter<K, V>>,
    pub page_size: usize,
}

impl<K, V> Limit<K, V> {
    pub fn new(inner: Box<dyn Filter<K, V>>, page_size: usize) -> Result<Self> {
        if page_size == 0 {
            return Err(Error::InvalidArgument("Limit::new".to_string(), "page size must be > 0".to_string()));
        }
        Ok(Limit { inner, page_size })
    }
}

impl<K, V> Filter<K, V> for Limit<K, V>
where
    K: Ord + Clone + Hash + Send + Sync + 'static,
    V: Send + Sync + 'static,
{
    fn evaluate(&self, value: &V) -> bool {
        self.inner.evaluate(value)
    }

    fn evaluate_entry(&self, entry: &crate::entry::Entry<K, V>) -> Result<bool> {
        self.inner.evaluate_entry(entry)
    }

    fn effectiveness(&self, indexes: &IndexRegistry<K, V>, keys: &BTreeSet<K>) -> usize {
        self.inner.effectiveness(indexes, keys)
    }

    fn apply_index(
        &self,
        indexes: &IndexRegistry<K, V>,
        keys: &mut BTreeSet<K>,
    ) -> Result<Option<Box<dyn Filter<K, V>>>>
    where
        K: Ord + Clone,
    {
        // A `Limit` wrapping another `Limit` is rejected at construction
        // time upstream (query drivers should not nest pagers); here we
        // simply narrow via `inner` and let the caller apply paging after
        // materializing and sorting the result.
        self.inner.apply_index(indexes, keys)
    }

    fn box_clone(&self) -> Box<dyn Filter<K, V>> {
        Box::new(Limit { inner: self.inner.box_clone(), page_size: self.page_size })
    }
}

#[cfg(test)]
#[path = "limit_test.rs"]
mod limit_test;
