//! Lets an extractor own the choice of index implementation it's backed
//! by, instead of `DataMap::add_index` always defaulting to a
//! [`SimpleMapIndex`](crate::index::SimpleMapIndex).

use std::hash::Hash;
use std::sync::Arc;

use crate::extractor::Extractor;
use crate::index::registry::MapIndex;
use crate::index::simple::IndexConfig;

/// An extractor that builds and tears down its own index, rather than
/// the registrar always constructing a `SimpleMapIndex` around it.
/// Useful when an attribute needs a specialized structure a generic
/// forward/inverse posting map can't represent, or admission logic a
/// plain extractor alone can't express (e.g. a `ConditionalIndex` gated
/// on a filter the extractor already knows about).
pub trait IndexAwareExtractor<K, V, T>: Extractor<V, T>
where
    K: Ord + Clone + Hash + Send + Sync + 'static,
    V: Send + Sync + 'static,
    T: Send + Sync + 'static,
{
    fn create_index(self: Arc<Self>, config: IndexConfig<T>) -> Box<dyn MapIndex<K, V>>;

    /// Run when the index this extractor built is unregistered. Most
    /// extractors have nothing to clean up beyond dropping the index
    /// itself; override for ones that own external state tied to the
    /// index's lifetime (e.g. a registered change listener).
    fn destroy_index(&self, _index: &mut dyn MapIndex<K, V>) {}
}

/// Whatever `DataMap::add_index` was handed: a plain extractor (gets a
/// `SimpleMapIndex` built for it) or one that already knows how to build
/// its own index.
pub enum IndexSource<K, V, T> {
    Simple(Arc<dyn Extractor<V, T>>),
    Aware(Arc<dyn IndexAwareExtractor<K, V, T>>),
}

impl<K, V, T> From<Arc<dyn Extractor<V, T>>> for IndexSource<K, V, T> {
    fn from(extractor: Arc<dyn Extractor<V, T>>) -> Self {
        IndexSource::Simple(extractor)
    }
}

impl<K, V, T> From<Arc<dyn IndexAwareExtractor<K, V, T>>> for IndexSource<K, V, T> {
    fn from(extractor: Arc<dyn IndexAwareExtractor<K, V, T>>) -> Self {
        IndexSource::Aware(extractor)
    }
}

#[cfg(test)]
#[path = "aware_test.rs"]
mod aware_test;
