//! Projecting an indexable attribute out of an entry's key or value.

/// Which half of an entry an extractor reads from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Target {
    Value,
    Key,
}

/// Object-safe, type-erased identity for an extractor: name and target are
/// enough to decide whether two extractor instances are "the same"
/// attribute for the purposes of keying an index registry. Concrete
/// extractors additionally implement [`Extractor`] for the typed
/// extraction logic; that trait is not object-safe over `T` so a registry
/// holding many differently-typed extractors keys itself on this trait
/// instead.
pub trait ExtractorObj: Send + Sync {
    /// Stable, configuration-derived name (e.g. `"field:age"`). Two
    /// extractor instances with the same name and target are considered
    /// interchangeable.
    fn name(&self) -> &str;

    fn target(&self) -> Target;
}

/// Typed projection `S -> T`, where `S` is whatever host type this
/// extractor targets (an entry's value type for `Target::Value`, or its
/// key type for `Target::Key`). `None` signals the attribute is absent
/// for this value (distinct from an extraction error, which the caller
/// reports through `crate::Error::ExtractionFailed`).
///
/// Entries dispatch through [`Entry::extract`]/[`Entry::extract_key`]
/// rather than through a single blanket method here, since `K` and `V`
/// are in general unrelated types and a target-dispatching method would
/// need to pick one statically.
pub trait Extractor<S, T>: ExtractorObj {
    fn extract(&self, source: &S) -> Option<T>;
}

/// Hashable, equality-comparable handle to an extractor's identity, usable
/// as a `HashMap` key in an index registry regardless of the extractor's
/// extracted type `T`.
///
/// Holds an owned copy of `name`/`target` rather than a type-erased
/// `Arc<dyn ExtractorObj>`: extractor identity only ever needs those two
/// fields, and an owned copy sidesteps needing to upcast a
/// `dyn Extractor<V, T>` to `dyn ExtractorObj` (an operation this crate's
/// targeted toolchain cannot rely on).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ExtractorHandle {
    name: String,
    target: Target,
}

impl ExtractorHandle {
    pub fn new(name: impl Into<String>, target: Target) -> Self {
        ExtractorHandle { name: name.into(), target }
    }

    pub fn of(obj: &dyn ExtractorObj) -> Self {
        ExtractorHandle { name: obj.name().to_string(), target: obj.target() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn target(&self) -> Target {
        self.target
    }
}

/// Returns its argument unchanged; the attribute *is* the value (or key).
#[derive(Clone, Debug)]
pub struct IdentityExtractor {
    name: String,
    target: Target,
}

impl IdentityExtractor {
    pub fn value() -> Self {
        IdentityExtractor { name: "identity:value".to_string(), target: Target::Value }
    }

    pub fn key() -> Self {
        IdentityExtractor { name: "identity:key".to_string(), target: Target::Key }
    }
}

impl ExtractorObj for IdentityExtractor {
    fn name(&self) -> &str {
        &self.name
    }

    fn target(&self) -> Target {
        self.target
    }
}

impl<V: Clone> Extractor<V, V> for IdentityExtractor {
    fn extract(&self, value: &V) -> Option<V> {
        Some(value.clone())
    }
}

/// Projects a field out of `V` via a user-supplied closure, carrying a
/// stable `name` used for index-registry identity.
pub struct FieldExtractor<V, T, F>
where
    F: Fn(&V) -> Option<T> + Send + Sync,
{
    name: String,
    target: Target,
    func: F,
    _marker: std::marker::PhantomData<fn(&V) -> Option<T>>,
}

impl<V, T, F> FieldExtractor<V, T, F>
where
    F: Fn(&V) -> Option<T> + Send + Sync,
{
    pub fn new(name: impl Into<String>, target: Target, func: F) -> Self {
        FieldExtractor { name: name.into(), target, func, _marker: std::marker::PhantomData }
    }
}

impl<V, T, F> ExtractorObj for FieldExtractor<V, T, F>
where
    V: Send + Sync,
    T: Send + Sync,
    F: Fn(&V) -> Option<T> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn target(&self) -> Target {
        self.target
    }
}

impl<V, T, F> Extractor<V, T> for FieldExtractor<V, T, F>
where
    V: Send + Sync,
    T: Send + Sync,
    F: Fn(&V) -> Option<T> + Send + Sync,
{
    fn extract(&self, value: &V) -> Option<T> {
        (self.func)(value)
    }
}

#[cfg(test)]
#[path = "extractor_test.rs"]
mod extractor_test;
