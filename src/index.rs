//! Per-extractor index maintenance: forward/inverse posting maps
//! ([`simple`]), admission-gated variants ([`conditional`]), and the
//! type-erased registry ([`registry`]) a query driver consults by
//! extractor identity.

pub mod aware;
pub mod conditional;
pub mod inverse;
pub mod registry;
pub mod simple;

pub use aware::{IndexAwareExtractor, IndexSource};
pub use conditional::ConditionalIndex;
pub use registry::{IndexRegistry, MapIndex};
pub use simple::{ForwardLookup, IndexConfig, Multiplicity, SimpleMapIndex};
