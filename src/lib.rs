//! Composable filter algebra and inverted-index query engine for an
//! in-memory key/value data grid.
//!
//! An [`extractor`] projects an indexable attribute out of an entry's key
//! or value; a [`comparator`] orders that attribute at index-construction
//! time; [`index::SimpleMapIndex`] and [`index::ConditionalIndex`]
//! maintain the forward/inverse posting maps a [`filter`] consults
//! through [`index::IndexRegistry`] to narrow a key-set before falling
//! back to entry-by-entry evaluation. [`query::DataMap`] composes all of
//! the above into a minimal, directly embeddable store.
//!
//! Persistence, replication, and wire transport are out of scope: this
//! crate is the query/indexing core a surrounding cache-service layer
//! would sit on top of, not the service itself.

mod comparator;
mod entry;
mod error;
mod extractor;
mod filter;
mod index;
mod log_throttle;
mod query;

pub use comparator::{Comparator, NaturalOrder, Reverse};
pub use entry::{Entry, Slot};
pub use error::{Error, Result};
pub use extractor::{Extractor, ExtractorHandle, ExtractorObj, FieldExtractor, IdentityExtractor, Target};
pub use filter::{
    All, Any, Between, Contains, ContainsAll, ContainsAny, Equals, Filter, Greater, GreaterEquals, In, InKeySet,
    Key, Less, LessEquals, Like, Limit, Not, NotEquals, Page, Xor, EVAL_COST,
};
pub use index::{ConditionalIndex, ForwardLookup, IndexConfig, IndexRegistry, MapIndex, Multiplicity, SimpleMapIndex};
pub use log_throttle::LogThrottle;
pub use query::{DataMap, PARALLEL_THRESHOLD};
