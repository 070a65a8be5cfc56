//! Runtime-pluggable ordering for extracted attribute values.
//!
//! `SimpleMapIndex`'s ordered inverse index cannot rely on `Ord` alone:
//! a [`Comparator`] is a trait object chosen at index-construction time,
//! so the same extracted type can be sorted differently by different
//! indexes. When no comparator is supplied the index falls back to
//! [`NaturalOrder`], which just delegates to `T: Ord`.

use std::cmp::Ordering;

use crate::err_at;
use crate::error::Result;

/// A total order over (a subset of) values of type `T`.
///
/// Implementations are expected to be pure and consistent: calling
/// `compare` repeatedly with equal arguments must return equal results.
pub trait Comparator<T>: Send + Sync {
    /// Compare two values. Implementations that cannot order a particular
    /// pair (e.g. `NaN` against anything) should still return a consistent
    /// `Ordering` rather than panicking — callers that need a hard failure
    /// use `try_compare`.
    fn compare(&self, a: &T, b: &T) -> Ordering;

    /// Fallible counterpart of `compare`, for comparators that can
    /// genuinely fail to order a pair (an unorderable float, a missing
    /// operand). Defaults to wrapping `compare`'s result; override it
    /// only when there's a real failure mode to raise.
    fn try_compare(&self, a: &T, b: &T) -> Result<Ordering> {
        Ok(self.compare(a, b))
    }
}

/// Delegates to `T`'s own `Ord` implementation.
pub struct NaturalOrder;

impl<T: Ord> Comparator<T> for NaturalOrder {
    fn compare(&self, a: &T, b: &T) -> Ordering {
        a.cmp(b)
    }
}

/// Reverses the ordering of an inner comparator.
pub struct Reverse<C>(pub C);

impl<T, C: Comparator<T>> Comparator<T> for Reverse<C> {
    fn compare(&self, a: &T, b: &T) -> Ordering {
        self.0.compare(a, b).reverse()
    }

    fn try_compare(&self, a: &T, b: &T) -> Result<Ordering> {
        self.0.try_compare(a, b).map(Ordering::reverse)
    }
}

/// Orders `f64`s by `PartialOrd`, raising `Incomparable` on a `NaN`
/// operand through `try_compare` rather than silently treating it as
/// equal. `compare` still returns a total order (sort paths that can't
/// propagate a `Result` need one) by falling `NaN` through as
/// `Ordering::Equal`.
pub struct FloatOrder;

impl Comparator<f64> for FloatOrder {
    fn compare(&self, a: &f64, b: &f64) -> Ordering {
        a.partial_cmp(b).unwrap_or(Ordering::Equal)
    }

    fn try_compare(&self, a: &f64, b: &f64) -> Result<Ordering> {
        match a.partial_cmp(b) {
            Some(ordering) => Ok(ordering),
            None => err_at!(Incomparable, msg: "cannot order {} against {}", a, b),
        }
    }
}

/// Adapts an inner comparator over `Option<T>`, requiring both sides to
/// be present: `try_compare` raises `NullArgument` instead of picking an
/// arbitrary placement for a missing value (unlike the usual
/// `None`-sorts-first convention `compare` falls back to).
pub struct RequireBoth<C>(pub C);

impl<T, C: Comparator<T>> Comparator<Option<T>> for RequireBoth<C> {
    fn compare(&self, a: &Option<T>, b: &Option<T>) -> Ordering {
        match (a, b) {
            (Some(a), Some(b)) => self.0.compare(a, b),
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Less,
            (Some(_), None) => Ordering::Greater,
        }
    }

    fn try_compare(&self, a: &Option<T>, b: &Option<T>) -> Result<Ordering> {
        match (a, b) {
            (Some(a), Some(b)) => self.0.try_compare(a, b),
            _ => err_at!(NullArgument, msg: "comparator requires both operands to be present"),
        }
    }
}

#[cfg(test)]
#[path = "comparator_test.rs"]
mod comparator_test;
