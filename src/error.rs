//! Error type and construction macro shared by every fallible path in this crate.

use std::{fmt, result};

/// Crate-wide result alias.
pub type Result<T> = result::Result<T, Error>;

/// Error variants raised by the query/indexing engine.
///
/// Each variant carries the `file:line` location the error was raised at
/// (filled in by [`err_at`]) and a human-readable message.
#[derive(Clone)]
pub enum Error {
    /// Filter, extractor or index construction was given bad configuration.
    InvalidArgument(String, String),
    /// Operation is not valid for this entry/filter/index combination.
    NotSupported(String, String),
    /// Comparator was asked to order two values it cannot order.
    Incomparable(String, String),
    /// Comparator was given a null argument.
    NullArgument(String, String),
    /// An extractor raised while indexing; caller-visible only when it
    /// escapes the index-maintenance paths that otherwise absorb it.
    ExtractionFailed(String, String),
    /// `apply_index` found index contents of an unexpected shape and must
    /// fall back to entry-by-entry evaluation.
    TypeMismatch(String, String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::InvalidArgument(l, m) => write!(f, "InvalidArgument@{}: {}", l, m),
            Error::NotSupported(l, m) => write!(f, "NotSupported@{}: {}", l, m),
            Error::Incomparable(l, m) => write!(f, "Incomparable@{}: {}", l, m),
            Error::NullArgument(l, m) => write!(f, "NullArgument@{}: {}", l, m),
            Error::ExtractionFailed(l, m) => write!(f, "ExtractionFailed@{}: {}", l, m),
            Error::TypeMismatch(l, m) => write!(f, "TypeMismatch@{}: {}", l, m),
        }
    }
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self)
    }
}

impl std::error::Error for Error {}

/// Construct or convert-and-propagate an [`Error`], stamping the call site.
///
/// Three shapes:
/// - `err_at!(Variant, expr)` — evaluate `expr` (a `Result<T, E: Display>`),
///   pass `Ok` through, wrap `Err` as `Error::Variant` with `e.to_string()`.
/// - `err_at!(Variant, expr, "fmt {}", args)` — same, with a formatted
///   context string prepended to the wrapped error.
/// - `err_at!(Variant, msg: "fmt {}", args)` — construct an `Error::Variant`
///   directly, with no underlying `Result` to unwrap.
#[macro_export]
macro_rules! err_at {
    ($v:ident, msg: $($arg:expr),+) => {{
        let msg = format!($($arg),+);
        Err($crate::Error::$v(format!("{}:{}", file!(), line!()), msg))
    }};
    ($v:ident, $e:expr) => {
        match $e {
            Ok(val) => Ok(val),
            Err(err) => {
                let msg = err.to_string();
                Err($crate::Error::$v(format!("{}:{}", file!(), line!()), msg))
            }
        }
    };
    ($v:ident, $e:expr, $($arg:expr),+) => {
        match $e {
            Ok(val) => Ok(val),
            Err(err) => {
                let msg = format!("{} {}", format!($($arg),+), err);
                Err($crate::Error::$v(format!("{}:{}", file!(), line!()), msg))
            }
        }
    };
}

#[cfg(test)]
#[path = "error_test.rs"]
mod error_test;
