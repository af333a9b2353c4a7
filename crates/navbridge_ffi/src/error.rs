//! Error types for loading and calling the native module.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for FFI operations.
pub type FfiResult<T> = Result<T, FfiError>;

/// Errors raised on the host side of the boundary.
///
/// Failures reported *by* the native library travel back inside the result
/// structs, not through this type.
#[derive(Debug, Error)]
pub enum FfiError {
    /// The dynamic library could not be opened.
    #[error("failed to load native module {path:?}: {message}")]
    LibraryLoad {
        /// Path that was opened.
        path: PathBuf,
        /// Loader diagnostic.
        message: String,
    },

    /// The library does not export a required entry point.
    #[error("native module is missing symbol `{symbol}`: {message}")]
    MissingSymbol {
        /// Symbol name without the trailing NUL.
        symbol: &'static str,
        /// Loader diagnostic.
        message: String,
    },

    /// A host-side count does not fit the native `i32` count field.
    #[error("{what} count {count} exceeds the native limit")]
    CountOverflow {
        /// Which count overflowed.
        what: &'static str,
        /// The offending value.
        count: usize,
    },
}

impl FfiError {
    /// Creates a count overflow error.
    pub fn count_overflow(what: &'static str, count: usize) -> Self {
        Self::CountOverflow { what, count }
    }
}
