//! Error types for the swap orchestrator.

use navbridge_core::{ErrorKind, NavError};
use navbridge_store::StoreError;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for swap operations.
pub type SwapResult<T> = Result<T, SwapError>;

/// Errors that can occur during a swap.
///
/// Lock contention during the ladder is not an error; it drives escalation.
/// Only an exhausted ladder the user declined is reported, and that as
/// [`crate::SwapOutcome::Deferred`] rather than an error.
#[derive(Error, Debug)]
pub enum SwapError {
    /// Another swap is running, or an intent is waiting to be resumed.
    #[error("swap already in progress")]
    SwapInProgress,

    /// A module file could not be read or written.
    #[error("I/O error on {path:?}: {source}")]
    Io {
        /// The file involved.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: io::Error,
    },

    /// The destination was still locked when resuming a pending intent.
    #[error("destination {path:?} is still locked")]
    DestinationLocked {
        /// The locked destination.
        path: PathBuf,
    },

    /// A path cannot be stored as a string.
    #[error("path {path:?} is not valid UTF-8")]
    NonUtf8Path {
        /// The offending path.
        path: PathBuf,
    },

    /// The stored intent is missing a key or has a malformed value.
    #[error("stored swap intent is corrupted: {0}")]
    CorruptIntent(String),

    /// The durable store failed.
    #[error("intent store error: {0}")]
    Store(#[from] StoreError),

    /// A core operation failed.
    #[error(transparent)]
    Core(#[from] NavError),
}

impl SwapError {
    /// Creates an I/O error for `path`.
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Classifies this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            SwapError::SwapInProgress => ErrorKind::StateError,
            SwapError::Io { .. } | SwapError::CorruptIntent(_) | SwapError::Store(_) => {
                ErrorKind::IoFailure
            }
            SwapError::DestinationLocked { .. } => ErrorKind::LockContention,
            SwapError::NonUtf8Path { .. } => ErrorKind::InvalidInput,
            SwapError::Core(e) => e.kind(),
        }
    }
}
