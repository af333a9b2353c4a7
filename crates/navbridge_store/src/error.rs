//! Error types for store operations.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The store file exists but is not a valid string map.
    #[error("store file {path:?} is corrupted: {message}")]
    Corrupted {
        /// Path of the store file.
        path: PathBuf,
        /// What failed to parse.
        message: String,
    },

    /// Another process holds the store lock.
    #[error("store is locked by another process")]
    Locked,
}
