//! Error types for navbridge core.

use navbridge_ffi::FfiError;
use std::io;
use thiserror::Error;

/// Result type for core operations.
pub type NavResult<T> = Result<T, NavError>;

/// Errors that can occur at the host side of the native boundary.
#[derive(Debug, Error)]
pub enum NavError {
    /// Geometry, settings or a query point was rejected before any native call.
    #[error("invalid input: {message}")]
    InvalidInput {
        /// What was wrong with the input.
        message: String,
    },

    /// The native library reported a failure.
    #[error("native call failed: {message}")]
    NativeCallFailure {
        /// Error text copied out of the native buffer.
        message: String,
    },

    /// A build or query was attempted while the module is unloaded.
    #[error("native module is not loaded")]
    ModuleNotLoaded,

    /// A query or statistics call was made before any successful build or load.
    #[error("no mesh loaded")]
    NoMeshLoaded,

    /// I/O error on a module or NavMesh file.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Loading or calling the native module failed on the host side.
    #[error("native module error: {0}")]
    Ffi(#[from] FfiError),
}

/// Coarse classification of failures, shared with the swap orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Rejected before any native call; nothing to release.
    InvalidInput,
    /// The native call returned failure.
    NativeCallFailure,
    /// Operation not legal in the current state.
    StateError,
    /// File missing, permission denied, disk full.
    IoFailure,
    /// A file is locked by the host; drives swap escalation.
    LockContention,
    /// No automatic way forward; the user must restart. Reported for a
    /// deferred swap outcome rather than as an error value.
    Unrecoverable,
}

impl NavError {
    /// Creates an invalid input error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// Creates a native call failure.
    pub fn native_failure(message: impl Into<String>) -> Self {
        Self::NativeCallFailure {
            message: message.into(),
        }
    }

    /// Classifies this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            NavError::InvalidInput { .. } => ErrorKind::InvalidInput,
            NavError::NativeCallFailure { .. } => ErrorKind::NativeCallFailure,
            NavError::ModuleNotLoaded | NavError::NoMeshLoaded => ErrorKind::StateError,
            NavError::Io(_) => ErrorKind::IoFailure,
            NavError::Ffi(FfiError::CountOverflow { .. }) => ErrorKind::InvalidInput,
            NavError::Ffi(_) => ErrorKind::NativeCallFailure,
        }
    }
}
