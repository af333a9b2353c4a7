//! Key/value store trait definition.

use crate::error::StoreResult;
use std::fs::File;

/// A durable map of string keys to string values.
///
/// # Invariants
///
/// - `get` returns exactly the value most recently `set` for a key
/// - After `set_many`/`remove_many` return, either every change is durable or none is
/// - Stores must be `Send + Sync`
///
/// # Implementors
///
/// - [`super::MemoryStore`] - For testing
/// - [`super::FileStore`] - For persistent state
pub trait KeyValueStore: Send + Sync {
    /// Returns the value stored under `key`, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing storage cannot be read.
    fn get(&self, key: &str) -> StoreResult<Option<String>>;

    /// Writes a batch of entries atomically.
    ///
    /// # Errors
    ///
    /// Returns an error if the batch could not be made durable. On error
    /// none of the entries are visible.
    fn set_many(&self, entries: &[(&str, &str)]) -> StoreResult<()>;

    /// Removes a batch of keys atomically.
    ///
    /// Returns the number of keys that were present.
    ///
    /// # Errors
    ///
    /// Returns an error if the removal could not be made durable.
    fn remove_many(&self, keys: &[&str]) -> StoreResult<usize>;

    /// Acquires the store-wide exclusive lock.
    ///
    /// The lock is released when the returned guard is dropped. Stores that
    /// are private to one process return a guard that holds nothing.
    ///
    /// # Errors
    ///
    /// Returns [`crate::StoreError::Locked`] if another process holds the lock.
    fn lock(&self) -> StoreResult<StoreLock>;

    /// Writes a single entry.
    fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        self.set_many(&[(key, value)])
    }

    /// Removes a single key, returning whether it was present.
    fn remove(&self, key: &str) -> StoreResult<bool> {
        Ok(self.remove_many(&[key])? > 0)
    }

    /// Returns true if `key` is present.
    fn contains(&self, key: &str) -> StoreResult<bool> {
        Ok(self.get(key)?.is_some())
    }
}

/// Guard for the store-wide exclusive lock.
///
/// The fs2 advisory lock is released when the lock file handle closes.
#[derive(Debug)]
pub struct StoreLock {
    _file: Option<File>,
}

impl StoreLock {
    /// A guard that holds no lock.
    pub fn unlocked() -> Self {
        Self { _file: None }
    }

    /// A guard that keeps `file` (and its advisory lock) open.
    pub fn holding(file: File) -> Self {
        Self { _file: Some(file) }
    }

    /// Returns true if this guard holds a cross-process lock.
    pub fn is_held(&self) -> bool {
        self._file.is_some()
    }
}
