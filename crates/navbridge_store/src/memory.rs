//! In-memory store for testing.

use crate::error::StoreResult;
use crate::store::{KeyValueStore, StoreLock};
use parking_lot::RwLock;
use std::collections::BTreeMap;

/// An in-memory key/value store.
///
/// Nothing survives the process. Use it for:
/// - Unit tests
/// - Hosts that only need intent tracking within one run
///
/// # Example
///
/// ```rust
/// use navbridge_store::{KeyValueStore, MemoryStore};
///
/// let store = MemoryStore::new();
/// store.set_many(&[("a", "1"), ("b", "2")]).unwrap();
/// assert_eq!(store.remove_many(&["a", "b", "c"]).unwrap(), 2);
/// assert!(store.is_empty());
/// ```
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<BTreeMap<String, String>>,
}

impl MemoryStore {
    /// Creates a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of every entry.
    #[must_use]
    pub fn entries(&self) -> BTreeMap<String, String> {
        self.entries.read().clone()
    }

    /// Returns true if the store holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        Ok(self.entries.read().get(key).cloned())
    }

    fn set_many(&self, entries: &[(&str, &str)]) -> StoreResult<()> {
        let mut map = self.entries.write();
        for (key, value) in entries {
            map.insert((*key).to_string(), (*value).to_string());
        }
        Ok(())
    }

    fn remove_many(&self, keys: &[&str]) -> StoreResult<usize> {
        let mut map = self.entries.write();
        Ok(keys.iter().filter(|key| map.remove(**key).is_some()).count())
    }

    fn lock(&self) -> StoreResult<StoreLock> {
        Ok(StoreLock::unlocked())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_set_get() {
        let store = MemoryStore::new();
        store.set("key", "value").unwrap();
        assert_eq!(store.get("key").unwrap().as_deref(), Some("value"));
        assert!(store.contains("key").unwrap());
    }

    #[test]
    fn memory_missing_key() {
        let store = MemoryStore::new();
        assert_eq!(store.get("nope").unwrap(), None);
        assert!(!store.contains("nope").unwrap());
    }

    #[test]
    fn memory_overwrite() {
        let store = MemoryStore::new();
        store.set("key", "one").unwrap();
        store.set("key", "two").unwrap();
        assert_eq!(store.get("key").unwrap().as_deref(), Some("two"));
        assert_eq!(store.entries().len(), 1);
    }

    #[test]
    fn memory_remove_reports_presence() {
        let store = MemoryStore::new();
        store.set("key", "value").unwrap();
        assert!(store.remove("key").unwrap());
        assert!(!store.remove("key").unwrap());
        assert!(store.is_empty());
    }

    #[test]
    fn memory_lock_holds_nothing() {
        let store = MemoryStore::new();
        let guard = store.lock().unwrap();
        assert!(!guard.is_held());
    }
}
