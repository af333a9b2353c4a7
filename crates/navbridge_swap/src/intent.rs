//! Durable record of a pending module replacement.

use crate::error::{SwapError, SwapResult};
use navbridge_store::{KeyValueStore, StoreError, StoreLock};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, info};

/// A module replacement that must be completed after a host restart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapIntent {
    /// The new module file.
    pub source: PathBuf,
    /// The module file to overwrite.
    pub dest: PathBuf,
    /// When the swap was requested, in seconds since the Unix epoch.
    pub requested_at: u64,
}

impl SwapIntent {
    /// Creates an intent stamped with the current time.
    pub fn new(source: impl Into<PathBuf>, dest: impl Into<PathBuf>) -> Self {
        let requested_at = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        Self {
            source: source.into(),
            dest: dest.into(),
            requested_at,
        }
    }
}

/// Reads and writes the [`SwapIntent`] in a key/value store.
///
/// The record is three keys under a common prefix:
///
/// ```text
/// <prefix>.pending  requested-at seconds; its presence marks resumable work
/// <prefix>.source   source path
/// <prefix>.dest     destination path
/// ```
///
/// The one-shot methods take the store lock for a single access. A caller
/// that reads the intent and then acts on it must hold an [`IntentGuard`]
/// from [`IntentStore::lock`] across both, otherwise another process can
/// consume the same intent in between.
#[derive(Clone)]
pub struct IntentStore {
    store: Arc<dyn KeyValueStore>,
    pending_key: String,
    source_key: String,
    dest_key: String,
}

impl IntentStore {
    /// Creates an intent store over `store` using keys under `prefix`.
    pub fn new(store: Arc<dyn KeyValueStore>, prefix: &str) -> Self {
        Self {
            store,
            pending_key: format!("{prefix}.pending"),
            source_key: format!("{prefix}.source"),
            dest_key: format!("{prefix}.dest"),
        }
    }

    /// Key whose presence marks a pending intent.
    pub fn pending_key(&self) -> &str {
        &self.pending_key
    }

    /// Takes the store lock until the returned guard drops.
    ///
    /// # Errors
    ///
    /// Returns [`SwapError::SwapInProgress`] if another holder has the lock.
    pub fn lock(&self) -> SwapResult<IntentGuard<'_>> {
        let lock = self.store.lock().map_err(|e| match e {
            StoreError::Locked => SwapError::SwapInProgress,
            other => SwapError::Store(other),
        })?;
        Ok(IntentGuard {
            intents: self,
            _lock: lock,
        })
    }

    /// Persists `intent`, replacing any previous one. All three keys land together.
    pub fn save(&self, intent: &SwapIntent) -> SwapResult<()> {
        self.lock()?.save(intent)
    }

    /// Loads the pending intent, if any.
    ///
    /// # Errors
    ///
    /// Returns [`SwapError::CorruptIntent`] if the pending flag is present but
    /// a path key is missing or the timestamp does not parse.
    pub fn load(&self) -> SwapResult<Option<SwapIntent>> {
        self.lock()?.load()
    }

    /// Returns true if an intent is pending.
    pub fn is_pending(&self) -> SwapResult<bool> {
        self.lock()?.is_pending()
    }

    /// Deletes the intent. Returns whether one was present.
    pub fn clear(&self) -> SwapResult<bool> {
        self.lock()?.clear()
    }
}

/// Exclusive access to the intent record.
///
/// Every read and write through the guard happens under one store lock,
/// released on drop.
pub struct IntentGuard<'a> {
    intents: &'a IntentStore,
    _lock: StoreLock,
}

impl IntentGuard<'_> {
    /// Persists `intent`, replacing any previous one.
    pub fn save(&self, intent: &SwapIntent) -> SwapResult<()> {
        let source = path_str(&intent.source)?;
        let dest = path_str(&intent.dest)?;
        let requested_at = intent.requested_at.to_string();

        let keys = self.intents;
        keys.store.set_many(&[
            (keys.source_key.as_str(), source),
            (keys.dest_key.as_str(), dest),
            (keys.pending_key.as_str(), requested_at.as_str()),
        ])?;
        info!(source, dest, "swap intent persisted");
        Ok(())
    }

    /// Loads the pending intent, if any.
    pub fn load(&self) -> SwapResult<Option<SwapIntent>> {
        let keys = self.intents;
        let Some(pending) = keys.store.get(&keys.pending_key)? else {
            return Ok(None);
        };
        let requested_at = pending.trim().parse::<u64>().map_err(|e| {
            SwapError::CorruptIntent(format!("{} = {pending:?}: {e}", keys.pending_key))
        })?;
        let source = keys
            .store
            .get(&keys.source_key)?
            .ok_or_else(|| SwapError::CorruptIntent(format!("{} is missing", keys.source_key)))?;
        let dest = keys
            .store
            .get(&keys.dest_key)?
            .ok_or_else(|| SwapError::CorruptIntent(format!("{} is missing", keys.dest_key)))?;

        Ok(Some(SwapIntent {
            source: PathBuf::from(source),
            dest: PathBuf::from(dest),
            requested_at,
        }))
    }

    /// Returns true if an intent is pending.
    pub fn is_pending(&self) -> SwapResult<bool> {
        Ok(self.intents.store.contains(&self.intents.pending_key)?)
    }

    /// Deletes the intent. Returns whether one was present.
    pub fn clear(&self) -> SwapResult<bool> {
        let keys = self.intents;
        let removed = keys.store.remove_many(&[
            keys.pending_key.as_str(),
            keys.source_key.as_str(),
            keys.dest_key.as_str(),
        ])?;
        debug!(removed, "swap intent keys removed");
        Ok(removed > 0)
    }
}

impl std::fmt::Debug for IntentGuard<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IntentGuard")
            .field("pending_key", &self.intents.pending_key)
            .finish_non_exhaustive()
    }
}

impl std::fmt::Debug for IntentStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IntentStore")
            .field("pending_key", &self.pending_key)
            .finish_non_exhaustive()
    }
}

fn path_str(path: &Path) -> SwapResult<&str> {
    path.to_str().ok_or_else(|| SwapError::NonUtf8Path {
        path: path.to_path_buf(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use navbridge_store::{FileStore, MemoryStore};
    use tempfile::tempdir;

    fn memory_intents() -> (Arc<MemoryStore>, IntentStore) {
        let store = Arc::new(MemoryStore::new());
        let intents = IntentStore::new(store.clone(), "test.swap");
        (store, intents)
    }

    #[test]
    fn empty_store_has_no_intent() {
        let (_, intents) = memory_intents();
        assert_eq!(intents.load().unwrap(), None);
        assert!(!intents.is_pending().unwrap());
        assert!(!intents.clear().unwrap());
    }

    #[test]
    fn save_load_clear() {
        let (store, intents) = memory_intents();
        let intent = SwapIntent {
            source: "/new/libnav.so".into(),
            dest: "/plugins/libnav.so".into(),
            requested_at: 1_700_000_000,
        };

        intents.save(&intent).unwrap();
        assert_eq!(store.get("test.swap.pending").unwrap().as_deref(), Some("1700000000"));
        assert_eq!(intents.load().unwrap(), Some(intent));

        assert!(intents.clear().unwrap());
        assert!(store.is_empty());
    }

    #[test]
    fn missing_path_key_is_corrupt() {
        let (store, intents) = memory_intents();
        store.set("test.swap.pending", "12").unwrap();
        store.set("test.swap.dest", "/plugins/libnav.so").unwrap();
        assert!(matches!(intents.load(), Err(SwapError::CorruptIntent(_))));
    }

    #[test]
    fn bad_timestamp_is_corrupt() {
        let (store, intents) = memory_intents();
        store
            .set_many(&[
                ("test.swap.pending", "yesterday"),
                ("test.swap.source", "a"),
                ("test.swap.dest", "b"),
            ])
            .unwrap();
        assert!(matches!(intents.load(), Err(SwapError::CorruptIntent(_))));
    }

    #[test]
    fn intent_survives_reopen() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("prefs.json");
        let intent = SwapIntent::new("/new/nav.dll", "/plugins/nav.dll");

        {
            let store = Arc::new(FileStore::open(&path).unwrap());
            IntentStore::new(store, "editor.nav").save(&intent).unwrap();
        }

        let store = Arc::new(FileStore::open(&path).unwrap());
        let loaded = IntentStore::new(store, "editor.nav").load().unwrap();
        assert_eq!(loaded, Some(intent));
    }

    #[test]
    fn guard_excludes_a_second_store_on_the_same_file() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("prefs.json");
        let first = IntentStore::new(Arc::new(FileStore::open(&path).unwrap()), "editor.nav");
        let second = IntentStore::new(Arc::new(FileStore::open(&path).unwrap()), "editor.nav");
        first.save(&SwapIntent::new("/new/nav.dll", "/plugins/nav.dll")).unwrap();

        let guard = first.lock().unwrap();
        assert!(guard.is_pending().unwrap());
        assert!(matches!(second.lock(), Err(SwapError::SwapInProgress)));
        assert!(matches!(second.clear(), Err(SwapError::SwapInProgress)));

        assert!(guard.clear().unwrap());
        drop(guard);
        assert_eq!(second.load().unwrap(), None);
    }

    #[test]
    fn new_intent_is_timestamped() {
        let intent = SwapIntent::new("a", "b");
        assert!(intent.requested_at > 1_600_000_000);
    }
}
