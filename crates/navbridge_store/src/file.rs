//! File-backed store for state that must survive a restart.

use crate::error::{StoreError, StoreResult};
use crate::store::{KeyValueStore, StoreLock};
use fs2::FileExt;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::fs::{self, File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

/// A key/value store persisted as a JSON object in a single file.
///
/// Layout next to the store file:
///
/// ```text
/// <name>          # JSON object of string -> string
/// <name>.tmp      # Scratch file for atomic replacement
/// <name>.lock     # Advisory lock for cross-process consumption
/// ```
///
/// # Durability
///
/// Every write reads the current file, applies the change, writes the full
/// map to `<name>.tmp`, syncs it, renames it over `<name>` and fsyncs the
/// directory. Readers therefore see either the old map or the new one.
///
/// Reads always go to disk, so a record written by another process is
/// visible without reopening.
///
/// # Example
///
/// ```no_run
/// use navbridge_store::{FileStore, KeyValueStore};
/// use std::path::Path;
///
/// let store = FileStore::open(Path::new("navbridge-prefs.json")).unwrap();
/// store.set("swap.pending", "1700000000").unwrap();
/// ```
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    write_guard: Mutex<()>,
}

impl FileStore {
    /// Opens a store at `path`, creating parent directories if needed.
    ///
    /// The file itself is created lazily on first write.
    ///
    /// # Errors
    ///
    /// Returns an error if the parent directory cannot be created or an
    /// existing file is not a valid store.
    pub fn open(path: &Path) -> StoreResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let store = Self {
            path: path.to_path_buf(),
            write_guard: Mutex::new(()),
        };
        // Surface corruption at open rather than at the first swap.
        store.load()?;
        Ok(store)
    }

    /// Returns the path to the store file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns every entry currently on disk.
    pub fn entries(&self) -> StoreResult<BTreeMap<String, String>> {
        self.load()
    }

    fn sibling(&self, suffix: &str) -> PathBuf {
        let mut name = self.path.as_os_str().to_os_string();
        name.push(suffix);
        PathBuf::from(name)
    }

    fn load(&self) -> StoreResult<BTreeMap<String, String>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }

        let mut contents = String::new();
        File::open(&self.path)?.read_to_string(&mut contents)?;
        if contents.trim().is_empty() {
            return Ok(BTreeMap::new());
        }

        serde_json::from_str(&contents).map_err(|e| StoreError::Corrupted {
            path: self.path.clone(),
            message: e.to_string(),
        })
    }

    /// Writes the whole map with the write-then-rename pattern.
    fn save(&self, map: &BTreeMap<String, String>) -> StoreResult<()> {
        let temp_path = self.sibling(".tmp");
        let data = serde_json::to_vec_pretty(map).map_err(|e| StoreError::Corrupted {
            path: self.path.clone(),
            message: e.to_string(),
        })?;

        let mut file = File::create(&temp_path)?;
        file.write_all(&data)?;
        file.sync_all()?;
        drop(file);

        fs::rename(&temp_path, &self.path)?;
        self.sync_directory()
    }

    #[cfg(unix)]
    fn sync_directory(&self) -> StoreResult<()> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        File::open(dir)?.sync_all()?;
        Ok(())
    }

    #[cfg(not(unix))]
    fn sync_directory(&self) -> StoreResult<()> {
        // NTFS journals the rename; there is no directory handle to fsync.
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        Ok(self.load()?.remove(key))
    }

    fn set_many(&self, entries: &[(&str, &str)]) -> StoreResult<()> {
        let _guard = self.write_guard.lock();
        let mut map = self.load()?;
        for (key, value) in entries {
            map.insert((*key).to_string(), (*value).to_string());
        }
        self.save(&map)
    }

    fn remove_many(&self, keys: &[&str]) -> StoreResult<usize> {
        let _guard = self.write_guard.lock();
        let mut map = self.load()?;
        let removed = keys.iter().filter(|key| map.remove(**key).is_some()).count();
        if removed > 0 {
            self.save(&map)?;
        }
        Ok(removed)
    }

    fn lock(&self) -> StoreResult<StoreLock> {
        let lock_file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(self.sibling(".lock"))?;

        if lock_file.try_lock_exclusive().is_err() {
            return Err(StoreError::Locked);
        }
        Ok(StoreLock::holding(lock_file))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use tempfile::tempdir;

    #[test]
    fn file_set_get() {
        let temp = tempdir().unwrap();
        let store = FileStore::open(&temp.path().join("prefs.json")).unwrap();

        store.set("key", "value").unwrap();
        assert_eq!(store.get("key").unwrap().as_deref(), Some("value"));
    }

    #[test]
    fn file_values_survive_reopen() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("prefs.json");

        {
            let store = FileStore::open(&path).unwrap();
            store
                .set_many(&[("pending", "1"), ("source", "/a"), ("dest", "/b")])
                .unwrap();
        }

        let store = FileStore::open(&path).unwrap();
        assert_eq!(store.get("source").unwrap().as_deref(), Some("/a"));
        assert_eq!(store.entries().unwrap().len(), 3);
    }

    #[test]
    fn file_sees_writes_from_second_instance() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("prefs.json");

        let first = FileStore::open(&path).unwrap();
        let second = FileStore::open(&path).unwrap();
        second.set("key", "from-second").unwrap();

        assert_eq!(first.get("key").unwrap().as_deref(), Some("from-second"));
    }

    #[test]
    fn file_missing_file_is_empty() {
        let temp = tempdir().unwrap();
        let store = FileStore::open(&temp.path().join("nested/dir/prefs.json")).unwrap();
        assert!(store.entries().unwrap().is_empty());
        assert_eq!(store.get("anything").unwrap(), None);
    }

    #[test]
    fn file_remove_many() {
        let temp = tempdir().unwrap();
        let store = FileStore::open(&temp.path().join("prefs.json")).unwrap();
        store.set_many(&[("a", "1"), ("b", "2"), ("c", "3")]).unwrap();

        assert_eq!(store.remove_many(&["a", "c", "zzz"]).unwrap(), 2);
        assert_eq!(store.entries().unwrap().len(), 1);
        assert!(!store.sibling(".tmp").exists());
    }

    #[test]
    fn file_corrupted_contents_rejected() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("prefs.json");
        fs::write(&path, b"{ not json").unwrap();

        let result = FileStore::open(&path);
        assert!(matches!(result, Err(StoreError::Corrupted { .. })));
    }

    #[test]
    fn lock_prevents_second_holder() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("prefs.json");
        let first = FileStore::open(&path).unwrap();
        let second = FileStore::open(&path).unwrap();

        let guard = first.lock().unwrap();
        assert!(guard.is_held());
        assert!(matches!(second.lock(), Err(StoreError::Locked)));

        drop(guard);
        assert!(second.lock().is_ok());
    }

    #[derive(Debug, Clone)]
    enum Op {
        Set(String, String),
        Remove(String),
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        let key = "[a-c]\\.[a-c]";
        prop_oneof![
            (key, "[ -~]{0,12}").prop_map(|(k, v)| Op::Set(k, v)),
            key.prop_map(Op::Remove),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn file_matches_model_after_reopen(ops in prop::collection::vec(op_strategy(), 1..24)) {
            let temp = tempdir().unwrap();
            let path = temp.path().join("prefs.json");
            let mut model = BTreeMap::new();

            {
                let store = FileStore::open(&path).unwrap();
                for op in &ops {
                    match op {
                        Op::Set(k, v) => {
                            store.set(k, v).unwrap();
                            model.insert(k.clone(), v.clone());
                        }
                        Op::Remove(k) => {
                            let present = model.remove(k).is_some();
                            prop_assert_eq!(store.remove(k).unwrap(), present);
                        }
                    }
                }
            }

            let reopened = FileStore::open(&path).unwrap();
            prop_assert_eq!(reopened.entries().unwrap(), model);
        }
    }
}
