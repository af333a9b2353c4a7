//! Test fixtures: geometry, sessions and module files.

use crate::fake::{self, FakeLoader};
use navbridge_core::{NativeModuleHandle, NavMeshSession, SessionConfig, Vec3};
use navbridge_store::{FileStore, KeyValueStore, MemoryStore};
use navbridge_swap::{SwapConfig, SwapOrchestrator};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

/// A 10 x 10 planar quad on y = 0: four vertices, two triangles.
pub fn quad() -> (Vec<Vec3>, Vec<[u32; 3]>) {
    let vertices = vec![
        Vec3::new(0.0, 0.0, 0.0),
        Vec3::new(10.0, 0.0, 0.0),
        Vec3::new(10.0, 0.0, 10.0),
        Vec3::new(0.0, 0.0, 10.0),
    ];
    let triangles = vec![[0, 2, 1], [0, 3, 2]];
    (vertices, triangles)
}

/// An unloaded handle backed by the fake native library.
///
/// The fake state of the current thread is reset first.
pub fn fake_handle() -> NativeModuleHandle {
    fake::reset();
    NativeModuleHandle::with_loader("fake/libnavmesh.so", Box::new(FakeLoader::default()))
}

/// A session over an initialized fake handle.
pub fn fake_session(config: SessionConfig) -> NavMeshSession {
    let mut handle = fake_handle();
    handle
        .init()
        .expect("fake module should always initialize");
    NavMeshSession::new(handle, config)
}

/// A source and destination module file in a temporary directory.
pub struct ModuleFilePair {
    /// The new module.
    pub source: PathBuf,
    /// The installed module.
    pub dest: PathBuf,
    dir: TempDir,
}

impl ModuleFilePair {
    /// Writes `source` and `dest` with the given content.
    pub fn new(source: &[u8], dest: &[u8]) -> Self {
        let dir = TempDir::new().expect("Failed to create temp directory");
        let source_path = dir.path().join("incoming").join("libnavmesh.so");
        let dest_path = dir.path().join("plugins").join("libnavmesh.so");
        for (path, content) in [(&source_path, source), (&dest_path, dest)] {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).expect("Failed to create module directory");
            }
            fs::write(path, content).expect("Failed to write module file");
        }
        Self {
            source: source_path,
            dest: dest_path,
            dir,
        }
    }

    /// Identical source and destination.
    pub fn identical() -> Self {
        Self::new(b"navmesh module v1", b"navmesh module v1")
    }

    /// Source newer than destination.
    pub fn differing() -> Self {
        Self::new(b"navmesh module v2", b"navmesh module v1")
    }

    /// The temporary directory.
    pub fn dir(&self) -> &Path {
        self.dir.path()
    }

    /// Current destination content.
    pub fn dest_content(&self) -> Vec<u8> {
        fs::read(&self.dest).expect("Failed to read destination")
    }

    /// Current source content.
    pub fn source_content(&self) -> Vec<u8> {
        fs::read(&self.source).expect("Failed to read source")
    }

    /// Path for a store file inside the directory.
    pub fn store_path(&self) -> PathBuf {
        self.dir.path().join("prefs").join("navbridge.json")
    }
}

/// A file store in the pair's directory.
pub fn file_store(pair: &ModuleFilePair) -> Arc<FileStore> {
    Arc::new(FileStore::open(&pair.store_path()).expect("Failed to open file store"))
}

/// An in-memory store.
pub fn memory_store() -> Arc<MemoryStore> {
    Arc::new(MemoryStore::new())
}

/// An orchestrator without waits over `store` and `files`.
pub fn orchestrator(
    store: Arc<dyn KeyValueStore>,
    files: impl navbridge_swap::ModuleFiles + 'static,
) -> SwapOrchestrator {
    SwapOrchestrator::with_files(SwapConfig::immediate(), store, Box::new(files))
}
