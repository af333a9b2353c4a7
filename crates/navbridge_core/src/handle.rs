//! The native module handle and its lifecycle.

use crate::error::{NavError, NavResult};
use crate::fingerprint::Fingerprint;
use crate::results::MeshStats;
use navbridge_ffi::{DynamicLoader, ModuleLoader, NativeModule};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Lifecycle state of a [`NativeModuleHandle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModuleState {
    /// No module mapped; builds and queries are rejected.
    Unloaded,
    /// Module mapped and initialized.
    Loaded,
}

/// One loadable instance of the native library.
///
/// ```text
/// Unloaded --init()--> Loaded --cleanup()--> Unloaded
/// ```
///
/// `init` must succeed before any build or query. `cleanup` is idempotent.
/// Dropping a loaded handle cleans it up.
pub struct NativeModuleHandle {
    path: PathBuf,
    loader: Box<dyn ModuleLoader>,
    module: Option<NativeModule>,
    fingerprint: Option<Fingerprint>,
    mesh: Option<MeshStats>,
}

impl NativeModuleHandle {
    /// Creates an unloaded handle for the module at `path`, using the OS loader.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::with_loader(path, Box::new(DynamicLoader))
    }

    /// Creates an unloaded handle with a custom loader.
    pub fn with_loader(path: impl Into<PathBuf>, loader: Box<dyn ModuleLoader>) -> Self {
        Self {
            path: path.into(),
            loader,
            module: None,
            fingerprint: None,
            mesh: None,
        }
    }

    /// Path of the module file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ModuleState {
        if self.module.is_some() {
            ModuleState::Loaded
        } else {
            ModuleState::Unloaded
        }
    }

    /// Returns true if the module is loaded.
    pub fn is_loaded(&self) -> bool {
        self.module.is_some()
    }

    /// Fingerprint of the file content that is currently loaded.
    pub fn loaded_fingerprint(&self) -> Option<Fingerprint> {
        self.fingerprint
    }

    /// Loads and initializes the module.
    ///
    /// Calling `init` on a loaded handle does nothing.
    ///
    /// # Errors
    ///
    /// Returns [`NavError::Ffi`] if the library cannot be loaded or lacks an
    /// entry point, and [`NavError::NativeCallFailure`] if `nav_initialize`
    /// reports failure. The handle stays unloaded on error.
    pub fn init(&mut self) -> NavResult<()> {
        if self.is_loaded() {
            debug!(path = %self.path.display(), "init on loaded module ignored");
            return Ok(());
        }

        let module = self.loader.load(&self.path)?;
        if !module.initialize() {
            return Err(NavError::native_failure(format!(
                "nav_initialize failed for {}",
                self.path.display()
            )));
        }

        self.fingerprint = match Fingerprint::of_file(&self.path) {
            Ok(fp) => Some(fp),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "could not fingerprint module");
                None
            }
        };
        self.module = Some(module);
        self.mesh = None;

        info!(
            path = %self.path.display(),
            fingerprint = ?self.fingerprint,
            "native module loaded"
        );
        Ok(())
    }

    /// Tears the module down and unmaps it.
    ///
    /// Cleanup on an unloaded handle is a no-op.
    pub fn cleanup(&mut self) {
        let Some(module) = self.module.take() else {
            return;
        };
        module.cleanup();
        drop(module);

        self.fingerprint = None;
        self.mesh = None;
        info!(path = %self.path.display(), "native module unloaded");
    }

    /// Best-effort probe: is the module file held open by this process?
    ///
    /// True when this handle has the file mapped, or when the platform probe
    /// reports the file in use. Not guaranteed accurate on every platform.
    pub fn is_file_locked(&self) -> bool {
        let mapped_here = self.module.as_ref().is_some_and(NativeModule::is_dynamic);
        mapped_here || module_file_in_use(&self.path)
    }

    /// The loaded module, or [`NavError::ModuleNotLoaded`].
    pub(crate) fn module(&self) -> NavResult<&NativeModule> {
        self.module.as_ref().ok_or(NavError::ModuleNotLoaded)
    }

    pub(crate) fn mesh_stats(&self) -> Option<MeshStats> {
        self.mesh
    }

    pub(crate) fn set_mesh_stats(&mut self, stats: Option<MeshStats>) {
        self.mesh = stats;
    }
}

impl Drop for NativeModuleHandle {
    fn drop(&mut self) {
        self.cleanup();
    }
}

impl std::fmt::Debug for NativeModuleHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NativeModuleHandle")
            .field("path", &self.path)
            .field("state", &self.state())
            .field("fingerprint", &self.fingerprint)
            .field("mesh", &self.mesh)
            .finish()
    }
}

/// Best-effort check whether `path` is mapped or locked by the running process.
///
/// - Linux: looks for the file in `/proc/self/maps`.
/// - Windows: a loaded DLL cannot be opened for writing.
/// - Elsewhere: always `false`.
pub fn module_file_in_use(path: &Path) -> bool {
    platform::file_in_use(path)
}

#[cfg(target_os = "linux")]
mod platform {
    use std::path::Path;

    pub(super) fn file_in_use(path: &Path) -> bool {
        let Ok(target) = path.canonicalize() else {
            return false;
        };
        let Ok(maps) = std::fs::read_to_string("/proc/self/maps") else {
            return false;
        };
        maps.lines()
            .filter_map(|line| line.split_whitespace().nth(5))
            .any(|mapped| Path::new(mapped) == target)
    }
}

#[cfg(windows)]
mod platform {
    use std::fs::OpenOptions;
    use std::io::ErrorKind;
    use std::path::Path;

    const ERROR_SHARING_VIOLATION: i32 = 32;
    const ERROR_LOCK_VIOLATION: i32 = 33;

    pub(super) fn file_in_use(path: &Path) -> bool {
        match OpenOptions::new().write(true).open(path) {
            Ok(_) => false,
            Err(e) => {
                e.kind() == ErrorKind::PermissionDenied
                    || matches!(
                        e.raw_os_error(),
                        Some(ERROR_SHARING_VIOLATION | ERROR_LOCK_VIOLATION)
                    )
            }
        }
    }
}

#[cfg(not(any(target_os = "linux", windows)))]
mod platform {
    use std::path::Path;

    pub(super) fn file_in_use(_path: &Path) -> bool {
        false
    }
}
