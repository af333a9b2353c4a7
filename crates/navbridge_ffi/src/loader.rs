//! Loading the native module and calling into it.

use crate::api::{symbols, NavApi};
use crate::buffer::{NativeBuildResult, NativePathResult};
use crate::error::{FfiError, FfiResult};
use crate::types::{from_native_bool, RawBuildSettings, RawMeshData};
use libloading::Library;
use std::cell::Cell;
use std::marker::PhantomData;
use std::path::Path;
use tracing::debug;

/// Produces a [`NativeModule`] for a module file.
///
/// This is the seam between the handle lifecycle and the operating system
/// loader; tests substitute a loader that returns an in-process fake.
pub trait ModuleLoader: Send {
    /// Loads the module at `path` and resolves every entry point.
    fn load(&self, path: &Path) -> FfiResult<NativeModule>;
}

/// Loads modules through the OS dynamic loader.
#[derive(Debug, Default, Clone, Copy)]
pub struct DynamicLoader;

impl ModuleLoader for DynamicLoader {
    fn load(&self, path: &Path) -> FfiResult<NativeModule> {
        // Safety: loading a library runs its initializers; the module is
        // trusted native code supplied by the host.
        let library = unsafe { Library::new(path) }.map_err(|e| FfiError::LibraryLoad {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        let api = NavApi {
            initialize: resolve(&library, symbols::INITIALIZE)?,
            cleanup: resolve(&library, symbols::CLEANUP)?,
            build: resolve(&library, symbols::BUILD)?,
            load_navmesh: resolve(&library, symbols::LOAD_NAVMESH)?,
            find_path: resolve(&library, symbols::FIND_PATH)?,
            free_build_result: resolve(&library, symbols::FREE_BUILD_RESULT)?,
            free_path_result: resolve(&library, symbols::FREE_PATH_RESULT)?,
            poly_count: resolve(&library, symbols::POLY_COUNT)?,
            vertex_count: resolve(&library, symbols::VERTEX_COUNT)?,
        };

        debug!(path = %path.display(), "resolved native entry points");
        Ok(NativeModule {
            api,
            library: Some(library),
            _not_sync: PhantomData,
        })
    }
}

fn resolve<T: Copy>(library: &Library, symbol: &'static [u8]) -> FfiResult<T> {
    // Safety: `T` is one of the `NavApi` function pointer types whose
    // signature matches the exported symbol. The copied pointer is kept
    // next to `library` inside `NativeModule`.
    unsafe { library.get::<T>(symbol) }
        .map(|sym| *sym)
        .map_err(|e| FfiError::MissingSymbol {
            symbol: symbols::display(symbol),
            message: e.to_string(),
        })
}

/// One loaded instance of the native navigation library.
///
/// Owns the library mapping (when loaded from disk) together with the entry
/// points resolved from it. Dropping the module unmaps the library, so every
/// borrowed result must be released first; the guard lifetimes enforce that.
///
/// The module is `Send` but not `Sync`: the native library keeps one
/// current NavMesh and calls against it must be serialized.
#[derive(Debug)]
pub struct NativeModule {
    api: NavApi,
    library: Option<Library>,
    _not_sync: PhantomData<Cell<()>>,
}

impl NativeModule {
    /// Wraps entry points that live in the current binary.
    ///
    /// # Safety
    ///
    /// Every function in `api` must honour the native contract documented
    /// on the [`crate::api`] types and remain callable for the lifetime of
    /// the returned module.
    pub unsafe fn from_static_api(api: NavApi) -> Self {
        Self {
            api,
            library: None,
            _not_sync: PhantomData,
        }
    }

    /// Returns true if this module was mapped from a file.
    pub fn is_dynamic(&self) -> bool {
        self.library.is_some()
    }

    /// Calls `nav_initialize`.
    pub fn initialize(&self) -> bool {
        // Safety: contract of `NavApi`.
        from_native_bool(unsafe { (self.api.initialize)() })
    }

    /// Calls `nav_cleanup`.
    pub fn cleanup(&self) {
        // Safety: contract of `NavApi`.
        unsafe { (self.api.cleanup)() }
    }

    /// Calls `nav_build` with flat vertex and index arrays.
    ///
    /// `vertices` holds three floats per vertex and `indices` three indices
    /// per triangle; both are only borrowed for the call.
    pub fn build(
        &self,
        vertices: &[f32],
        indices: &[i32],
        settings: &RawBuildSettings,
    ) -> FfiResult<NativeBuildResult<'_>> {
        let vertex_count = vertices.len() / 3;
        let mesh = RawMeshData {
            vertex_ptr: vertices.as_ptr(),
            index_ptr: indices.as_ptr(),
            vertex_count: native_count("vertex", vertex_count)?,
            index_count: native_count("index", indices.len())?,
        };

        // Safety: `mesh` points into slices that outlive the call.
        let raw = unsafe { (self.api.build)(&mesh, settings) };
        Ok(NativeBuildResult::new(raw, self.api.free_build_result))
    }

    /// Calls `nav_load_navmesh` with a previously built blob.
    pub fn load_navmesh(&self, data: &[u8]) -> FfiResult<NativeBuildResult<'_>> {
        let size = native_count("navmesh byte", data.len())?;
        // Safety: `data` outlives the call.
        let raw = unsafe { (self.api.load_navmesh)(data.as_ptr(), size) };
        Ok(NativeBuildResult::new(raw, self.api.free_build_result))
    }

    /// Calls `nav_find_path` with two points as scalar arguments.
    pub fn find_path(&self, start: [f32; 3], end: [f32; 3]) -> NativePathResult<'_> {
        // Safety: contract of `NavApi`.
        let raw = unsafe {
            (self.api.find_path)(start[0], start[1], start[2], end[0], end[1], end[2])
        };
        NativePathResult::new(raw, self.api.free_path_result)
    }

    /// Calls `nav_poly_count`.
    pub fn poly_count(&self) -> i32 {
        // Safety: contract of `NavApi`.
        unsafe { (self.api.poly_count)() }
    }

    /// Calls `nav_vertex_count`.
    pub fn vertex_count(&self) -> i32 {
        // Safety: contract of `NavApi`.
        unsafe { (self.api.vertex_count)() }
    }
}

fn native_count(what: &'static str, count: usize) -> FfiResult<i32> {
    i32::try_from(count).map_err(|_| FfiError::count_overflow(what, count))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn native_count_limits() {
        assert_eq!(native_count("vertex", 12).unwrap(), 12);
        let too_many = i32::MAX as usize + 1;
        assert!(matches!(
            native_count("vertex", too_many),
            Err(FfiError::CountOverflow { count, .. }) if count == too_many
        ));
    }

    #[test]
    fn dynamic_loader_reports_missing_file() {
        let result = DynamicLoader.load(Path::new("/definitely/not/a/navmesh/module.so"));
        assert!(matches!(result, Err(FfiError::LibraryLoad { .. })));
    }
}
