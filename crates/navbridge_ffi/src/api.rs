//! Native entry-point table.

use crate::types::{RawBuildResult, RawBuildSettings, RawMeshData, RawPathResult};

/// `int nav_initialize(void)` - non-zero on success.
pub type InitializeFn = unsafe extern "C" fn() -> i32;
/// `void nav_cleanup(void)` - releases every native resource.
pub type CleanupFn = unsafe extern "C" fn();
/// `BuildResult nav_build(const MeshData*, const BuildSettings*)`.
pub type BuildFn =
    unsafe extern "C" fn(mesh: *const RawMeshData, settings: *const RawBuildSettings) -> RawBuildResult;
/// `BuildResult nav_load_navmesh(const unsigned char*, int)`.
pub type LoadNavMeshFn = unsafe extern "C" fn(data: *const u8, size: i32) -> RawBuildResult;
/// `PathResult nav_find_path(float sx, float sy, float sz, float ex, float ey, float ez)`.
pub type FindPathFn = unsafe extern "C" fn(
    start_x: f32,
    start_y: f32,
    start_z: f32,
    end_x: f32,
    end_y: f32,
    end_z: f32,
) -> RawPathResult;
/// `void nav_free_build_result(BuildResult*)`.
pub type FreeBuildResultFn = unsafe extern "C" fn(result: *mut RawBuildResult);
/// `void nav_free_path_result(PathResult*)`.
pub type FreePathResultFn = unsafe extern "C" fn(result: *mut RawPathResult);
/// `int nav_poly_count(void)` / `int nav_vertex_count(void)`.
pub type CountFn = unsafe extern "C" fn() -> i32;

/// Exported symbol names, NUL-terminated for the loader.
pub mod symbols {
    /// See [`super::InitializeFn`].
    pub const INITIALIZE: &[u8] = b"nav_initialize\0";
    /// See [`super::CleanupFn`].
    pub const CLEANUP: &[u8] = b"nav_cleanup\0";
    /// See [`super::BuildFn`].
    pub const BUILD: &[u8] = b"nav_build\0";
    /// See [`super::LoadNavMeshFn`].
    pub const LOAD_NAVMESH: &[u8] = b"nav_load_navmesh\0";
    /// See [`super::FindPathFn`].
    pub const FIND_PATH: &[u8] = b"nav_find_path\0";
    /// See [`super::FreeBuildResultFn`].
    pub const FREE_BUILD_RESULT: &[u8] = b"nav_free_build_result\0";
    /// See [`super::FreePathResultFn`].
    pub const FREE_PATH_RESULT: &[u8] = b"nav_free_path_result\0";
    /// See [`super::CountFn`].
    pub const POLY_COUNT: &[u8] = b"nav_poly_count\0";
    /// See [`super::CountFn`].
    pub const VERTEX_COUNT: &[u8] = b"nav_vertex_count\0";

    /// Symbol name without the trailing NUL, for diagnostics.
    pub fn display(symbol: &'static [u8]) -> &'static str {
        let trimmed = symbol.strip_suffix(b"\0").unwrap_or(symbol);
        std::str::from_utf8(trimmed).unwrap_or("<non-utf8 symbol>")
    }
}

/// The resolved entry points of one native module.
///
/// The pointers are only valid while the library they were resolved from
/// stays loaded; [`crate::NativeModule`] keeps the two together.
#[derive(Debug, Clone, Copy)]
pub struct NavApi {
    /// Module initialization.
    pub initialize: InitializeFn,
    /// Module teardown.
    pub cleanup: CleanupFn,
    /// NavMesh build.
    pub build: BuildFn,
    /// Restore a previously built NavMesh.
    pub load_navmesh: LoadNavMeshFn,
    /// Path query on the current NavMesh.
    pub find_path: FindPathFn,
    /// Release for [`crate::RawBuildResult`].
    pub free_build_result: FreeBuildResultFn,
    /// Release for [`crate::RawPathResult`].
    pub free_path_result: FreePathResultFn,
    /// Polygon count of the current NavMesh.
    pub poly_count: CountFn,
    /// Vertex count of the current NavMesh.
    pub vertex_count: CountFn,
}
