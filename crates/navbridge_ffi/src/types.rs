//! Boundary struct definitions.
//!
//! Field order mirrors the native calling convention and must never change.
//! Counts and sizes are `i32` because that is the native count width.

use std::ffi::c_char;

/// Native encoding of `true`.
pub const NATIVE_TRUE: i32 = 1;
/// Native encoding of `false`.
pub const NATIVE_FALSE: i32 = 0;

/// Encodes a boolean as the fixed-width native flag.
#[inline]
pub fn to_native_bool(value: bool) -> i32 {
    if value {
        NATIVE_TRUE
    } else {
        NATIVE_FALSE
    }
}

/// Decodes a native flag. Any non-zero value is `true`.
#[inline]
pub fn from_native_bool(flag: i32) -> bool {
    flag != NATIVE_FALSE
}

/// Input geometry handed to the native build entry point.
///
/// `vertex_ptr` points at `vertex_count * 3` floats (x, y, z per vertex).
/// `index_ptr` points at `index_count` indices, three per triangle.
/// Both arrays are owned by the caller and only borrowed for one call.
#[repr(C)]
#[derive(Debug)]
pub struct RawMeshData {
    /// Interleaved vertex coordinates.
    pub vertex_ptr: *const f32,
    /// Triangle vertex indices.
    pub index_ptr: *const i32,
    /// Number of vertices (not floats).
    pub vertex_count: i32,
    /// Number of indices (three per triangle).
    pub index_count: i32,
}

/// Build tunables in native units.
///
/// The first eleven fields are the stable core layout; the two trailing
/// fields extend it without reordering.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawBuildSettings {
    /// Voxel size on the horizontal plane.
    pub cell_size: f32,
    /// Voxel size on the up axis.
    pub cell_height: f32,
    /// Steepest walkable slope, in degrees.
    pub walkable_slope_angle: f32,
    /// Minimum clearance an agent needs.
    pub walkable_height: f32,
    /// Agent radius used to erode walkable area.
    pub walkable_radius: f32,
    /// Highest ledge an agent can step up.
    pub walkable_climb: f32,
    /// Regions smaller than this are discarded.
    pub min_region_area: f32,
    /// Regions smaller than this are merged into neighbours.
    pub merge_region_area: f32,
    /// Polygon vertex limit.
    pub max_verts_per_poly: i32,
    /// Detail mesh sampling distance.
    pub detail_sample_dist: f32,
    /// Maximum detail mesh deviation.
    pub detail_sample_max_error: f32,
    /// Maximum contour edge length.
    pub max_edge_len: f32,
    /// Maximum contour simplification deviation.
    pub max_simplification_error: f32,
}

/// Result of a native build or mesh load.
///
/// On success `data_ptr`/`data_size` describe the serialized NavMesh and
/// `error_ptr` is null. On failure `error_ptr` is a NUL-terminated message.
/// Release with the module's `free_build_result` entry point.
#[repr(C)]
#[derive(Debug)]
pub struct RawBuildResult {
    /// Native-owned NavMesh bytes.
    pub data_ptr: *mut u8,
    /// Length of `data_ptr` in bytes.
    pub data_size: i32,
    /// Non-zero on success.
    pub success_flag: i32,
    /// Native-owned error text.
    pub error_ptr: *mut c_char,
}

/// Result of a native path query.
///
/// `points_ptr` holds `point_count * 3` floats. Release with the module's
/// `free_path_result` entry point.
#[repr(C)]
#[derive(Debug)]
pub struct RawPathResult {
    /// Native-owned interleaved path points.
    pub points_ptr: *mut f32,
    /// Number of points (not floats).
    pub point_count: i32,
    /// Non-zero on success.
    pub success_flag: i32,
    /// Native-owned error text.
    pub error_ptr: *mut c_char,
}

impl RawBuildResult {
    /// An empty failed result with no owned memory.
    pub fn empty() -> Self {
        Self {
            data_ptr: std::ptr::null_mut(),
            data_size: 0,
            success_flag: NATIVE_FALSE,
            error_ptr: std::ptr::null_mut(),
        }
    }
}

impl RawPathResult {
    /// An empty failed result with no owned memory.
    pub fn empty() -> Self {
        Self {
            points_ptr: std::ptr::null_mut(),
            point_count: 0,
            success_flag: NATIVE_FALSE,
            error_ptr: std::ptr::null_mut(),
        }
    }
}
