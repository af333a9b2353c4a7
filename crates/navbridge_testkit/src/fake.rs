//! An in-process fake of the native navigation library.
//!
//! The fake implements every `nav_*` entry point in Rust. It keeps one
//! current mesh per thread (the test harness runs each test on its own
//! thread) and records every allocation it hands out, so tests can check
//! that each result is released exactly once.
//!
//! Built meshes are encoded as `FNAV | vertex_count | poly_count | vertices`,
//! which `nav_load_navmesh` accepts back. Paths are the straight line from
//! start to end unless overridden with [`set_path`].

use navbridge_ffi::{
    to_native_bool, FfiError, FfiResult, ModuleLoader, NativeModule, NavApi, RawBuildResult,
    RawBuildSettings, RawMeshData, RawPathResult, NATIVE_FALSE, NATIVE_TRUE,
};
use std::cell::RefCell;
use std::collections::HashSet;
use std::ffi::{c_char, CString};
use std::path::Path;
use std::ptr;

const MAGIC: &[u8; 4] = b"FNAV";
const HEADER_LEN: usize = 12;

/// Call and release counts for the current thread.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FakeCounters {
    /// `nav_initialize` calls.
    pub initialize: u32,
    /// `nav_cleanup` calls.
    pub cleanup: u32,
    /// `nav_build` calls.
    pub build: u32,
    /// `nav_load_navmesh` calls.
    pub load: u32,
    /// `nav_find_path` calls.
    pub find_path: u32,
    /// `nav_free_build_result` calls.
    pub build_frees: u32,
    /// `nav_free_path_result` calls.
    pub path_frees: u32,
    /// Frees of a pointer the fake never handed out, or handed out and already freed.
    pub invalid_frees: u32,
    /// Allocations not yet released.
    pub live_allocations: usize,
}

impl FakeCounters {
    /// Native calls that do real work (build, load, path).
    pub fn work_calls(&self) -> u32 {
        self.build + self.load + self.find_path
    }
}

/// Failures to inject on the current thread.
#[derive(Debug, Clone, Default)]
pub struct FakeFailures {
    /// `nav_initialize` reports failure.
    pub initialize: bool,
    /// `nav_build` fails with this message.
    pub build: Option<String>,
    /// `nav_build` fails without any message.
    pub build_silently: bool,
    /// `nav_build` succeeds but returns no data.
    pub build_without_data: bool,
    /// `nav_find_path` fails with this message.
    pub find_path: Option<String>,
}

/// Arguments of the most recent `nav_build` call, copied out of the call.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedBuild {
    /// Interleaved library-space coordinates.
    pub vertices: Vec<f32>,
    /// Triangle indices as received.
    pub indices: Vec<i32>,
    /// Settings as received.
    pub settings: RawBuildSettings,
}

struct Mesh {
    vertex_count: i32,
    poly_count: i32,
}

#[derive(Default)]
struct FakeState {
    counters: FakeCounters,
    failures: FakeFailures,
    mesh: Option<Mesh>,
    last_build: Option<RecordedBuild>,
    path: Option<Vec<[f32; 3]>>,
    live: HashSet<usize>,
}

thread_local! {
    static STATE: RefCell<FakeState> = RefCell::new(FakeState::default());
}

fn with_state<R>(f: impl FnOnce(&mut FakeState) -> R) -> R {
    STATE.with(|state| f(&mut state.borrow_mut()))
}

/// Resets every counter, failure and the current mesh.
pub fn reset() {
    // Allocations still live at this point are leaked on purpose.
    with_state(|s| *s = FakeState::default());
}

/// Snapshot of the counters.
pub fn counters() -> FakeCounters {
    with_state(|s| FakeCounters {
        live_allocations: s.live.len(),
        ..s.counters
    })
}

/// Replaces the injected failures.
pub fn set_failures(failures: FakeFailures) {
    with_state(|s| s.failures = failures);
}

/// Overrides the path returned by `nav_find_path`, in library space.
pub fn set_path(points: Option<Vec<[f32; 3]>>) {
    with_state(|s| s.path = points);
}

/// Arguments of the last build, if any.
pub fn last_build() -> Option<RecordedBuild> {
    with_state(|s| s.last_build.clone())
}

/// Returns true if the fake currently holds a mesh.
pub fn has_mesh() -> bool {
    with_state(|s| s.mesh.is_some())
}

/// Encodes a mesh the way `nav_build` does.
pub fn encode_navmesh(vertices: &[f32], poly_count: i32) -> Vec<u8> {
    let vertex_count = (vertices.len() / 3) as i32;
    let mut blob = Vec::with_capacity(HEADER_LEN + vertices.len() * 4);
    blob.extend_from_slice(MAGIC);
    blob.extend_from_slice(&vertex_count.to_le_bytes());
    blob.extend_from_slice(&poly_count.to_le_bytes());
    for v in &vertices[..vertex_count as usize * 3] {
        blob.extend_from_slice(&v.to_le_bytes());
    }
    blob
}

fn decode_navmesh(blob: &[u8]) -> Option<Mesh> {
    if blob.len() < HEADER_LEN || &blob[..4] != MAGIC {
        return None;
    }
    let vertex_count = i32::from_le_bytes(blob[4..8].try_into().ok()?);
    let poly_count = i32::from_le_bytes(blob[8..12].try_into().ok()?);
    if vertex_count < 0 || poly_count < 0 {
        return None;
    }
    if blob.len() != HEADER_LEN + vertex_count as usize * 12 {
        return None;
    }
    Some(Mesh {
        vertex_count,
        poly_count,
    })
}

impl FakeState {
    fn alloc_bytes(&mut self, bytes: Vec<u8>) -> (*mut u8, i32) {
        let len = bytes.len() as i32;
        let ptr = Box::into_raw(bytes.into_boxed_slice()).cast::<u8>();
        self.live.insert(ptr as usize);
        (ptr, len)
    }

    fn alloc_floats(&mut self, floats: Vec<f32>) -> *mut f32 {
        let ptr = Box::into_raw(floats.into_boxed_slice()).cast::<f32>();
        self.live.insert(ptr as usize);
        ptr
    }

    fn alloc_error(&mut self, message: &str) -> *mut c_char {
        let ptr = CString::new(message).unwrap_or_default().into_raw();
        self.live.insert(ptr as usize);
        ptr
    }

    fn build_error(&mut self, message: Option<&str>) -> RawBuildResult {
        RawBuildResult {
            error_ptr: message.map_or(ptr::null_mut(), |m| self.alloc_error(m)),
            ..RawBuildResult::empty()
        }
    }

    fn path_error(&mut self, message: &str) -> RawPathResult {
        RawPathResult {
            error_ptr: self.alloc_error(message),
            ..RawPathResult::empty()
        }
    }

    /// Removes `addr` from the live set, counting it as invalid if absent.
    fn release(&mut self, addr: usize) -> bool {
        if self.live.remove(&addr) {
            true
        } else {
            self.counters.invalid_frees += 1;
            false
        }
    }
}

unsafe extern "C" fn fake_initialize() -> i32 {
    with_state(|s| {
        s.counters.initialize += 1;
        to_native_bool(!s.failures.initialize)
    })
}

unsafe extern "C" fn fake_cleanup() {
    with_state(|s| {
        s.counters.cleanup += 1;
        s.mesh = None;
    });
}

unsafe extern "C" fn fake_build(
    mesh: *const RawMeshData,
    settings: *const RawBuildSettings,
) -> RawBuildResult {
    with_state(|s| {
        s.counters.build += 1;
        s.mesh = None;
        if mesh.is_null() || settings.is_null() {
            return s.build_error(Some("null argument"));
        }

        // Safety: the caller passes valid pointers for the duration of the call.
        let (mesh, settings) = unsafe { (&*mesh, *settings) };
        if mesh.vertex_count <= 0
            || mesh.index_count <= 0
            || mesh.vertex_ptr.is_null()
            || mesh.index_ptr.is_null()
        {
            return s.build_error(Some("empty geometry"));
        }

        // Safety: the counts describe the caller's arrays.
        let (vertices, indices) = unsafe {
            (
                std::slice::from_raw_parts(mesh.vertex_ptr, mesh.vertex_count as usize * 3).to_vec(),
                std::slice::from_raw_parts(mesh.index_ptr, mesh.index_count as usize).to_vec(),
            )
        };
        s.last_build = Some(RecordedBuild {
            vertices: vertices.clone(),
            indices: indices.clone(),
            settings,
        });

        if let Some(message) = s.failures.build.clone() {
            return s.build_error(Some(&message));
        }
        if s.failures.build_silently {
            return s.build_error(None);
        }
        if indices.iter().any(|i| *i < 0 || *i >= mesh.vertex_count) {
            return s.build_error(Some("triangle index out of range"));
        }

        let poly_count = mesh.index_count / 3;
        s.mesh = Some(Mesh {
            vertex_count: mesh.vertex_count,
            poly_count,
        });

        if s.failures.build_without_data {
            return RawBuildResult {
                success_flag: NATIVE_TRUE,
                ..RawBuildResult::empty()
            };
        }

        let (data_ptr, data_size) = s.alloc_bytes(encode_navmesh(&vertices, poly_count));
        RawBuildResult {
            data_ptr,
            data_size,
            success_flag: NATIVE_TRUE,
            error_ptr: ptr::null_mut(),
        }
    })
}

unsafe extern "C" fn fake_load_navmesh(data: *const u8, size: i32) -> RawBuildResult {
    with_state(|s| {
        s.counters.load += 1;
        s.mesh = None;
        if data.is_null() || size <= 0 {
            return s.build_error(Some("empty navmesh data"));
        }
        // Safety: `size` readable bytes for the duration of the call.
        let blob = unsafe { std::slice::from_raw_parts(data, size as usize) };
        match decode_navmesh(blob) {
            Some(mesh) => {
                s.mesh = Some(mesh);
                RawBuildResult {
                    success_flag: NATIVE_TRUE,
                    ..RawBuildResult::empty()
                }
            }
            None => s.build_error(Some("invalid navmesh data")),
        }
    })
}

unsafe extern "C" fn fake_find_path(
    start_x: f32,
    start_y: f32,
    start_z: f32,
    end_x: f32,
    end_y: f32,
    end_z: f32,
) -> RawPathResult {
    with_state(|s| {
        s.counters.find_path += 1;
        if s.mesh.is_none() {
            return s.path_error("no mesh loaded");
        }
        if let Some(message) = s.failures.find_path.clone() {
            return s.path_error(&message);
        }

        let points = s
            .path
            .clone()
            .unwrap_or_else(|| vec![[start_x, start_y, start_z], [end_x, end_y, end_z]]);
        if points.is_empty() {
            return RawPathResult {
                success_flag: NATIVE_TRUE,
                ..RawPathResult::empty()
            };
        }

        let point_count = points.len() as i32;
        let flat: Vec<f32> = points.into_iter().flatten().collect();
        RawPathResult {
            points_ptr: s.alloc_floats(flat),
            point_count,
            success_flag: NATIVE_TRUE,
            error_ptr: ptr::null_mut(),
        }
    })
}

unsafe extern "C" fn fake_free_build_result(result: *mut RawBuildResult) {
    with_state(|s| {
        s.counters.build_frees += 1;
        if result.is_null() {
            s.counters.invalid_frees += 1;
            return;
        }
        // Safety: the caller passes the result it received.
        let result = unsafe { &mut *result };
        if !result.data_ptr.is_null() && s.release(result.data_ptr as usize) {
            let len = result.data_size as usize;
            // Safety: allocated by `alloc_bytes` with this length.
            drop(unsafe { Box::from_raw(ptr::slice_from_raw_parts_mut(result.data_ptr, len)) });
        }
        if !result.error_ptr.is_null() && s.release(result.error_ptr as usize) {
            // Safety: allocated by `alloc_error`.
            drop(unsafe { CString::from_raw(result.error_ptr) });
        }
        result.data_ptr = ptr::null_mut();
        result.data_size = 0;
        result.error_ptr = ptr::null_mut();
        result.success_flag = NATIVE_FALSE;
    });
}

unsafe extern "C" fn fake_free_path_result(result: *mut RawPathResult) {
    with_state(|s| {
        s.counters.path_frees += 1;
        if result.is_null() {
            s.counters.invalid_frees += 1;
            return;
        }
        // Safety: the caller passes the result it received.
        let result = unsafe { &mut *result };
        if !result.points_ptr.is_null() && s.release(result.points_ptr as usize) {
            let len = result.point_count as usize * 3;
            // Safety: allocated by `alloc_floats` with this length.
            drop(unsafe { Box::from_raw(ptr::slice_from_raw_parts_mut(result.points_ptr, len)) });
        }
        if !result.error_ptr.is_null() && s.release(result.error_ptr as usize) {
            // Safety: allocated by `alloc_error`.
            drop(unsafe { CString::from_raw(result.error_ptr) });
        }
        result.points_ptr = ptr::null_mut();
        result.point_count = 0;
        result.error_ptr = ptr::null_mut();
        result.success_flag = NATIVE_FALSE;
    });
}

unsafe extern "C" fn fake_poly_count() -> i32 {
    with_state(|s| s.mesh.as_ref().map_or(0, |m| m.poly_count))
}

unsafe extern "C" fn fake_vertex_count() -> i32 {
    with_state(|s| s.mesh.as_ref().map_or(0, |m| m.vertex_count))
}

/// The fake's entry-point table.
pub fn fake_api() -> NavApi {
    NavApi {
        initialize: fake_initialize,
        cleanup: fake_cleanup,
        build: fake_build,
        load_navmesh: fake_load_navmesh,
        find_path: fake_find_path,
        free_build_result: fake_free_build_result,
        free_path_result: fake_free_path_result,
        poly_count: fake_poly_count,
        vertex_count: fake_vertex_count,
    }
}

/// A module backed by the fake.
pub fn fake_module() -> NativeModule {
    // Safety: the fake entry points follow the native contract and are
    // static functions of this binary.
    unsafe { NativeModule::from_static_api(fake_api()) }
}

/// A [`ModuleLoader`] that hands out [`fake_module`] for any path.
#[derive(Debug, Clone, Copy, Default)]
pub struct FakeLoader {
    missing: bool,
}

impl FakeLoader {
    /// A loader that behaves as if the module file does not exist.
    pub fn missing() -> Self {
        Self { missing: true }
    }
}

impl ModuleLoader for FakeLoader {
    fn load(&self, path: &Path) -> FfiResult<NativeModule> {
        if self.missing {
            return Err(FfiError::LibraryLoad {
                path: path.to_path_buf(),
                message: "no such module".into(),
            });
        }
        Ok(fake_module())
    }
}
