//! Release guards for native-owned results.

use crate::api::{FreeBuildResultFn, FreePathResultFn};
use crate::types::{from_native_bool, RawBuildResult, RawPathResult};
use std::ffi::CStr;
use std::marker::PhantomData;

/// A build result whose memory still belongs to the native module.
///
/// Memory is owned by the native side. The guard calls
/// `nav_free_build_result` exactly once when dropped; everything it exposes
/// borrows the guard, so nothing can be read after the release.
#[derive(Debug)]
pub struct NativeBuildResult<'m> {
    raw: RawBuildResult,
    free: FreeBuildResultFn,
    _module: PhantomData<&'m ()>,
}

impl<'m> NativeBuildResult<'m> {
    pub(crate) fn new(raw: RawBuildResult, free: FreeBuildResultFn) -> Self {
        Self {
            raw,
            free,
            _module: PhantomData,
        }
    }

    /// Returns true if the native call reported success.
    pub fn succeeded(&self) -> bool {
        from_native_bool(self.raw.success_flag)
    }

    /// Borrows the NavMesh bytes, if any were returned.
    pub fn data(&self) -> Option<&[u8]> {
        if self.raw.data_ptr.is_null() || self.raw.data_size <= 0 {
            return None;
        }
        // Safety: the native side guarantees `data_size` readable bytes until
        // the result is released, which only happens in `Drop`.
        Some(unsafe { std::slice::from_raw_parts(self.raw.data_ptr, self.raw.data_size as usize) })
    }

    /// Copies the native error text, if any.
    pub fn error_message(&self) -> Option<String> {
        // Safety: see `copy_error`.
        unsafe { copy_error(self.raw.error_ptr) }
    }
}

impl Drop for NativeBuildResult<'_> {
    fn drop(&mut self) {
        // Safety: `raw` came from the same module as `free` and is released once.
        unsafe { (self.free)(&mut self.raw) };
    }
}

/// A path result whose memory still belongs to the native module.
///
/// Calls `nav_free_path_result` exactly once when dropped.
#[derive(Debug)]
pub struct NativePathResult<'m> {
    raw: RawPathResult,
    free: FreePathResultFn,
    _module: PhantomData<&'m ()>,
}

impl<'m> NativePathResult<'m> {
    pub(crate) fn new(raw: RawPathResult, free: FreePathResultFn) -> Self {
        Self {
            raw,
            free,
            _module: PhantomData,
        }
    }

    /// Returns true if the native call reported success.
    pub fn succeeded(&self) -> bool {
        from_native_bool(self.raw.success_flag)
    }

    /// Number of points reported by the native side.
    pub fn point_count(&self) -> usize {
        self.raw.point_count.max(0) as usize
    }

    /// Borrows the interleaved path coordinates (`point_count * 3` floats).
    pub fn coordinates(&self) -> Option<&[f32]> {
        if self.raw.points_ptr.is_null() || self.raw.point_count <= 0 {
            return None;
        }
        let len = self.point_count() * 3;
        // Safety: the native side guarantees `point_count * 3` floats until release.
        Some(unsafe { std::slice::from_raw_parts(self.raw.points_ptr, len) })
    }

    /// Copies the native error text, if any.
    pub fn error_message(&self) -> Option<String> {
        // Safety: see `copy_error`.
        unsafe { copy_error(self.raw.error_ptr) }
    }
}

impl Drop for NativePathResult<'_> {
    fn drop(&mut self) {
        // Safety: `raw` came from the same module as `free` and is released once.
        unsafe { (self.free)(&mut self.raw) };
    }
}

/// Copies a NUL-terminated native string into an owned `String`.
///
/// Invalid UTF-8 is replaced rather than rejected; an empty message is
/// treated as absent.
///
/// # Safety
///
/// `ptr` must be null or point at a NUL-terminated string that stays valid
/// for the duration of the call.
unsafe fn copy_error(ptr: *const std::ffi::c_char) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    let text = CStr::from_ptr(ptr).to_string_lossy().into_owned();
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::NATIVE_TRUE;
    use std::cell::Cell;
    use std::ffi::CString;

    thread_local! {
        static BUILD_FREES: Cell<usize> = const { Cell::new(0) };
        static PATH_FREES: Cell<usize> = const { Cell::new(0) };
    }

    unsafe extern "C" fn free_build(result: *mut RawBuildResult) {
        BUILD_FREES.with(|c| c.set(c.get() + 1));
        let result = &mut *result;
        if !result.data_ptr.is_null() {
            let len = result.data_size as usize;
            drop(Vec::from_raw_parts(result.data_ptr, len, len));
            result.data_ptr = std::ptr::null_mut();
        }
        if !result.error_ptr.is_null() {
            drop(CString::from_raw(result.error_ptr));
            result.error_ptr = std::ptr::null_mut();
        }
    }

    unsafe extern "C" fn free_path(result: *mut RawPathResult) {
        PATH_FREES.with(|c| c.set(c.get() + 1));
        let result = &mut *result;
        if !result.points_ptr.is_null() {
            let len = result.point_count as usize * 3;
            drop(Vec::from_raw_parts(result.points_ptr, len, len));
            result.points_ptr = std::ptr::null_mut();
        }
    }

    fn leak_bytes(bytes: Vec<u8>) -> (*mut u8, i32) {
        let mut boxed = bytes.into_boxed_slice();
        let ptr = boxed.as_mut_ptr();
        let len = boxed.len() as i32;
        std::mem::forget(boxed);
        (ptr, len)
    }

    #[test]
    fn build_guard_exposes_data_and_frees_once() {
        BUILD_FREES.with(|c| c.set(0));
        let (data_ptr, data_size) = leak_bytes(vec![1, 2, 3]);
        let raw = RawBuildResult {
            data_ptr,
            data_size,
            success_flag: NATIVE_TRUE,
            error_ptr: std::ptr::null_mut(),
        };

        {
            let guard = NativeBuildResult::new(raw, free_build);
            assert!(guard.succeeded());
            assert_eq!(guard.data(), Some(&[1u8, 2, 3][..]));
            assert_eq!(guard.error_message(), None);
        }

        assert_eq!(BUILD_FREES.with(Cell::get), 1);
    }

    #[test]
    fn build_guard_copies_error() {
        BUILD_FREES.with(|c| c.set(0));
        let raw = RawBuildResult {
            error_ptr: CString::new("bad mesh").unwrap().into_raw(),
            ..RawBuildResult::empty()
        };

        let message = {
            let guard = NativeBuildResult::new(raw, free_build);
            assert!(!guard.succeeded());
            assert!(guard.data().is_none());
            guard.error_message()
        };

        assert_eq!(message.as_deref(), Some("bad mesh"));
        assert_eq!(BUILD_FREES.with(Cell::get), 1);
    }

    #[test]
    fn path_guard_exposes_coordinates() {
        PATH_FREES.with(|c| c.set(0));
        let mut coords = vec![0.0f32, 1.0, 2.0, 3.0, 4.0, 5.0].into_boxed_slice();
        let points_ptr = coords.as_mut_ptr();
        std::mem::forget(coords);

        let raw = RawPathResult {
            points_ptr,
            point_count: 2,
            success_flag: NATIVE_TRUE,
            error_ptr: std::ptr::null_mut(),
        };

        {
            let guard = NativePathResult::new(raw, free_path);
            assert_eq!(guard.point_count(), 2);
            assert_eq!(guard.coordinates().map(<[f32]>::len), Some(6));
        }

        assert_eq!(PATH_FREES.with(Cell::get), 1);
    }

    #[test]
    fn empty_error_text_is_absent() {
        let empty = CString::new("").unwrap();
        // Safety: `empty` outlives the call.
        assert_eq!(unsafe { copy_error(empty.as_ptr()) }, None);
        // Safety: null is accepted.
        assert_eq!(unsafe { copy_error(std::ptr::null()) }, None);
    }
}
