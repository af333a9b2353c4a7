//! # navbridge FFI
//!
//! The C ABI between the host and the native navigation library.
//!
//! This crate provides:
//! - `#[repr(C)]` boundary structs with fixed sequential layout
//! - The native entry-point table and its exported symbol names
//! - Dynamic loading of the native module
//! - Release guards that free native-owned buffers exactly once
//!
//! ## Memory ownership
//!
//! Every result struct returned by the native side owns native memory.
//! [`NativeBuildResult`] and [`NativePathResult`] hand that memory out only
//! as borrows of the guard and call the matching release entry point when
//! dropped, so a released buffer cannot be read again from safe code.
//!
//! ## Booleans
//!
//! Boolean fields cross the boundary as `i32` (see [`to_native_bool`]),
//! never as a Rust `bool`, because native calling conventions disagree on
//! boolean width.

#![warn(missing_docs)]

mod api;
mod buffer;
mod error;
mod loader;
mod types;

pub use api::{
    symbols, BuildFn, CleanupFn, CountFn, FindPathFn, FreeBuildResultFn, FreePathResultFn,
    InitializeFn, LoadNavMeshFn, NavApi,
};
pub use buffer::{NativeBuildResult, NativePathResult};
pub use error::{FfiError, FfiResult};
pub use loader::{DynamicLoader, ModuleLoader, NativeModule};
pub use types::{
    from_native_bool, to_native_bool, RawBuildResult, RawBuildSettings, RawMeshData,
    RawPathResult, NATIVE_FALSE, NATIVE_TRUE,
};
