//! # navbridge Core
//!
//! Safe host-side API over a native NavMesh library.
//!
//! This crate provides:
//! - Coordinate transforms between the host and library conventions
//! - Boundary marshaling for builds, mesh loads and path queries
//! - The native module handle and its load/unload lifecycle
//! - Content fingerprints for module files
//!
//! ## Flow
//!
//! A [`NavMeshSession`] owns one [`NativeModuleHandle`]. Geometry enters as a
//! [`GeometryBuffer`], is validated, transformed into library space exactly
//! once and flattened into the native arrays. Results come back as
//! [`BuildResult`] / [`PathResult`] holding host-owned copies; the native
//! buffers are released before the call returns.
//!
//! ## Threading
//!
//! Calls against one handle must be serialized by the caller. Session
//! methods take `&mut self` and the handle is `Send` but not `Sync`, so safe
//! code cannot issue two native calls on the same module concurrently.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod error;
mod fingerprint;
mod geometry;
mod handle;
mod results;
mod session;
mod settings;
mod transform;

pub use config::SessionConfig;
pub use error::{ErrorKind, NavError, NavResult};
pub use fingerprint::Fingerprint;
pub use geometry::{triangles_from_indices, GeometryBuffer};
pub use handle::{module_file_in_use, ModuleState, NativeModuleHandle};
pub use results::{BuildResult, MeshStats, NavMeshData, PathResult};
pub use session::NavMeshSession;
pub use settings::BuildSettings;
pub use transform::{
    to_host_space, to_host_space_batch, to_library_space, to_library_space_batch, AxisRotation,
    CoordinateSystem, CoordinateTransform,
};

pub use glam::Vec3;

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
