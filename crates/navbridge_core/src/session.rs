//! Boundary marshaling for builds, mesh loads and path queries.

use crate::config::SessionConfig;
use crate::error::{NavError, NavResult};
use crate::geometry::GeometryBuffer;
use crate::handle::NativeModuleHandle;
use crate::results::{BuildResult, MeshStats, NavMeshData, PathResult};
use crate::settings::BuildSettings;
use crate::transform::CoordinateTransform;
use glam::Vec3;
use navbridge_ffi::NativeModule;
use tracing::{debug, info, warn};

/// A build/query session over one native module.
///
/// The session owns its [`NativeModuleHandle`] so independent sessions never
/// share hidden state. Every point is transformed exactly once per
/// direction, here and nowhere else: vertices and query endpoints on the
/// way in, path points on the way out.
///
/// # Example
///
/// ```rust,ignore
/// use navbridge_core::{BuildSettings, GeometryBuffer, NativeModuleHandle, NavMeshSession, SessionConfig, Vec3};
///
/// let mut handle = NativeModuleHandle::new("plugins/libnavmesh.so");
/// handle.init()?;
/// let mut session = NavMeshSession::new(handle, SessionConfig::default());
///
/// let result = session.build(&GeometryBuffer::new(&vertices, &triangles), &BuildSettings::default());
/// let path = session.find_path(Vec3::new(1.0, 0.0, 1.0), Vec3::new(9.0, 0.0, 9.0));
/// ```
#[derive(Debug)]
pub struct NavMeshSession {
    handle: NativeModuleHandle,
    transform: CoordinateTransform,
}

impl NavMeshSession {
    /// Creates a session owning `handle`.
    pub fn new(handle: NativeModuleHandle, config: SessionConfig) -> Self {
        Self {
            handle,
            transform: config.transform(),
        }
    }

    /// The owned handle.
    pub fn handle(&self) -> &NativeModuleHandle {
        &self.handle
    }

    /// The owned handle, for lifecycle calls.
    pub fn handle_mut(&mut self) -> &mut NativeModuleHandle {
        &mut self.handle
    }

    /// Releases the handle from the session.
    pub fn into_handle(self) -> NativeModuleHandle {
        self.handle
    }

    /// The session's coordinate transform.
    pub fn transform(&self) -> CoordinateTransform {
        self.transform
    }

    /// Builds a NavMesh from caller geometry.
    ///
    /// Invalid geometry or settings fail without calling into the module.
    /// The native result is copied into host memory and released before
    /// this returns. On success the mesh statistics become queryable.
    pub fn build(&mut self, geometry: &GeometryBuffer<'_>, settings: &BuildSettings) -> BuildResult {
        match self.try_build(geometry, settings) {
            Ok(data) => BuildResult::succeeded(data),
            Err(e) => {
                warn!(error = %e, "navmesh build failed");
                BuildResult::failed(e)
            }
        }
    }

    fn try_build(
        &mut self,
        geometry: &GeometryBuffer<'_>,
        settings: &BuildSettings,
    ) -> NavResult<NavMeshData> {
        geometry.validate()?;
        settings.validate()?;
        let module = self.handle.module()?;

        let vertices = self.transform.flatten_to_library(geometry.vertices());
        let mut indices = Vec::with_capacity(geometry.triangles().len() * 3);
        for triangle in geometry.triangles() {
            for index in self.transform.orient_triangle(*triangle) {
                // validate() bounded every index by the vertex count, which fits i32.
                indices.push(i32::try_from(index).unwrap_or(i32::MAX));
            }
        }
        let raw_settings = settings.to_raw();

        debug!(
            vertices = geometry.vertices().len(),
            triangles = geometry.triangles().len(),
            "calling native build"
        );

        let copied = {
            let native = module.build(&vertices, &indices, &raw_settings)?;
            copy_build_result(&native, "build")
        };

        let data = match copied {
            Ok(data) => data,
            Err(e) => {
                self.handle.set_mesh_stats(None);
                return Err(e);
            }
        };

        let stats = read_stats(self.handle.module()?);
        self.handle.set_mesh_stats(Some(stats));
        info!(
            bytes = data.len(),
            polys = stats.poly_count,
            verts = stats.vertex_count,
            "navmesh built"
        );
        Ok(data)
    }

    /// Restores a NavMesh from bytes previously returned by [`Self::build`].
    ///
    /// # Errors
    ///
    /// Returns [`NavError::InvalidInput`] for an empty blob,
    /// [`NavError::ModuleNotLoaded`] before `init`, and
    /// [`NavError::NativeCallFailure`] if the module rejects the data.
    pub fn load_nav_mesh(&mut self, data: &[u8]) -> NavResult<MeshStats> {
        if data.is_empty() {
            return Err(NavError::invalid_input("empty navmesh data"));
        }
        let outcome = {
            let native = self.handle.module()?.load_navmesh(data)?;
            if native.succeeded() {
                Ok(())
            } else {
                Err(NavError::native_failure(
                    native
                        .error_message()
                        .unwrap_or_else(|| "load failed without a message".into()),
                ))
            }
        };

        if let Err(e) = outcome {
            self.handle.set_mesh_stats(None);
            return Err(e);
        }

        let stats = read_stats(self.handle.module()?);
        self.handle.set_mesh_stats(Some(stats));
        info!(bytes = data.len(), polys = stats.poly_count, "navmesh loaded");
        Ok(stats)
    }

    /// Finds a path between two host-space points.
    ///
    /// The endpoints are transformed into library space, the returned points
    /// back into host space.
    pub fn find_path(&mut self, start: Vec3, end: Vec3) -> PathResult {
        match self.try_find_path(start, end) {
            Ok(points) => PathResult::succeeded(points),
            Err(e) => {
                debug!(error = %e, "path query failed");
                PathResult::failed(e)
            }
        }
    }

    fn try_find_path(&self, start: Vec3, end: Vec3) -> NavResult<Vec<Vec3>> {
        let module = self.handle.module()?;
        if self.handle.mesh_stats().is_none() {
            return Err(NavError::NoMeshLoaded);
        }
        if !start.is_finite() || !end.is_finite() {
            return Err(NavError::invalid_input("query point has a non-finite coordinate"));
        }

        let native = module.find_path(
            self.transform.to_library(start).to_array(),
            self.transform.to_library(end).to_array(),
        );

        if !native.succeeded() {
            return Err(NavError::native_failure(
                native
                    .error_message()
                    .unwrap_or_else(|| "path query failed without a message".into()),
            ));
        }

        let coordinates = native.coordinates().unwrap_or(&[]);
        Ok(self.transform.unflatten_to_host(coordinates))
    }

    /// Polygon and vertex counts of the current NavMesh.
    ///
    /// # Errors
    ///
    /// Returns [`NavError::ModuleNotLoaded`] or [`NavError::NoMeshLoaded`].
    pub fn stats(&self) -> NavResult<MeshStats> {
        self.handle.module()?;
        self.handle.mesh_stats().ok_or(NavError::NoMeshLoaded)
    }

    /// Returns true if a build or load has succeeded since the last unload.
    pub fn has_mesh(&self) -> bool {
        self.handle.mesh_stats().is_some()
    }
}

fn copy_build_result(
    native: &navbridge_ffi::NativeBuildResult<'_>,
    operation: &str,
) -> NavResult<NavMeshData> {
    if !native.succeeded() {
        return Err(NavError::native_failure(
            native
                .error_message()
                .unwrap_or_else(|| format!("{operation} failed without a message")),
        ));
    }
    match native.data() {
        Some(bytes) => Ok(NavMeshData::from_bytes(bytes.to_vec())),
        None => Err(NavError::native_failure(format!(
            "{operation} reported success without data"
        ))),
    }
}

fn read_stats(module: &NativeModule) -> MeshStats {
    MeshStats {
        poly_count: u32::try_from(module.poly_count()).unwrap_or(0),
        vertex_count: u32::try_from(module.vertex_count()).unwrap_or(0),
    }
}
