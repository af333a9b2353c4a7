//! Host-owned results of builds and queries.

use crate::error::{NavError, NavResult};
use glam::Vec3;
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

/// A serialized NavMesh as produced by the native library.
///
/// The format belongs to the native library; the host only moves the blob
/// around whole.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavMeshData {
    bytes: Vec<u8>,
}

impl NavMeshData {
    /// Wraps bytes previously produced by a build.
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    /// The raw blob.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Consumes the wrapper.
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// Size in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Returns true if the blob is empty.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Writes the whole blob to `path`, replacing any existing file.
    pub fn write_to(&self, path: &Path) -> NavResult<()> {
        let mut file = File::create(path)?;
        file.write_all(&self.bytes)?;
        file.sync_all()?;
        Ok(())
    }

    /// Reads a whole blob from `path`.
    ///
    /// # Errors
    ///
    /// Returns [`NavError::InvalidInput`] if the file is empty.
    pub fn read_from(path: &Path) -> NavResult<Self> {
        let bytes = fs::read(path)?;
        if bytes.is_empty() {
            return Err(NavError::invalid_input(format!(
                "navmesh file {} is empty",
                path.display()
            )));
        }
        Ok(Self { bytes })
    }
}

/// Polygon and vertex counts of the current NavMesh.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MeshStats {
    /// Number of polygons.
    pub poly_count: u32,
    /// Number of vertices.
    pub vertex_count: u32,
}

/// Outcome of a build.
///
/// Holds either the NavMesh or the error, never both and never neither.
#[derive(Debug)]
pub struct BuildResult {
    outcome: Result<NavMeshData, NavError>,
}

impl BuildResult {
    /// A successful build.
    pub fn succeeded(data: NavMeshData) -> Self {
        Self { outcome: Ok(data) }
    }

    /// A failed build.
    pub fn failed(error: NavError) -> Self {
        Self {
            outcome: Err(error),
        }
    }

    /// Returns true if the build produced a NavMesh.
    pub fn success(&self) -> bool {
        self.outcome.is_ok()
    }

    /// The NavMesh, on success.
    pub fn data(&self) -> Option<&NavMeshData> {
        self.outcome.as_ref().ok()
    }

    /// The failure, if any.
    pub fn error(&self) -> Option<&NavError> {
        self.outcome.as_ref().err()
    }

    /// The failure as text, if any.
    pub fn error_message(&self) -> Option<String> {
        self.error().map(ToString::to_string)
    }

    /// Converts into a standard `Result`.
    pub fn into_result(self) -> NavResult<NavMeshData> {
        self.outcome
    }
}

/// Outcome of a path query.
///
/// On success the points are in host space, in path order.
#[derive(Debug)]
pub struct PathResult {
    outcome: Result<Vec<Vec3>, NavError>,
}

impl PathResult {
    /// A successful query.
    pub fn succeeded(points: Vec<Vec3>) -> Self {
        Self {
            outcome: Ok(points),
        }
    }

    /// A failed query.
    pub fn failed(error: NavError) -> Self {
        Self {
            outcome: Err(error),
        }
    }

    /// Returns true if the query produced a path.
    pub fn success(&self) -> bool {
        self.outcome.is_ok()
    }

    /// The path, on success.
    pub fn points(&self) -> Option<&[Vec3]> {
        self.outcome.as_deref().ok()
    }

    /// The failure, if any.
    pub fn error(&self) -> Option<&NavError> {
        self.outcome.as_ref().err()
    }

    /// The failure as text, if any.
    pub fn error_message(&self) -> Option<String> {
        self.error().map(ToString::to_string)
    }

    /// Converts into a standard `Result`.
    pub fn into_result(self) -> NavResult<Vec<Vec3>> {
        self.outcome
    }
}
