//! Build command implementation.

use super::NativeArgs;
use navbridge_core::{
    triangles_from_indices, BuildSettings, GeometryBuffer, NavError, NavResult, Vec3,
};
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Mesh input file.
///
/// Triangles may be given as `triangles` (index triples) or as a flat
/// `indices` list; not both.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct MeshFile {
    /// Vertex positions in host space.
    pub vertices: Vec<[f32; 3]>,
    /// Triangles as index triples.
    pub triangles: Vec<[u32; 3]>,
    /// Triangles as a flat index list.
    pub indices: Vec<u32>,
}

impl MeshFile {
    /// Vertices and triangles ready for a [`GeometryBuffer`].
    pub fn into_geometry(self) -> NavResult<(Vec<Vec3>, Vec<[u32; 3]>)> {
        let vertices = self.vertices.into_iter().map(Vec3::from_array).collect();
        let triangles = if self.indices.is_empty() {
            self.triangles
        } else if self.triangles.is_empty() {
            triangles_from_indices(&self.indices)?
        } else {
            return Err(NavError::invalid_input(
                "mesh file has both triangles and indices",
            ));
        };
        Ok((vertices, triangles))
    }
}

/// Runs the build command.
pub fn run(
    native: &NativeArgs,
    mesh: &Path,
    settings: Option<&Path>,
    out: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    let mesh: MeshFile = serde_json::from_str(&fs::read_to_string(mesh)?)?;
    let settings = match settings {
        Some(path) => serde_json::from_str(&fs::read_to_string(path)?)?,
        None => BuildSettings::default(),
    };
    let (vertices, triangles) = mesh.into_geometry()?;

    let mut session = native.open_session()?;
    let data = session
        .build(&GeometryBuffer::new(&vertices, &triangles), &settings)
        .into_result()?;
    data.write_to(out)?;

    println!("Wrote {} bytes to {}", data.len(), out.display());
    if let Ok(stats) = session.stats() {
        println!("  Polygons: {}", stats.poly_count);
        println!("  Vertices: {}", stats.vertex_count);
    }
    Ok(())
}
