//! Caller-owned input geometry.

use crate::error::{NavError, NavResult};
use glam::Vec3;

/// Vertices and triangles borrowed from the caller for one build call.
///
/// The core never mutates or retains the buffer; it is flattened into
/// library-space arrays inside [`crate::NavMeshSession::build`].
#[derive(Debug, Clone, Copy)]
pub struct GeometryBuffer<'a> {
    vertices: &'a [Vec3],
    triangles: &'a [[u32; 3]],
}

impl<'a> GeometryBuffer<'a> {
    /// Wraps caller-owned vertices and triangles.
    pub fn new(vertices: &'a [Vec3], triangles: &'a [[u32; 3]]) -> Self {
        Self {
            vertices,
            triangles,
        }
    }

    /// The vertices, in host space.
    pub fn vertices(&self) -> &'a [Vec3] {
        self.vertices
    }

    /// The triangles as vertex-index triples.
    pub fn triangles(&self) -> &'a [[u32; 3]] {
        self.triangles
    }

    /// Returns true if there is nothing to build from.
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty() || self.triangles.is_empty()
    }

    /// Checks the buffer before it is handed to the native side.
    ///
    /// # Errors
    ///
    /// Returns [`NavError::InvalidInput`] for empty geometry, non-finite
    /// coordinates, out-of-range indices, or counts beyond the native width.
    pub fn validate(&self) -> NavResult<()> {
        if self.vertices.is_empty() {
            return Err(NavError::invalid_input("empty vertex list"));
        }
        if self.triangles.is_empty() {
            return Err(NavError::invalid_input("empty triangle list"));
        }
        if i32::try_from(self.vertices.len()).is_err() {
            return Err(NavError::invalid_input(format!(
                "{} vertices exceed the native limit",
                self.vertices.len()
            )));
        }
        let index_count = self.triangles.len().checked_mul(3);
        if index_count.map_or(true, |n| i32::try_from(n).is_err()) {
            return Err(NavError::invalid_input(format!(
                "{} triangles exceed the native limit",
                self.triangles.len()
            )));
        }

        if let Some(i) = self.vertices.iter().position(|v| !v.is_finite()) {
            return Err(NavError::invalid_input(format!(
                "vertex {i} has a non-finite coordinate"
            )));
        }

        let vertex_count = self.vertices.len() as u64;
        for (t, triangle) in self.triangles.iter().enumerate() {
            if let Some(index) = triangle.iter().find(|i| u64::from(**i) >= vertex_count) {
                return Err(NavError::invalid_input(format!(
                    "triangle {t} references vertex {index} but only {vertex_count} exist"
                )));
            }
        }

        Ok(())
    }
}

/// Groups a flat index list into triangles.
///
/// # Errors
///
/// Returns [`NavError::InvalidInput`] if the index count is not a multiple of 3.
pub fn triangles_from_indices(indices: &[u32]) -> NavResult<Vec<[u32; 3]>> {
    if indices.len() % 3 != 0 {
        return Err(NavError::invalid_input(format!(
            "index count {} is not a multiple of 3",
            indices.len()
        )));
    }
    Ok(indices.chunks_exact(3).map(|c| [c[0], c[1], c[2]]).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quad() -> (Vec<Vec3>, Vec<[u32; 3]>) {
        (
            vec![
                Vec3::new(0.0, 0.0, 0.0),
                Vec3::new(10.0, 0.0, 0.0),
                Vec3::new(10.0, 0.0, 10.0),
                Vec3::new(0.0, 0.0, 10.0),
            ],
            vec![[0, 2, 1], [0, 3, 2]],
        )
    }

    #[test]
    fn valid_quad_passes() {
        let (vertices, triangles) = quad();
        let geometry = GeometryBuffer::new(&vertices, &triangles);
        assert!(!geometry.is_empty());
        assert!(geometry.validate().is_ok());
    }

    #[test]
    fn empty_vertices_rejected() {
        let (_, triangles) = quad();
        let geometry = GeometryBuffer::new(&[], &triangles);
        assert!(geometry.is_empty());
        assert!(matches!(geometry.validate(), Err(NavError::InvalidInput { .. })));
    }

    #[test]
    fn empty_triangles_rejected() {
        let (vertices, _) = quad();
        let geometry = GeometryBuffer::new(&vertices, &[]);
        assert!(matches!(geometry.validate(), Err(NavError::InvalidInput { .. })));
    }

    #[test]
    fn out_of_range_index_rejected() {
        let (vertices, _) = quad();
        let triangles = [[0, 1, 4]];
        let err = GeometryBuffer::new(&vertices, &triangles).validate().unwrap_err();
        assert!(err.to_string().contains("vertex 4"));
    }

    #[test]
    fn non_finite_vertex_rejected() {
        let (mut vertices, triangles) = quad();
        vertices[2].y = f32::NAN;
        let err = GeometryBuffer::new(&vertices, &triangles).validate().unwrap_err();
        assert!(err.to_string().contains("vertex 2"));
    }

    #[test]
    fn flat_indices_grouped() {
        assert_eq!(
            triangles_from_indices(&[0, 1, 2, 2, 3, 0]).unwrap(),
            vec![[0, 1, 2], [2, 3, 0]]
        );
        assert!(triangles_from_indices(&[0, 1]).is_err());
    }
}
