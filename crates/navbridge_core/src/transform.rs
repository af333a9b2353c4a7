//! Coordinate conversion between host and library space.
//!
//! Both conventions are Y-up. The handedness flip mirrors the Z axis; the
//! optional rotation turns the result about Y in quarter turns. Quarter-turn
//! rotations only swap and negate components, so a round trip is exact.
//!
//! ```text
//! to_library_space(p) = rotate(flip(p))
//! to_host_space(q)    = flip(rotate⁻¹(q))
//! ```

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Which convention library-space points use for a session.
///
/// `HostHanded` sends points through unchanged. `LibraryHanded` mirrors Z so
/// a left-handed host and a right-handed library agree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CoordinateSystem {
    /// Library receives host-convention coordinates.
    #[default]
    HostHanded,
    /// Library receives coordinates with the Z axis mirrored.
    LibraryHanded,
}

impl CoordinateSystem {
    /// Applies the handedness flip. The flip is its own inverse.
    #[inline]
    pub fn flip(self, p: Vec3) -> Vec3 {
        match self {
            CoordinateSystem::HostHanded => p,
            CoordinateSystem::LibraryHanded => Vec3::new(p.x, p.y, -p.z),
        }
    }

    /// Returns true if the flip mirrors geometry, inverting triangle winding.
    #[inline]
    pub fn reverses_winding(self) -> bool {
        matches!(self, CoordinateSystem::LibraryHanded)
    }
}

/// Fixed rotation about the up axis, applied after the handedness flip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum AxisRotation {
    /// No rotation.
    #[default]
    None,
    /// Quarter turn.
    Rotate90,
    /// Half turn.
    Rotate180,
    /// Three quarter turns.
    Rotate270,
}

impl AxisRotation {
    /// Rotation angle in degrees.
    pub fn degrees(self) -> u32 {
        match self {
            AxisRotation::None => 0,
            AxisRotation::Rotate90 => 90,
            AxisRotation::Rotate180 => 180,
            AxisRotation::Rotate270 => 270,
        }
    }

    /// Parses a multiple of 90 degrees (negative angles wrap).
    pub fn from_degrees(degrees: i32) -> Option<Self> {
        match degrees.rem_euclid(360) {
            0 => Some(AxisRotation::None),
            90 => Some(AxisRotation::Rotate90),
            180 => Some(AxisRotation::Rotate180),
            270 => Some(AxisRotation::Rotate270),
            _ => None,
        }
    }

    /// The rotation that undoes this one.
    pub fn inverse(self) -> Self {
        match self {
            AxisRotation::None => AxisRotation::None,
            AxisRotation::Rotate90 => AxisRotation::Rotate270,
            AxisRotation::Rotate180 => AxisRotation::Rotate180,
            AxisRotation::Rotate270 => AxisRotation::Rotate90,
        }
    }

    /// Rotates `p` about +Y (x' = x·cosθ + z·sinθ, z' = -x·sinθ + z·cosθ).
    #[inline]
    pub fn apply(self, p: Vec3) -> Vec3 {
        match self {
            AxisRotation::None => p,
            AxisRotation::Rotate90 => Vec3::new(p.z, p.y, -p.x),
            AxisRotation::Rotate180 => Vec3::new(-p.x, p.y, -p.z),
            AxisRotation::Rotate270 => Vec3::new(-p.z, p.y, p.x),
        }
    }
}

/// Converts a host-space point into library space.
#[inline]
pub fn to_library_space(p: Vec3, cs: CoordinateSystem, rot: AxisRotation) -> Vec3 {
    rot.apply(cs.flip(p))
}

/// Converts a library-space point back into host space.
#[inline]
pub fn to_host_space(p: Vec3, cs: CoordinateSystem, rot: AxisRotation) -> Vec3 {
    cs.flip(rot.inverse().apply(p))
}

/// Batched [`to_library_space`]; element-wise identical to single calls.
pub fn to_library_space_batch(points: &[Vec3], cs: CoordinateSystem, rot: AxisRotation) -> Vec<Vec3> {
    points.iter().map(|p| to_library_space(*p, cs, rot)).collect()
}

/// Batched [`to_host_space`]; element-wise identical to single calls.
pub fn to_host_space_batch(points: &[Vec3], cs: CoordinateSystem, rot: AxisRotation) -> Vec<Vec3> {
    points.iter().map(|p| to_host_space(*p, cs, rot)).collect()
}

/// A coordinate system and rotation bound together for one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CoordinateTransform {
    /// Handedness of library-space points.
    pub coordinate_system: CoordinateSystem,
    /// Rotation applied after the flip.
    pub rotation: AxisRotation,
}

impl CoordinateTransform {
    /// Creates a transform.
    pub const fn new(coordinate_system: CoordinateSystem, rotation: AxisRotation) -> Self {
        Self {
            coordinate_system,
            rotation,
        }
    }

    /// Returns true if this transform leaves points untouched.
    pub fn is_identity(&self) -> bool {
        self.coordinate_system == CoordinateSystem::HostHanded && self.rotation == AxisRotation::None
    }

    /// Host → library.
    #[inline]
    pub fn to_library(&self, p: Vec3) -> Vec3 {
        to_library_space(p, self.coordinate_system, self.rotation)
    }

    /// Library → host.
    #[inline]
    pub fn to_host(&self, p: Vec3) -> Vec3 {
        to_host_space(p, self.coordinate_system, self.rotation)
    }

    /// Writes library-space coordinates for `points` as interleaved floats.
    pub fn flatten_to_library(&self, points: &[Vec3]) -> Vec<f32> {
        let mut flat = Vec::with_capacity(points.len() * 3);
        for p in points {
            flat.extend_from_slice(&self.to_library(*p).to_array());
        }
        flat
    }

    /// Reads interleaved library-space floats back into host-space points.
    ///
    /// A trailing partial triple is ignored.
    pub fn unflatten_to_host(&self, coordinates: &[f32]) -> Vec<Vec3> {
        coordinates
            .chunks_exact(3)
            .map(|c| self.to_host(Vec3::new(c[0], c[1], c[2])))
            .collect()
    }

    /// Orders a triangle's indices so its facing survives the flip.
    #[inline]
    pub fn orient_triangle(&self, [a, b, c]: [u32; 3]) -> [u32; 3] {
        if self.coordinate_system.reverses_winding() {
            [a, c, b]
        } else {
            [a, b, c]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const ALL_SYSTEMS: [CoordinateSystem; 2] =
        [CoordinateSystem::HostHanded, CoordinateSystem::LibraryHanded];
    const ALL_ROTATIONS: [AxisRotation; 4] = [
        AxisRotation::None,
        AxisRotation::Rotate90,
        AxisRotation::Rotate180,
        AxisRotation::Rotate270,
    ];

    fn close(a: Vec3, b: Vec3) -> bool {
        (a - b).abs().max_element() <= 1e-5
    }

    #[test]
    fn host_handed_without_rotation_is_identity() {
        let p = Vec3::new(1.5, -2.0, 3.25);
        assert_eq!(to_library_space(p, CoordinateSystem::HostHanded, AxisRotation::None), p);
        assert_eq!(to_host_space(p, CoordinateSystem::HostHanded, AxisRotation::None), p);
        assert!(CoordinateTransform::default().is_identity());
    }

    #[test]
    fn library_handed_mirrors_z() {
        let p = Vec3::new(1.0, 2.0, 3.0);
        assert_eq!(
            to_library_space(p, CoordinateSystem::LibraryHanded, AxisRotation::None),
            Vec3::new(1.0, 2.0, -3.0)
        );
    }

    #[test]
    fn rotation_is_about_up_axis() {
        let p = Vec3::new(1.0, 5.0, 0.0);
        assert_eq!(AxisRotation::Rotate90.apply(p), Vec3::new(0.0, 5.0, -1.0));
        assert_eq!(AxisRotation::Rotate180.apply(p), Vec3::new(-1.0, 5.0, 0.0));
        assert_eq!(AxisRotation::Rotate270.apply(p), Vec3::new(0.0, 5.0, 1.0));
    }

    #[test]
    fn rotation_composes_after_flip() {
        let p = Vec3::new(0.0, 0.0, 1.0);
        // flip: (0,0,-1), then quarter turn: (-1, 0, 0)
        assert_eq!(
            to_library_space(p, CoordinateSystem::LibraryHanded, AxisRotation::Rotate90),
            Vec3::new(-1.0, 0.0, 0.0)
        );
    }

    #[test]
    fn rotation_degrees_round_trip() {
        for rot in ALL_ROTATIONS {
            assert_eq!(AxisRotation::from_degrees(rot.degrees() as i32), Some(rot));
            assert_eq!(rot.inverse().inverse(), rot);
        }
        assert_eq!(AxisRotation::from_degrees(-90), Some(AxisRotation::Rotate270));
        assert_eq!(AxisRotation::from_degrees(45), None);
    }

    #[test]
    fn winding_reverses_only_when_mirrored() {
        let mirrored = CoordinateTransform::new(CoordinateSystem::LibraryHanded, AxisRotation::None);
        assert_eq!(mirrored.orient_triangle([0, 1, 2]), [0, 2, 1]);

        let plain = CoordinateTransform::new(CoordinateSystem::HostHanded, AxisRotation::Rotate180);
        assert_eq!(plain.orient_triangle([0, 1, 2]), [0, 1, 2]);
    }

    #[test]
    fn flatten_and_unflatten() {
        let t = CoordinateTransform::new(CoordinateSystem::LibraryHanded, AxisRotation::Rotate270);
        let points = vec![Vec3::new(1.0, 2.0, 3.0), Vec3::new(-4.0, 0.5, 8.0)];
        let flat = t.flatten_to_library(&points);
        assert_eq!(flat.len(), 6);
        assert_eq!(t.unflatten_to_host(&flat), points);
    }

    fn vec3_strategy() -> impl Strategy<Value = Vec3> {
        (-1.0e4f32..1.0e4, -1.0e4f32..1.0e4, -1.0e4f32..1.0e4).prop_map(|(x, y, z)| Vec3::new(x, y, z))
    }

    proptest! {
        #[test]
        fn round_trip_every_convention(p in vec3_strategy()) {
            for cs in ALL_SYSTEMS {
                for rot in ALL_ROTATIONS {
                    let back = to_host_space(to_library_space(p, cs, rot), cs, rot);
                    prop_assert!(close(back, p), "{cs:?}/{rot:?}: {p} -> {back}");
                }
            }
        }

        #[test]
        fn batch_matches_single(points in prop::collection::vec(vec3_strategy(), 0..32)) {
            for cs in ALL_SYSTEMS {
                for rot in ALL_ROTATIONS {
                    let batched = to_library_space_batch(&points, cs, rot);
                    let single: Vec<Vec3> = points.iter().map(|p| to_library_space(*p, cs, rot)).collect();
                    prop_assert_eq!(&batched, &single);

                    let back = to_host_space_batch(&batched, cs, rot);
                    let single_back: Vec<Vec3> = batched.iter().map(|p| to_host_space(*p, cs, rot)).collect();
                    prop_assert_eq!(back, single_back);
                }
            }
        }
    }
}
