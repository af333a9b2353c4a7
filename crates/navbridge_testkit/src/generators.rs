//! Property-based test generators using proptest.

use navbridge_core::{AxisRotation, BuildSettings, CoordinateSystem, CoordinateTransform, Vec3};
use proptest::prelude::*;

/// Strategy for points within a generous world-space range.
pub fn point_strategy() -> impl Strategy<Value = Vec3> {
    (-1.0e4f32..1.0e4, -1.0e4f32..1.0e4, -1.0e4f32..1.0e4).prop_map(|(x, y, z)| Vec3::new(x, y, z))
}

/// Strategy for every coordinate convention.
pub fn transform_strategy() -> impl Strategy<Value = CoordinateTransform> {
    (
        prop_oneof![
            Just(CoordinateSystem::HostHanded),
            Just(CoordinateSystem::LibraryHanded)
        ],
        prop_oneof![
            Just(AxisRotation::None),
            Just(AxisRotation::Rotate90),
            Just(AxisRotation::Rotate180),
            Just(AxisRotation::Rotate270)
        ],
    )
        .prop_map(|(cs, rot)| CoordinateTransform::new(cs, rot))
}

/// Strategy for valid geometry: a flat grid of `w x d` cells, two triangles each.
pub fn grid_strategy() -> impl Strategy<Value = (Vec<Vec3>, Vec<[u32; 3]>)> {
    (1u32..8, 1u32..8, 0.5f32..4.0).prop_map(|(w, d, cell)| grid(w, d, cell))
}

/// A flat grid of `width x depth` cells on the y = 0 plane.
pub fn grid(width: u32, depth: u32, cell: f32) -> (Vec<Vec3>, Vec<[u32; 3]>) {
    let mut vertices = Vec::new();
    for z in 0..=depth {
        for x in 0..=width {
            vertices.push(Vec3::new(x as f32 * cell, 0.0, z as f32 * cell));
        }
    }

    let row = width + 1;
    let mut triangles = Vec::new();
    for z in 0..depth {
        for x in 0..width {
            let i = z * row + x;
            triangles.push([i, i + row, i + 1]);
            triangles.push([i + 1, i + row, i + row + 1]);
        }
    }
    (vertices, triangles)
}

/// Strategy for settings that pass validation.
pub fn build_settings_strategy() -> impl Strategy<Value = BuildSettings> {
    (0.05f32..1.0, 0.05f32..1.0, 0.0f32..=90.0, 0.1f32..3.0, 3u32..12).prop_map(
        |(cell_size, cell_height, slope, radius, verts)| {
            let mut settings = BuildSettings::default()
                .with_cell(cell_size, cell_height)
                .with_slope(slope);
            settings.walkable_radius = radius;
            settings.max_verts_per_poly = verts;
            settings
        },
    )
}
