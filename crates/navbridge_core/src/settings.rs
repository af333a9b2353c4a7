//! NavMesh build tunables.

use crate::error::{NavError, NavResult};
use navbridge_ffi::RawBuildSettings;
use serde::{Deserialize, Serialize};

/// Numeric tunables for a NavMesh build, in native units.
///
/// A plain value type: the core only checks that lengths and areas are
/// non-negative, the slope is within `[0, 90]` and the voxel grid is
/// non-degenerate. Missing fields take their defaults when deserialized.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BuildSettings {
    /// Voxel size on the horizontal plane.
    pub cell_size: f32,
    /// Voxel size on the up axis.
    pub cell_height: f32,
    /// Steepest walkable slope in degrees.
    pub walkable_slope_angle: f32,
    /// Minimum clearance an agent needs.
    pub walkable_height: f32,
    /// Agent radius.
    pub walkable_radius: f32,
    /// Highest ledge an agent can step up.
    pub walkable_climb: f32,
    /// Regions smaller than this are discarded.
    pub min_region_area: f32,
    /// Regions smaller than this are merged.
    pub merge_region_area: f32,
    /// Polygon vertex limit.
    pub max_verts_per_poly: u32,
    /// Detail mesh sampling distance.
    pub detail_sample_dist: f32,
    /// Maximum detail mesh deviation.
    pub detail_sample_max_error: f32,
    /// Maximum contour edge length.
    pub max_edge_len: f32,
    /// Maximum contour simplification deviation.
    pub max_simplification_error: f32,
}

impl Default for BuildSettings {
    fn default() -> Self {
        Self {
            cell_size: 0.3,
            cell_height: 0.2,
            walkable_slope_angle: 45.0,
            walkable_height: 2.0,
            walkable_radius: 0.6,
            walkable_climb: 0.9,
            min_region_area: 8.0,
            merge_region_area: 20.0,
            max_verts_per_poly: 6,
            detail_sample_dist: 6.0,
            detail_sample_max_error: 1.0,
            max_edge_len: 12.0,
            max_simplification_error: 1.3,
        }
    }
}

impl BuildSettings {
    /// Creates settings with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the voxel grid resolution.
    #[must_use]
    pub const fn with_cell(mut self, size: f32, height: f32) -> Self {
        self.cell_size = size;
        self.cell_height = height;
        self
    }

    /// Sets the agent dimensions.
    #[must_use]
    pub const fn with_agent(mut self, height: f32, radius: f32, climb: f32) -> Self {
        self.walkable_height = height;
        self.walkable_radius = radius;
        self.walkable_climb = climb;
        self
    }

    /// Sets the steepest walkable slope.
    #[must_use]
    pub const fn with_slope(mut self, degrees: f32) -> Self {
        self.walkable_slope_angle = degrees;
        self
    }

    /// Checks the settings before they reach the native side.
    ///
    /// # Errors
    ///
    /// Returns [`NavError::InvalidInput`] naming the first offending field.
    pub fn validate(&self) -> NavResult<()> {
        let lengths = [
            ("cellSize", self.cell_size),
            ("cellHeight", self.cell_height),
            ("walkableHeight", self.walkable_height),
            ("walkableRadius", self.walkable_radius),
            ("walkableClimb", self.walkable_climb),
            ("minRegionArea", self.min_region_area),
            ("mergeRegionArea", self.merge_region_area),
            ("detailSampleDist", self.detail_sample_dist),
            ("detailSampleMaxError", self.detail_sample_max_error),
            ("maxEdgeLen", self.max_edge_len),
            ("maxSimplificationError", self.max_simplification_error),
        ];
        for (name, value) in lengths {
            if !value.is_finite() || value < 0.0 {
                return Err(NavError::invalid_input(format!(
                    "{name} must be a non-negative number, got {value}"
                )));
            }
        }

        if self.cell_size == 0.0 || self.cell_height == 0.0 {
            return Err(NavError::invalid_input("cell size and height must be positive"));
        }

        if !(0.0..=90.0).contains(&self.walkable_slope_angle) {
            return Err(NavError::invalid_input(format!(
                "walkableSlopeAngle must be within [0, 90], got {}",
                self.walkable_slope_angle
            )));
        }

        if self.max_verts_per_poly < 3 || i32::try_from(self.max_verts_per_poly).is_err() {
            return Err(NavError::invalid_input(format!(
                "maxVertsPerPoly must be at least 3, got {}",
                self.max_verts_per_poly
            )));
        }

        Ok(())
    }

    /// The boundary representation. Call [`Self::validate`] first.
    pub fn to_raw(&self) -> RawBuildSettings {
        RawBuildSettings {
            cell_size: self.cell_size,
            cell_height: self.cell_height,
            walkable_slope_angle: self.walkable_slope_angle,
            walkable_height: self.walkable_height,
            walkable_radius: self.walkable_radius,
            walkable_climb: self.walkable_climb,
            min_region_area: self.min_region_area,
            merge_region_area: self.merge_region_area,
            max_verts_per_poly: i32::try_from(self.max_verts_per_poly).unwrap_or(i32::MAX),
            detail_sample_dist: self.detail_sample_dist,
            detail_sample_max_error: self.detail_sample_max_error,
            max_edge_len: self.max_edge_len,
            max_simplification_error: self.max_simplification_error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let settings = BuildSettings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.max_verts_per_poly, 6);
        assert_eq!(settings.walkable_slope_angle, 45.0);
    }

    #[test]
    fn negative_length_rejected() {
        let settings = BuildSettings::default().with_agent(2.0, -0.1, 0.9);
        let err = settings.validate().unwrap_err();
        assert!(err.to_string().contains("walkableRadius"));
    }

    #[test]
    fn slope_out_of_range_rejected() {
        assert!(BuildSettings::default().with_slope(90.0).validate().is_ok());
        assert!(BuildSettings::default().with_slope(0.0).validate().is_ok());
        assert!(BuildSettings::default().with_slope(90.5).validate().is_err());
        assert!(BuildSettings::default().with_slope(-1.0).validate().is_err());
    }

    #[test]
    fn degenerate_cells_rejected() {
        assert!(BuildSettings::default().with_cell(0.0, 0.2).validate().is_err());
        assert!(BuildSettings::default().with_cell(0.3, f32::NAN).validate().is_err());
    }

    #[test]
    fn polygon_vertex_limit() {
        let mut settings = BuildSettings::default();
        settings.max_verts_per_poly = 2;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn raw_keeps_every_field() {
        let settings = BuildSettings::default().with_cell(0.25, 0.1);
        let raw = settings.to_raw();
        assert_eq!(raw.cell_size, 0.25);
        assert_eq!(raw.cell_height, 0.1);
        assert_eq!(raw.max_verts_per_poly, 6);
        assert_eq!(raw.max_simplification_error, 1.3);
    }

    #[test]
    fn partial_json_uses_defaults() {
        let settings: BuildSettings =
            serde_json::from_str(r#"{ "cellSize": 0.5, "walkableRadius": 1.0 }"#).unwrap();
        assert_eq!(settings.cell_size, 0.5);
        assert_eq!(settings.walkable_radius, 1.0);
        assert_eq!(settings.cell_height, 0.2);
    }
}
