//! Session configuration.

use crate::transform::{AxisRotation, CoordinateSystem, CoordinateTransform};

/// Configuration for a [`crate::NavMeshSession`].
///
/// The coordinate convention is fixed for the lifetime of a session so
/// points from different conventions are never mixed.
#[derive(Debug, Clone, Default)]
pub struct SessionConfig {
    /// Handedness of library-space points.
    pub coordinate_system: CoordinateSystem,

    /// Extra rotation about the up axis.
    pub rotation: AxisRotation,
}

impl SessionConfig {
    /// Creates a configuration with the identity transform.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the coordinate system.
    #[must_use]
    pub const fn coordinate_system(mut self, value: CoordinateSystem) -> Self {
        self.coordinate_system = value;
        self
    }

    /// Sets the rotation.
    #[must_use]
    pub const fn rotation(mut self, value: AxisRotation) -> Self {
        self.rotation = value;
        self
    }

    /// The transform described by this configuration.
    #[must_use]
    pub const fn transform(&self) -> CoordinateTransform {
        CoordinateTransform::new(self.coordinate_system, self.rotation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_identity() {
        let config = SessionConfig::default();
        assert_eq!(config.coordinate_system, CoordinateSystem::HostHanded);
        assert_eq!(config.rotation, AxisRotation::None);
        assert!(config.transform().is_identity());
    }

    #[test]
    fn builder_pattern() {
        let config = SessionConfig::new()
            .coordinate_system(CoordinateSystem::LibraryHanded)
            .rotation(AxisRotation::Rotate180);

        assert_eq!(config.coordinate_system, CoordinateSystem::LibraryHanded);
        assert_eq!(config.rotation, AxisRotation::Rotate180);
        assert!(!config.transform().is_identity());
    }
}
