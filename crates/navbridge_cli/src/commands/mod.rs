//! CLI command implementations.

pub mod build;
pub mod fingerprint;
pub mod path;
pub mod resume;
pub mod status;
pub mod swap;

use clap::Args;
use navbridge_core::{
    AxisRotation, CoordinateSystem, NativeModuleHandle, NavMeshSession, SessionConfig, Vec3,
};
use navbridge_store::FileStore;
use navbridge_swap::{SwapConfig, SwapOrchestrator};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Options shared by commands that load a native library.
#[derive(Debug, Args)]
pub struct NativeArgs {
    /// Native NavMesh library to load
    #[arg(short, long)]
    pub library: PathBuf,

    /// Mirror Z when talking to the library
    #[arg(long)]
    pub library_handed: bool,

    /// Rotation about the up axis in degrees (multiple of 90)
    #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
    pub rotation: i32,
}

impl NativeArgs {
    /// Session configuration from the flags.
    pub fn session_config(&self) -> Result<SessionConfig, Box<dyn std::error::Error>> {
        let rotation = AxisRotation::from_degrees(self.rotation)
            .ok_or_else(|| format!("rotation must be a multiple of 90, got {}", self.rotation))?;
        let coordinate_system = if self.library_handed {
            CoordinateSystem::LibraryHanded
        } else {
            CoordinateSystem::HostHanded
        };
        Ok(SessionConfig::new()
            .coordinate_system(coordinate_system)
            .rotation(rotation))
    }

    /// Loads the library and wraps it in a session.
    pub fn open_session(&self) -> Result<NavMeshSession, Box<dyn std::error::Error>> {
        let config = self.session_config()?;
        let mut handle = NativeModuleHandle::new(&self.library);
        handle.init()?;
        Ok(NavMeshSession::new(handle, config))
    }
}

/// Opens the swap orchestrator over the state file at `store`.
pub fn open_orchestrator(store: &Path) -> Result<SwapOrchestrator, Box<dyn std::error::Error>> {
    let store = FileStore::open(store)?;
    Ok(SwapOrchestrator::new(SwapConfig::default(), Arc::new(store)))
}

/// Parses `x,y,z`.
pub fn parse_point(text: &str) -> Result<Vec3, Box<dyn std::error::Error>> {
    let parts = text
        .split(',')
        .map(|part| part.trim().parse::<f32>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| format!("invalid point {text:?}: {e}"))?;
    match parts.as_slice() {
        [x, y, z] => Ok(Vec3::new(*x, *y, *z)),
        _ => Err(format!("invalid point {text:?}: expected x,y,z").into()),
    }
}
