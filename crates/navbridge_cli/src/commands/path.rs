//! Path command implementation.

use super::{parse_point, NativeArgs};
use navbridge_core::NavMeshData;
use serde::Serialize;
use std::path::Path;

/// Path query output.
#[derive(Debug, Serialize)]
pub struct PathOutput {
    /// Waypoints in host space.
    pub points: Vec<[f32; 3]>,
}

/// Runs the path command.
pub fn run(
    native: &NativeArgs,
    navmesh: &Path,
    from: &str,
    to: &str,
    format: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let start = parse_point(from)?;
    let end = parse_point(to)?;
    let data = NavMeshData::read_from(navmesh)?;

    let mut session = native.open_session()?;
    session.load_nav_mesh(data.as_bytes())?;
    let points = session.find_path(start, end).into_result()?;

    let output = PathOutput {
        points: points.iter().map(|p| p.to_array()).collect(),
    };
    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&output)?),
        _ => {
            println!("{} waypoints", output.points.len());
            for [x, y, z] in &output.points {
                println!("  {x:.3}, {y:.3}, {z:.3}");
            }
        }
    }
    Ok(())
}
