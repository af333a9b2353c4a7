//! Fingerprint command implementation.

use navbridge_core::Fingerprint;
use std::path::Path;

/// Runs the fingerprint command.
pub fn run(file: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let fingerprint = Fingerprint::of_file(file)
        .map_err(|e| format!("cannot read {}: {e}", file.display()))?;
    println!("{}  {}", fingerprint.to_hex(), file.display());
    Ok(())
}
