//! Module file replacement.

use navbridge_core::Fingerprint;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Why a replacement did not happen.
#[derive(Debug, Error)]
pub enum ReplaceError {
    /// The destination is held open by a process. Drives escalation.
    #[error("destination is locked: {0}")]
    Locked(#[source] io::Error),
    /// Any other I/O failure. Ends the swap.
    #[error("replace failed: {0}")]
    Io(#[source] io::Error),
}

/// File operations the orchestrator needs.
///
/// A replacement either lands whole or leaves the destination untouched.
pub trait ModuleFiles: Send + Sync {
    /// Copies `source` over `dest`.
    fn replace(&self, source: &Path, dest: &Path) -> Result<(), ReplaceError>;

    /// Content fingerprint of `path`.
    fn fingerprint(&self, path: &Path) -> io::Result<Fingerprint>;
}

/// Replaces files through the operating system.
///
/// The new content is written to a temporary file next to the destination
/// and renamed over it, so a failed copy never leaves a truncated module.
#[derive(Debug, Default, Clone, Copy)]
pub struct OsFiles;

impl ModuleFiles for OsFiles {
    fn replace(&self, source: &Path, dest: &Path) -> Result<(), ReplaceError> {
        if !source.is_file() {
            return Err(ReplaceError::Io(io::Error::new(
                io::ErrorKind::NotFound,
                format!("source module {} does not exist", source.display()),
            )));
        }

        let staging = staging_path(dest);
        let result = copy_then_rename(source, &staging, dest);
        if result.is_err() {
            let _ = fs::remove_file(&staging);
        }
        result.map_err(classify)
    }

    fn fingerprint(&self, path: &Path) -> io::Result<Fingerprint> {
        Fingerprint::of_file(path)
    }
}

fn copy_then_rename(source: &Path, staging: &Path, dest: &Path) -> io::Result<()> {
    fs::copy(source, staging)?;
    File::open(staging)?.sync_all()?;
    fs::rename(staging, dest)?;
    debug!(source = %source.display(), dest = %dest.display(), "module file replaced");
    sync_parent(dest)
}

#[cfg(unix)]
fn sync_parent(path: &Path) -> io::Result<()> {
    match path.parent().filter(|p| !p.as_os_str().is_empty()) {
        Some(parent) => File::open(parent)?.sync_all(),
        None => Ok(()),
    }
}

#[cfg(not(unix))]
fn sync_parent(_path: &Path) -> io::Result<()> {
    Ok(())
}

fn staging_path(dest: &Path) -> PathBuf {
    let mut name = dest.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".navbridge-new");
    dest.with_file_name(name)
}

/// Sorts an I/O error into "locked" or "failed".
///
/// Windows reports a loaded DLL as a sharing or lock violation (or plain
/// access denied); Unix reports a running executable as `ETXTBSY`.
pub(crate) fn classify(error: io::Error) -> ReplaceError {
    const ERROR_ACCESS_DENIED: i32 = 5;
    const ERROR_SHARING_VIOLATION: i32 = 32;
    const ERROR_LOCK_VIOLATION: i32 = 33;
    const ETXTBSY: i32 = 26;

    let locked = if cfg!(windows) {
        error.kind() == io::ErrorKind::PermissionDenied
            || matches!(
                error.raw_os_error(),
                Some(ERROR_ACCESS_DENIED | ERROR_SHARING_VIOLATION | ERROR_LOCK_VIOLATION)
            )
    } else {
        error.raw_os_error() == Some(ETXTBSY)
    };

    if locked {
        ReplaceError::Locked(error)
    } else {
        ReplaceError::Io(error)
    }
}
