//! Swap command implementation.

use super::open_orchestrator;
use navbridge_swap::{HostEnvironment, ReloadChoice, SwapReport};
use std::path::Path;
use tracing::{debug, info};

/// Host for a standalone process.
///
/// A terminal cannot disable a module inside another process, nor restart
/// that process. The ladder therefore skips the in-place disable, and an
/// exhausted ladder ends [`navbridge_swap::SwapOutcome::Deferred`] with the intent saved for
/// `navbridge resume`.
#[derive(Debug, Default)]
pub struct ConsoleHost;

impl HostEnvironment for ConsoleHost {
    fn choose_reload(&mut self, module: &Path) -> ReloadChoice {
        info!(module = %module.display(), "Module is in use; the host must be restarted by hand");
        ReloadChoice::Decline
    }
}

/// Runs the swap command.
pub fn run(store: &Path, source: &Path, dest: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let report = execute(store, source, dest)?;
    println!("{}", report.outcome);
    if let Some(kind) = report.outcome.error_kind() {
        debug!(?kind, "swap not completed");
    }
    if report.outcome.requires_manual_restart() {
        println!("The swap is saved; restart the host, then run `navbridge resume`.");
    }
    Ok(())
}

fn execute(store: &Path, source: &Path, dest: &Path) -> Result<SwapReport, Box<dyn std::error::Error>> {
    let orchestrator = open_orchestrator(store)?;
    Ok(orchestrator.swap(source, dest, &mut ConsoleHost)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use navbridge_store::FileStore;
    use navbridge_swap::{IntentStore, ReloadKind, SwapIntent, SwapOutcome, SwapStep};
    use std::fs;
    use std::sync::Arc;
    use tempfile::TempDir;

    #[test]
    fn swap_replaces_unlocked_module() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("new.so");
        let dest = dir.path().join("libnavmesh.so");
        fs::write(&source, b"v2").unwrap();
        fs::write(&dest, b"v1").unwrap();

        let report = execute(&dir.path().join("state.json"), &source, &dest).unwrap();

        assert_eq!(report.outcome, SwapOutcome::Replaced);
        assert_eq!(report.steps, vec![SwapStep::DirectReplace]);
        assert_eq!(fs::read(&dest).unwrap(), b"v2");
    }

    #[test]
    fn swap_missing_source_fails() {
        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("libnavmesh.so");
        fs::write(&dest, b"v1").unwrap();

        let result = execute(
            &dir.path().join("state.json"),
            &dir.path().join("missing.so"),
            &dest,
        );

        assert!(result.is_err());
        assert_eq!(fs::read(&dest).unwrap(), b"v1");
    }

    #[test]
    fn console_host_never_claims_a_reload() {
        let mut host = ConsoleHost;
        let module = Path::new("libnavmesh.so");
        assert!(!host.supports_quiesce());
        assert_eq!(host.choose_reload(module), ReloadChoice::Decline);
        assert!(!host.request_reload(ReloadKind::FullRestart));
        assert!(!host.request_reload(ReloadKind::RunStopCycle));
    }

    #[test]
    fn swap_with_pending_intent_is_rejected() {
        let dir = TempDir::new().unwrap();
        let store = dir.path().join("state.json");
        let source = dir.path().join("new.so");
        let dest = dir.path().join("libnavmesh.so");
        fs::write(&source, b"v2").unwrap();
        fs::write(&dest, b"v1").unwrap();
        IntentStore::new(Arc::new(FileStore::open(&store).unwrap()), "navbridge.swap")
            .save(&SwapIntent::new(&source, &dest))
            .unwrap();

        let err = execute(&store, &source, &dest).unwrap_err();

        assert_eq!(err.to_string(), "swap already in progress");
        assert_eq!(fs::read(&dest).unwrap(), b"v1");
    }
}
