//! Status and discard command implementations.

use super::open_orchestrator;
use navbridge_swap::SwapIntent;
use serde::Serialize;
use std::path::Path;

/// Pending swap as reported by `status`.
#[derive(Debug, Serialize)]
pub struct StatusResult {
    /// State file path.
    pub store: String,
    /// Whether a swap is waiting.
    pub pending: bool,
    /// New module file.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    /// Module file to overwrite.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dest: Option<String>,
    /// Request time in seconds since the Unix epoch.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requested_at: Option<u64>,
}

impl StatusResult {
    fn new(store: &Path, intent: Option<&SwapIntent>) -> Self {
        Self {
            store: store.display().to_string(),
            pending: intent.is_some(),
            source: intent.map(|i| i.source.display().to_string()),
            dest: intent.map(|i| i.dest.display().to_string()),
            requested_at: intent.map(|i| i.requested_at),
        }
    }
}

/// Runs the status command.
pub fn run(store: &Path, format: &str) -> Result<(), Box<dyn std::error::Error>> {
    let intent = open_orchestrator(store)?.pending()?;
    let result = StatusResult::new(store, intent.as_ref());

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&result)?),
        _ => print_text(&result),
    }
    Ok(())
}

/// Runs the discard command.
pub fn discard(store: &Path) -> Result<(), Box<dyn std::error::Error>> {
    match open_orchestrator(store)?.discard_pending()? {
        Some(intent) => println!(
            "Discarded pending swap: {} -> {}",
            intent.source.display(),
            intent.dest.display()
        ),
        None => println!("No pending swap."),
    }
    Ok(())
}

fn print_text(result: &StatusResult) {
    println!("State file: {}", result.store);
    if !result.pending {
        println!("No pending swap.");
        return;
    }
    println!("Pending swap:");
    if let Some(source) = &result.source {
        println!("  Source:       {source}");
    }
    if let Some(dest) = &result.dest {
        println!("  Destination:  {dest}");
    }
    if let Some(at) = result.requested_at {
        println!("  Requested at: {at}");
    }
}
