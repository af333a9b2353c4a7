//! Resume command implementation.

use super::open_orchestrator;
use navbridge_swap::ResumeOutcome;
use std::path::Path;

/// Runs the resume command.
///
/// With `dest`, a pending swap targeting another file is left alone.
pub fn run(store: &Path, dest: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    match execute(store, dest)? {
        ResumeOutcome::NothingToDo => println!("No pending swap."),
        ResumeOutcome::Completed(intent) => {
            println!(
                "Swap completed: {} -> {}",
                intent.source.display(),
                intent.dest.display()
            );
        }
    }
    Ok(())
}

fn execute(store: &Path, dest: Option<&Path>) -> Result<ResumeOutcome, Box<dyn std::error::Error>> {
    let orchestrator = open_orchestrator(store)?;
    let outcome = match dest {
        Some(dest) => orchestrator.resume_pending_for(dest)?,
        None => orchestrator.resume_pending()?,
    };
    Ok(outcome)
}
