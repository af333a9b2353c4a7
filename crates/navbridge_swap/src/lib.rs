//! # navbridge Swap
//!
//! Replaces a native module file on disk while the host may still have it
//! mapped, escalating through progressively more disruptive strategies.
//!
//! This crate provides:
//! - The swap strategy ladder and its report
//! - A durable [`SwapIntent`] that survives a host restart
//! - The [`HostEnvironment`] capability seam (quiesce, reference release, reload)
//! - File replacement with lock classification
//!
//! ## Strategy ladder
//!
//! Each step only runs if the previous one could not replace the file:
//!
//! 1. Direct replace
//! 2. Content check (identical fingerprints make the swap a no-op)
//! 3. In-place quiesce, when the host supports it
//! 4. Reference release
//! 5. Persist a [`SwapIntent`] and ask the host for a reload
//!
//! After the reload, [`SwapOrchestrator::resume_pending`] completes the
//! copy and deletes the intent.
//!
//! ## Key Invariants
//!
//! - A pending intent is only removed after its copy succeeded
//! - A second swap while one is pending fails with [`SwapError::SwapInProgress`]
//! - Identical content never escalates past the content check
//! - Every run holds the store lock from start to finish, so exactly one
//!   process sharing the store consumes an intent

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod error;
mod files;
mod host;
mod intent;
mod orchestrator;

pub use config::SwapConfig;
pub use error::{SwapError, SwapResult};
pub use files::{ModuleFiles, OsFiles, ReplaceError};
pub use host::{HostEnvironment, ModuleHandleHost, ReloadChoice, ReloadKind};
pub use intent::{IntentGuard, IntentStore, SwapIntent};
pub use orchestrator::{
    ResumeOutcome, SwapOrchestrator, SwapOutcome, SwapReport, SwapState, SwapStep,
};
