//! The swap strategy ladder.

use crate::config::SwapConfig;
use crate::error::{SwapError, SwapResult};
use crate::files::{ModuleFiles, OsFiles, ReplaceError};
use crate::host::{HostEnvironment, ReloadChoice, ReloadKind};
use crate::intent::{IntentGuard, IntentStore, SwapIntent};
use navbridge_core::ErrorKind;
use navbridge_store::KeyValueStore;
use parking_lot::RwLock;
use std::fmt;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{debug, info, warn};

/// What the orchestrator is doing right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwapState {
    /// No swap running.
    Idle,
    /// Copying over the destination.
    Replacing,
    /// Comparing source and destination fingerprints.
    ComparingContent,
    /// Module disabled in place, copy pending.
    Quiescing,
    /// Dropping references and retrying the copy.
    ReleasingReferences,
    /// Intent persisted, waiting on the user or the host reload.
    Escalating,
    /// Completing a persisted intent.
    Resuming,
}

impl SwapState {
    /// Returns true while a swap or resume runs.
    pub fn is_active(&self) -> bool {
        !matches!(self, SwapState::Idle)
    }
}

/// One rung of the ladder, as recorded in a [`SwapReport`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwapStep {
    /// Step 1: plain copy.
    DirectReplace,
    /// Step 2: fingerprint comparison.
    ContentCheck,
    /// Step 3: disable in place, copy, re-enable.
    Quiesce,
    /// Step 4: drop references, copy.
    ReleaseReferences,
    /// Step 5: persist the intent and reload.
    Escalate,
}

/// How a swap request ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwapOutcome {
    /// The destination was not locked and was replaced directly.
    Replaced,
    /// Source and destination have identical content; nothing was written.
    AlreadyCurrent,
    /// Replaced while the module was disabled in place.
    ReplacedAfterQuiesce,
    /// Replaced after references were released.
    ReplacedAfterRelease,
    /// Intent persisted and a host reload started; resume completes the copy.
    ReloadScheduled {
        /// The reload the host started.
        kind: ReloadKind,
    },
    /// Intent persisted, no reload; the user must restart.
    Deferred,
    /// The user declined to disable the module.
    Cancelled,
}

impl SwapOutcome {
    /// Returns true if the destination now holds the source content.
    pub fn is_complete(&self) -> bool {
        matches!(
            self,
            SwapOutcome::Replaced
                | SwapOutcome::AlreadyCurrent
                | SwapOutcome::ReplacedAfterQuiesce
                | SwapOutcome::ReplacedAfterRelease
        )
    }

    /// Returns true if a [`SwapIntent`] is waiting in the store.
    pub fn leaves_intent(&self) -> bool {
        matches!(self, SwapOutcome::ReloadScheduled { .. } | SwapOutcome::Deferred)
    }

    /// Returns true if nothing further happens without a manual restart.
    pub fn requires_manual_restart(&self) -> bool {
        matches!(self, SwapOutcome::Deferred)
    }

    /// The error category of an outcome the caller cannot complete on its own.
    ///
    /// Only [`SwapOutcome::Deferred`] has one: [`ErrorKind::Unrecoverable`].
    pub fn error_kind(&self) -> Option<ErrorKind> {
        match self {
            SwapOutcome::Deferred => Some(ErrorKind::Unrecoverable),
            _ => None,
        }
    }
}

impl fmt::Display for SwapOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SwapOutcome::Replaced => f.write_str("module replaced"),
            SwapOutcome::AlreadyCurrent => f.write_str("module already current"),
            SwapOutcome::ReplacedAfterQuiesce => f.write_str("module replaced after in-place disable"),
            SwapOutcome::ReplacedAfterRelease => f.write_str("module replaced after reference release"),
            SwapOutcome::ReloadScheduled { kind } => {
                write!(f, "swap scheduled: completes after {kind}")
            }
            SwapOutcome::Deferred => f.write_str("swap deferred: manual restart required"),
            SwapOutcome::Cancelled => f.write_str("swap cancelled"),
        }
    }
}

/// Result of a swap request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapReport {
    /// How the request ended.
    pub outcome: SwapOutcome,
    /// Steps attempted, in order.
    pub steps: Vec<SwapStep>,
}

/// Result of [`SwapOrchestrator::resume_pending`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResumeOutcome {
    /// No intent was stored.
    NothingToDo,
    /// The stored intent was carried out and deleted.
    Completed(SwapIntent),
}

/// Drives a module replacement through the strategy ladder.
///
/// One orchestrator serves one durable store. At most one swap or resume
/// runs at a time, and no new swap starts while an intent is pending.
/// Each run holds the store lock throughout, which extends both rules to
/// every orchestrator sharing the store file, in this process or another.
pub struct SwapOrchestrator {
    config: SwapConfig,
    intents: IntentStore,
    files: Box<dyn ModuleFiles>,
    state: RwLock<SwapState>,
    running: AtomicBool,
}

impl SwapOrchestrator {
    /// Creates an orchestrator that replaces files on the real filesystem.
    pub fn new(config: SwapConfig, store: Arc<dyn KeyValueStore>) -> Self {
        Self::with_files(config, store, Box::new(OsFiles))
    }

    /// Creates an orchestrator with a custom file layer.
    pub fn with_files(
        config: SwapConfig,
        store: Arc<dyn KeyValueStore>,
        files: Box<dyn ModuleFiles>,
    ) -> Self {
        let intents = IntentStore::new(store, &config.store_key_prefix);
        Self {
            config,
            intents,
            files,
            state: RwLock::new(SwapState::Idle),
            running: AtomicBool::new(false),
        }
    }

    /// Gets the current state.
    pub fn state(&self) -> SwapState {
        *self.state.read()
    }

    /// Gets the configuration.
    pub fn config(&self) -> &SwapConfig {
        &self.config
    }

    /// The pending intent, if any.
    ///
    /// Fails with [`SwapError::SwapInProgress`] while another orchestrator on
    /// the same store file is running.
    pub fn pending(&self) -> SwapResult<Option<SwapIntent>> {
        self.intents.load()
    }

    /// Deletes a pending intent without carrying it out.
    ///
    /// This is the explicit way to abandon a deferred swap; the ladder
    /// itself never drops an intent it did not complete.
    pub fn discard_pending(&self) -> SwapResult<Option<SwapIntent>> {
        let _run = self.begin()?;
        let intents = self.intents.lock()?;
        let intent = intents.load()?;
        if intent.is_some() {
            intents.clear()?;
            warn!(?intent, "pending swap discarded");
        }
        Ok(intent)
    }

    /// Replaces `dest` with `source`, escalating as far as needed.
    ///
    /// # Errors
    ///
    /// - [`SwapError::SwapInProgress`] if another swap runs or an intent is
    ///   pending, here or in any process sharing the store
    /// - [`SwapError::Io`] if a file cannot be read or written for a reason
    ///   other than a lock; `dest` is left untouched
    /// - [`SwapError::Store`] if the intent cannot be persisted
    pub fn swap(
        &self,
        source: &Path,
        dest: &Path,
        host: &mut dyn HostEnvironment,
    ) -> SwapResult<SwapReport> {
        let _run = self.begin()?;
        let intents = self.intents.lock()?;
        if intents.is_pending()? {
            return Err(SwapError::SwapInProgress);
        }

        info!(source = %source.display(), dest = %dest.display(), "swap requested");
        let mut steps = Vec::new();
        let outcome = self.run_ladder(source, dest, host, &intents, &mut steps)?;
        info!(%outcome, ?steps, "swap finished");
        Ok(SwapReport { outcome, steps })
    }

    fn run_ladder(
        &self,
        source: &Path,
        dest: &Path,
        host: &mut dyn HostEnvironment,
        intents: &IntentGuard<'_>,
        steps: &mut Vec<SwapStep>,
    ) -> SwapResult<SwapOutcome> {
        // Step 1
        steps.push(SwapStep::DirectReplace);
        self.set_state(SwapState::Replacing);
        if self.try_replace(source, dest)? {
            host.on_swapped(dest);
            return Ok(SwapOutcome::Replaced);
        }

        // Step 2
        steps.push(SwapStep::ContentCheck);
        self.set_state(SwapState::ComparingContent);
        let source_fp = self
            .files
            .fingerprint(source)
            .map_err(|e| SwapError::io(source, e))?;
        let dest_fp = self
            .files
            .fingerprint(dest)
            .map_err(|e| SwapError::io(dest, e))?;
        if source_fp == dest_fp {
            info!(fingerprint = %source_fp, "destination already has the source content");
            return Ok(SwapOutcome::AlreadyCurrent);
        }
        debug!(source = %source_fp, dest = %dest_fp, "content differs");

        // Step 3
        if host.supports_quiesce() {
            steps.push(SwapStep::Quiesce);
            if !host.confirm_quiesce(dest) {
                info!("in-place disable declined");
                return Ok(SwapOutcome::Cancelled);
            }
            self.set_state(SwapState::Quiescing);
            if host.try_quiesce(dest) {
                pause(self.config.settle_delay);
                let replaced = self.try_replace(source, dest);
                host.resume(dest);
                if replaced? {
                    host.on_swapped(dest);
                    return Ok(SwapOutcome::ReplacedAfterQuiesce);
                }
            } else {
                debug!("host could not disable the module");
            }
        }

        // Step 4
        steps.push(SwapStep::ReleaseReferences);
        self.set_state(SwapState::ReleasingReferences);
        for attempt in 1..=self.config.release_attempts {
            host.release_references(dest);
            pause(self.config.release_retry_delay);
            if self.try_replace(source, dest)? {
                host.on_swapped(dest);
                return Ok(SwapOutcome::ReplacedAfterRelease);
            }
            debug!(attempt, "destination still locked after reference release");
        }

        // Step 5
        steps.push(SwapStep::Escalate);
        self.set_state(SwapState::Escalating);
        let intent = SwapIntent::new(source, dest);
        intents.save(&intent)?;

        match host.choose_reload(dest) {
            ReloadChoice::Reload(kind) if host.request_reload(kind) => {
                info!(%kind, "reload requested to complete swap");
                Ok(SwapOutcome::ReloadScheduled { kind })
            }
            ReloadChoice::Reload(kind) => {
                warn!(%kind, "host could not start the reload");
                Ok(SwapOutcome::Deferred)
            }
            ReloadChoice::Decline => {
                warn!(kind = ?ErrorKind::Unrecoverable, "reload declined; swap deferred");
                Ok(SwapOutcome::Deferred)
            }
        }
    }

    /// Completes a persisted intent. Call on startup and after a run/stop cycle.
    ///
    /// Without a pending intent this does nothing and returns
    /// [`ResumeOutcome::NothingToDo`]. The store lock is held from reading
    /// the intent until it is deleted, and the intent is deleted only after
    /// the copy succeeded.
    ///
    /// # Errors
    ///
    /// [`SwapError::DestinationLocked`] if the destination is still held, or
    /// [`SwapError::Io`]; the intent stays in place in both cases.
    /// [`SwapError::SwapInProgress`] if another orchestrator holds the store.
    pub fn resume_pending(&self) -> SwapResult<ResumeOutcome> {
        self.resume_where(|_| true)
    }

    /// Like [`resume_pending`](Self::resume_pending), but only for an intent
    /// whose destination is `dest`. An intent for another file is left in
    /// place and reported as [`ResumeOutcome::NothingToDo`].
    pub fn resume_pending_for(&self, dest: &Path) -> SwapResult<ResumeOutcome> {
        self.resume_where(|intent| intent.dest == dest)
    }

    fn resume_where(&self, accept: impl Fn(&SwapIntent) -> bool) -> SwapResult<ResumeOutcome> {
        let _run = self.begin()?;
        let intents = self.intents.lock()?;
        let Some(intent) = intents.load()? else {
            debug!("no pending swap");
            return Ok(ResumeOutcome::NothingToDo);
        };
        if !accept(&intent) {
            info!(dest = %intent.dest.display(), "pending swap targets another module; left in place");
            return Ok(ResumeOutcome::NothingToDo);
        }

        self.set_state(SwapState::Resuming);
        info!(
            source = %intent.source.display(),
            dest = %intent.dest.display(),
            requested_at = intent.requested_at,
            "resuming pending swap"
        );

        match self.files.replace(&intent.source, &intent.dest) {
            Ok(()) => {}
            Err(ReplaceError::Locked(_)) => {
                return Err(SwapError::DestinationLocked {
                    path: intent.dest.clone(),
                });
            }
            Err(ReplaceError::Io(e)) => return Err(SwapError::io(&intent.dest, e)),
        }

        intents.clear()?;
        info!(dest = %intent.dest.display(), "pending swap completed");
        Ok(ResumeOutcome::Completed(intent))
    }

    /// Ok(true) on success, Ok(false) when locked.
    fn try_replace(&self, source: &Path, dest: &Path) -> SwapResult<bool> {
        match self.files.replace(source, dest) {
            Ok(()) => Ok(true),
            Err(ReplaceError::Locked(e)) => {
                debug!(dest = %dest.display(), error = %e, "destination locked");
                Ok(false)
            }
            Err(ReplaceError::Io(e)) => Err(SwapError::io(dest, e)),
        }
    }

    fn set_state(&self, state: SwapState) {
        *self.state.write() = state;
    }

    fn begin(&self) -> SwapResult<RunGuard<'_>> {
        if self
            .running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(SwapError::SwapInProgress);
        }
        Ok(RunGuard { owner: self })
    }
}

impl fmt::Debug for SwapOrchestrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SwapOrchestrator")
            .field("config", &self.config)
            .field("intents", &self.intents)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

/// Clears the running flag and state however a run ends.
struct RunGuard<'a> {
    owner: &'a SwapOrchestrator,
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.owner.set_state(SwapState::Idle);
        self.owner.running.store(false, Ordering::Release);
    }
}

fn pause(delay: Duration) {
    if !delay.is_zero() {
        thread::sleep(delay);
    }
}
