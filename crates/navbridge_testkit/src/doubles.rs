//! Scripted hosts and file layers for swap tests.

use navbridge_core::Fingerprint;
use navbridge_swap::{HostEnvironment, ModuleFiles, OsFiles, ReloadChoice, ReloadKind, ReplaceError};
use parking_lot::Mutex;
use std::io;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;

/// A shared "the destination is in use" flag.
///
/// Cloned into both a [`FlakyFiles`] and a [`ScriptedHost`] it lets the host
/// release the lock the way a real quiesce or reload would.
#[derive(Debug, Clone, Default)]
pub struct LockSwitch(Arc<AtomicBool>);

impl LockSwitch {
    /// A switch that starts locked.
    pub fn locked() -> Self {
        Self(Arc::new(AtomicBool::new(true)))
    }

    /// A switch that starts unlocked.
    pub fn unlocked() -> Self {
        Self::default()
    }

    /// Locks the destination.
    pub fn lock(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Unlocks the destination.
    pub fn unlock(&self) {
        self.0.store(false, Ordering::SeqCst);
    }

    /// Returns true while locked.
    pub fn is_locked(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Default)]
struct FlakyState {
    locked_attempts: Mutex<u32>,
    attempts: AtomicU32,
    writes: AtomicU32,
}

/// Real file replacement that reports a lock while told to.
///
/// A replace is refused while the [`LockSwitch`] is on, and for the first
/// `n` attempts when built with [`FlakyFiles::locked_for`]. Clones share
/// their counters.
#[derive(Debug, Clone)]
pub struct FlakyFiles {
    switch: LockSwitch,
    state: Arc<FlakyState>,
}

impl FlakyFiles {
    /// Files locked while `switch` is on.
    pub fn new(switch: LockSwitch) -> Self {
        Self {
            switch,
            state: Arc::default(),
        }
    }

    /// Files locked for the first `attempts` replace calls.
    pub fn locked_for(attempts: u32) -> Self {
        let files = Self::new(LockSwitch::unlocked());
        *files.state.locked_attempts.lock() = attempts;
        files
    }

    /// Replace calls made so far.
    pub fn attempts(&self) -> u32 {
        self.state.attempts.load(Ordering::SeqCst)
    }

    /// Replace calls that wrote the destination.
    pub fn writes(&self) -> u32 {
        self.state.writes.load(Ordering::SeqCst)
    }

    fn refuse(&self) -> bool {
        if self.switch.is_locked() {
            return true;
        }
        let mut remaining = self.state.locked_attempts.lock();
        if *remaining > 0 {
            *remaining -= 1;
            true
        } else {
            false
        }
    }
}

impl ModuleFiles for FlakyFiles {
    fn replace(&self, source: &Path, dest: &Path) -> Result<(), ReplaceError> {
        self.state.attempts.fetch_add(1, Ordering::SeqCst);
        if self.refuse() {
            return Err(ReplaceError::Locked(io::Error::new(
                io::ErrorKind::PermissionDenied,
                "module file is in use",
            )));
        }
        OsFiles.replace(source, dest)?;
        self.state.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn fingerprint(&self, path: &Path) -> io::Result<Fingerprint> {
        OsFiles.fingerprint(path)
    }
}

/// A host call seen by [`ScriptedHost`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostCall {
    /// `confirm_quiesce`
    ConfirmQuiesce,
    /// `try_quiesce`
    TryQuiesce,
    /// `resume`
    Resume,
    /// `release_references`
    ReleaseReferences,
    /// `choose_reload`
    ChooseReload,
    /// `request_reload`
    RequestReload(ReloadKind),
    /// `on_swapped`
    Swapped,
}

/// A host whose capabilities and answers are set up front.
///
/// By default it has no quiesce support, declines reloads and records every
/// call it receives.
#[derive(Debug, Clone)]
pub struct ScriptedHost {
    quiesce: Option<bool>,
    confirm: bool,
    reload_choice: ReloadChoice,
    reload_starts: bool,
    unlock_on_quiesce: Option<LockSwitch>,
    unlock_on_release: Option<LockSwitch>,
    calls: Vec<HostCall>,
}

impl Default for ScriptedHost {
    fn default() -> Self {
        Self {
            quiesce: None,
            confirm: true,
            reload_choice: ReloadChoice::Decline,
            reload_starts: true,
            unlock_on_quiesce: None,
            unlock_on_release: None,
            calls: Vec::new(),
        }
    }
}

impl ScriptedHost {
    /// A host with no capabilities.
    pub fn new() -> Self {
        Self::default()
    }

    /// Supports quiesce; `succeeds` is what `try_quiesce` answers.
    pub fn with_quiesce(mut self, succeeds: bool) -> Self {
        self.quiesce = Some(succeeds);
        self
    }

    /// The user declines the in-place disable.
    pub fn declining_quiesce(mut self) -> Self {
        self.confirm = false;
        self
    }

    /// Answer given when asked how to reload.
    pub fn choosing(mut self, choice: ReloadChoice) -> Self {
        self.reload_choice = choice;
        self
    }

    /// `request_reload` reports that no reload could be started.
    pub fn reload_fails(mut self) -> Self {
        self.reload_starts = false;
        self
    }

    /// A successful quiesce unlocks `switch`; resume locks it again.
    pub fn unlocking_on_quiesce(mut self, switch: LockSwitch) -> Self {
        self.unlock_on_quiesce = Some(switch);
        self
    }

    /// Reference release unlocks `switch`.
    pub fn unlocking_on_release(mut self, switch: LockSwitch) -> Self {
        self.unlock_on_release = Some(switch);
        self
    }

    /// Calls received, in order.
    pub fn calls(&self) -> &[HostCall] {
        &self.calls
    }

    /// How often `call` was received.
    pub fn count(&self, call: HostCall) -> usize {
        self.calls.iter().filter(|c| **c == call).count()
    }
}

impl HostEnvironment for ScriptedHost {
    fn supports_quiesce(&self) -> bool {
        self.quiesce.is_some()
    }

    fn confirm_quiesce(&mut self, _module: &Path) -> bool {
        self.calls.push(HostCall::ConfirmQuiesce);
        self.confirm
    }

    fn try_quiesce(&mut self, _module: &Path) -> bool {
        self.calls.push(HostCall::TryQuiesce);
        let succeeded = self.quiesce.unwrap_or(false);
        if succeeded {
            if let Some(switch) = &self.unlock_on_quiesce {
                switch.unlock();
            }
        }
        succeeded
    }

    fn resume(&mut self, _module: &Path) {
        self.calls.push(HostCall::Resume);
        if let Some(switch) = &self.unlock_on_quiesce {
            switch.lock();
        }
    }

    fn release_references(&mut self, _module: &Path) {
        self.calls.push(HostCall::ReleaseReferences);
        if let Some(switch) = &self.unlock_on_release {
            switch.unlock();
        }
    }

    fn choose_reload(&mut self, _module: &Path) -> ReloadChoice {
        self.calls.push(HostCall::ChooseReload);
        self.reload_choice
    }

    fn request_reload(&mut self, kind: ReloadKind) -> bool {
        self.calls.push(HostCall::RequestReload(kind));
        self.reload_starts
    }

    fn on_swapped(&mut self, _module: &Path) {
        self.calls.push(HostCall::Swapped);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn locked_for_counts_down() {
        let temp = tempfile::tempdir().unwrap();
        let source = temp.path().join("new.so");
        let dest = temp.path().join("nav.so");
        std::fs::write(&source, b"new").unwrap();

        let files = FlakyFiles::locked_for(1);
        assert!(matches!(files.replace(&source, &dest), Err(ReplaceError::Locked(_))));
        files.replace(&source, &dest).unwrap();
        assert_eq!(files.attempts(), 2);
        assert_eq!(files.writes(), 1);
    }

    #[test]
    fn switch_is_shared() {
        let switch = LockSwitch::locked();
        let mut host = ScriptedHost::new().unlocking_on_release(switch.clone());
        host.release_references(Path::new("nav.so"));
        assert!(!switch.is_locked());
        assert_eq!(host.calls(), &[HostCall::ReleaseReferences]);
    }
}
