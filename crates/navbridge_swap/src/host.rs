//! Host capabilities used by the swap ladder.

use navbridge_core::NativeModuleHandle;
use std::path::Path;
use tracing::{info, warn};

/// How disruptive a host reload is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReloadKind {
    /// Restart the whole host process.
    FullRestart,
    /// Enter and leave the host's run mode, which drops module references
    /// without a restart.
    RunStopCycle,
}

impl std::fmt::Display for ReloadKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReloadKind::FullRestart => f.write_str("full restart"),
            ReloadKind::RunStopCycle => f.write_str("run/stop cycle"),
        }
    }
}

/// The user's answer when every lightweight strategy failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReloadChoice {
    /// Reload the host in the given way.
    Reload(ReloadKind),
    /// Leave the swap pending for later.
    Decline,
}

/// What the surrounding host can do for a swap.
///
/// Every method has a conservative default, so a host implements only the
/// capabilities it really has. A host without quiesce support goes from the
/// content check to reference release.
pub trait HostEnvironment {
    /// Whether the host can disable a single module in place.
    fn supports_quiesce(&self) -> bool {
        false
    }

    /// Asks the user before disabling the module. Returning false cancels the swap.
    fn confirm_quiesce(&mut self, _module: &Path) -> bool {
        true
    }

    /// Marks the module disabled for the current host context.
    fn try_quiesce(&mut self, _module: &Path) -> bool {
        false
    }

    /// Re-enables a module disabled by [`Self::try_quiesce`].
    fn resume(&mut self, _module: &Path) {}

    /// Drops cached references to the module and collects garbage.
    ///
    /// Best effort; the orchestrator retries the copy afterwards either way.
    fn release_references(&mut self, _module: &Path) {}

    /// Asks the user how to proceed once the swap must wait for a reload.
    fn choose_reload(&mut self, _module: &Path) -> ReloadChoice {
        ReloadChoice::Decline
    }

    /// Starts a reload. Returns false if the host could not start one.
    fn request_reload(&mut self, _kind: ReloadKind) -> bool {
        false
    }

    /// Called after the module file has been replaced.
    fn on_swapped(&mut self, _module: &Path) {}
}

/// A host that also owns the [`NativeModuleHandle`] of the module being swapped.
///
/// Reference release unloads the handle; a successful replace loads the
/// new file into it. Everything else is forwarded to the wrapped host.
pub struct ModuleHandleHost<'a, H> {
    handle: &'a mut NativeModuleHandle,
    inner: H,
}

impl<'a, H: HostEnvironment> ModuleHandleHost<'a, H> {
    /// Wraps `inner` together with `handle`.
    pub fn new(handle: &'a mut NativeModuleHandle, inner: H) -> Self {
        Self { handle, inner }
    }

    /// The wrapped host.
    pub fn inner(&self) -> &H {
        &self.inner
    }

    /// Unwraps the host.
    pub fn into_inner(self) -> H {
        self.inner
    }

    fn owns(&self, module: &Path) -> bool {
        self.handle.path() == module
    }
}

impl<H: HostEnvironment> HostEnvironment for ModuleHandleHost<'_, H> {
    fn supports_quiesce(&self) -> bool {
        self.inner.supports_quiesce()
    }

    fn confirm_quiesce(&mut self, module: &Path) -> bool {
        self.inner.confirm_quiesce(module)
    }

    fn try_quiesce(&mut self, module: &Path) -> bool {
        self.inner.try_quiesce(module)
    }

    fn resume(&mut self, module: &Path) {
        self.inner.resume(module);
    }

    fn release_references(&mut self, module: &Path) {
        if self.owns(module) && self.handle.is_loaded() {
            info!(module = %module.display(), "unloading module handle for swap");
            self.handle.cleanup();
        }
        self.inner.release_references(module);
    }

    fn choose_reload(&mut self, module: &Path) -> ReloadChoice {
        self.inner.choose_reload(module)
    }

    fn request_reload(&mut self, kind: ReloadKind) -> bool {
        self.inner.request_reload(kind)
    }

    fn on_swapped(&mut self, module: &Path) {
        if self.owns(module) {
            self.handle.cleanup();
            match self.handle.init() {
                Ok(()) => info!(
                    module = %module.display(),
                    fingerprint = ?self.handle.loaded_fingerprint(),
                    "module handle reloaded"
                ),
                Err(e) => warn!(module = %module.display(), error = %e, "reload after swap failed"),
            }
        }
        self.inner.on_swapped(module);
    }
}

impl<H: std::fmt::Debug> std::fmt::Debug for ModuleHandleHost<'_, H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModuleHandleHost")
            .field("handle", &self.handle)
            .field("inner", &self.inner)
            .finish()
    }
}
