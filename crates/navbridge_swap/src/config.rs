//! Configuration for the swap orchestrator.

use std::time::Duration;

/// Configuration for swap operations.
#[derive(Debug, Clone)]
pub struct SwapConfig {
    /// Wait after a successful quiesce before retrying the copy.
    pub settle_delay: Duration,
    /// How many times the reference-release step retries the copy.
    pub release_attempts: u32,
    /// Wait after each reference release before retrying the copy.
    pub release_retry_delay: Duration,
    /// Prefix of the three intent keys in the durable store.
    pub store_key_prefix: String,
}

impl SwapConfig {
    /// Creates a configuration with default timings.
    pub fn new() -> Self {
        Self {
            settle_delay: Duration::from_millis(250),
            release_attempts: 3,
            release_retry_delay: Duration::from_millis(100),
            store_key_prefix: "navbridge.swap".to_string(),
        }
    }

    /// A configuration with no waits, for tests and scripted hosts.
    pub fn immediate() -> Self {
        Self {
            settle_delay: Duration::ZERO,
            release_retry_delay: Duration::ZERO,
            ..Self::new()
        }
    }

    /// Sets the quiesce settle delay.
    #[must_use]
    pub fn with_settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = delay;
        self
    }

    /// Sets the number of reference-release attempts.
    #[must_use]
    pub fn with_release_attempts(mut self, attempts: u32) -> Self {
        self.release_attempts = attempts;
        self
    }

    /// Sets the delay after each reference release.
    #[must_use]
    pub fn with_release_retry_delay(mut self, delay: Duration) -> Self {
        self.release_retry_delay = delay;
        self
    }

    /// Sets the intent key prefix.
    #[must_use]
    pub fn with_store_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.store_key_prefix = prefix.into();
        self
    }
}

impl Default for SwapConfig {
    fn default() -> Self {
        Self::new()
    }
}
