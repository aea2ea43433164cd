// ABOUTME: Polling configuration for a single synchronizer instance
// ABOUTME: Immutable for the lifetime of the instance; validated on construction

use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SyncConfigError {
    #[error("polling interval must be greater than zero")]
    ZeroInterval,
    #[error("focus threshold must be greater than zero")]
    ZeroFocusThreshold,
}

/// Timing knobs of a synchronizer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollingConfig {
    /// Period of the background timer
    pub interval: Duration,
    /// Non-forced attempts closer than this to the last successful one are skipped
    pub min_update_interval: Duration,
    /// Window focus only refetches when the last attempt is older than this
    pub focus_threshold: Duration,
    /// When false, `start` does nothing
    pub enabled: bool,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(60),
            min_update_interval: Duration::from_secs(5),
            focus_threshold: Duration::from_secs(30),
            enabled: true,
        }
    }
}

impl PollingConfig {
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn validate(&self) -> Result<(), SyncConfigError> {
        if self.interval.is_zero() {
            return Err(SyncConfigError::ZeroInterval);
        }
        if self.focus_threshold.is_zero() {
            return Err(SyncConfigError::ZeroFocusThreshold);
        }
        Ok(())
    }
}
