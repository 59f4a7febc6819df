use crate::config::CameraConfig;
use crate::error::CameraError;
use std::time::Duration;
use tracing::{error, warn};

/// Recovery action to take after a failed frame read
#[derive(Debug, Clone, PartialEq)]
pub enum RecoveryAction {
    /// Pause, then read again
    RetryAfterDelay(Duration),
    /// Stop the session
    Shutdown,
}

/// Decides how the frame loop reacts to consecutive read failures
#[derive(Debug, Clone)]
pub struct ReadFailurePolicy {
    /// Consecutive failures that end the session
    pub threshold: u32,
    /// Pause after each failure below the threshold
    pub pause: Duration,
}

impl ReadFailurePolicy {
    pub fn new(threshold: u32, pause: Duration) -> Self {
        Self { threshold, pause }
    }

    /// Determine the action after the `consecutive`-th failure in a row
    pub fn on_failure(&self, consecutive: u32, error: &CameraError) -> RecoveryAction {
        if consecutive >= self.threshold {
            error!(
                "Giving up after {} consecutive read failures: {}",
                consecutive, error
            );
            return RecoveryAction::Shutdown;
        }

        warn!(
            "Frame read failed ({}/{}): {}",
            consecutive, self.threshold, error
        );
        RecoveryAction::RetryAfterDelay(self.pause)
    }
}

impl From<&CameraConfig> for ReadFailurePolicy {
    fn from(config: &CameraConfig) -> Self {
        Self::new(config.read_failure_threshold, config.read_failure_pause())
    }
}

impl Default for ReadFailurePolicy {
    fn default() -> Self {
        Self::new(10, Duration::from_millis(100))
    }
}
