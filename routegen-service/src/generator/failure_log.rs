//! Rate-limited reporting of consecutive refresh failures.

use tracing::{debug, info, warn};

use crate::error::GeneratorError;

/// Tracks a streak of failed refreshes.
///
/// The first failure of a streak and every `interval`-th one after it are
/// logged at `warn`; the rest at `debug`, so a long outage does not flood the log.
#[derive(Debug)]
pub(crate) struct FailureLog {
    interval: u32,
    streak: u32,
}

impl FailureLog {
    pub(crate) fn new(interval: u32) -> Self {
        Self {
            interval: interval.max(1),
            streak: 0,
        }
    }

    /// Record a failure and return the length of the current streak.
    pub(crate) fn failed(&mut self, err: &GeneratorError, retry_in_ms: u128) -> u32 {
        self.streak = self.streak.saturating_add(1);
        if self.should_warn() {
            warn!(
                "Failed to refresh routing table ({} consecutive failures), retrying in {} ms: {}",
                self.streak, retry_in_ms, err
            );
        } else {
            debug!("Failed to refresh routing table (attempt {}): {}", self.streak, err);
        }
        self.streak
    }

    /// End the current streak, if any.
    pub(crate) fn recovered(&mut self) {
        if self.streak > 0 {
            info!("Routing table refresh recovered after {} failed attempts", self.streak);
        }
        self.streak = 0;
    }

    fn should_warn(&self) -> bool {
        self.streak == 1 || self.streak % self.interval == 0
    }
}
