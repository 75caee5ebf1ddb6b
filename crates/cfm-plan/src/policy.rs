//! Retry policy for externally executed entries.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Failure handling for import execution: bounded retries with exponential
/// backoff. The planner never sleeps; workers read the pause from
/// [`RetryPolicy::backoff`] and the per-entry budget from `entry_timeout`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Retries after the initial attempt before an entry fails for good.
    pub max_retries: u32,
    /// Pause before the first retry.
    pub initial_backoff: Duration,
    /// Growth factor between consecutive retries.
    pub backoff_multiplier: u32,
    /// Upper bound on any single pause.
    pub max_backoff: Duration,
    /// Budget for one attempt; exceeding it counts as a failed attempt.
    pub entry_timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_backoff: Duration::from_millis(500),
            backoff_multiplier: 2,
            max_backoff: Duration::from_secs(30),
            entry_timeout: Duration::from_secs(300),
        }
    }
}

impl RetryPolicy {
    /// Pause before retry `attempt` (1-based): the initial backoff scaled
    /// by the multiplier per prior retry, capped at `max_backoff`.
    #[must_use]
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = self
            .backoff_multiplier
            .saturating_pow(attempt.saturating_sub(1));
        self.initial_backoff.saturating_mul(factor).min(self.max_backoff)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_doubles_until_the_cap() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.backoff(1), Duration::from_millis(500));
        assert_eq!(policy.backoff(2), Duration::from_secs(1));
        assert_eq!(policy.backoff(3), Duration::from_secs(2));
        assert_eq!(policy.backoff(7), Duration::from_secs(30));
        assert_eq!(policy.backoff(40), Duration::from_secs(30));
    }

    #[test]
    fn defaults_match_the_documented_policy() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_retries, 3);
        assert_eq!(policy.entry_timeout, Duration::from_secs(300));
    }
}
