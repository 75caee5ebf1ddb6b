//! Execution feedback over a derived plan.
//!
//! The planner itself never talks to a provider. An external executor
//! pulls batches from a [`PlanTracker`], performs the imports however it
//! likes, and reports outcomes back; the tracker applies the retry
//! policy and keeps every entry's status machine honest.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::PlanError;
use crate::plan::ImportPlan;
use crate::policy::RetryPolicy;
use crate::status::{validate_transition, ImportStatus};

/// What an executor should do with an entry after reporting a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Try again after waiting out the backoff.
    Retry {
        /// Retry number, starting at 1.
        attempt: u32,
        /// How long to wait before the next attempt.
        backoff: Duration,
    },
    /// Retries are exhausted; the entry is failed for good.
    GiveUp,
}

/// Tally over a tracked plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PlanSummary {
    /// Entries bound successfully.
    pub succeeded: usize,
    /// Entries that exhausted their retries.
    pub failed: usize,
    /// Resources never planned, with reasons recorded on the plan.
    pub skipped: usize,
    /// Entries not yet settled.
    pub pending: usize,
}

/// Drives execution over an [`ImportPlan`].
///
/// Batches come out in index order, and a batch is only released once
/// every entry of the earlier batches has settled. Failures consume
/// retries per the policy; a timed-out attempt is reported the same way
/// as a failed one.
#[derive(Debug)]
pub struct PlanTracker {
    plan: ImportPlan,
    policy: RetryPolicy,
    cancelled: bool,
    cursor: usize,
}

impl PlanTracker {
    /// Wraps a freshly derived plan.
    #[must_use]
    pub fn new(plan: ImportPlan, policy: RetryPolicy) -> Self {
        Self {
            plan,
            policy,
            cancelled: false,
            cursor: 0,
        }
    }

    /// The retry policy in force.
    #[must_use]
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Read access to the tracked plan.
    #[must_use]
    pub fn plan(&self) -> &ImportPlan {
        &self.plan
    }

    /// Hands the plan back with whatever statuses were recorded.
    #[must_use]
    pub fn into_plan(self) -> ImportPlan {
        self.plan
    }

    /// Addresses of the next batch, moving its entries to `Executing`.
    ///
    /// Returns `None` while an earlier batch still has unsettled entries,
    /// after [`cancel`](Self::cancel), and once every batch has been
    /// handed out.
    pub fn next_batch(&mut self) -> Option<Vec<String>> {
        if self.cancelled || self.cursor >= self.plan.batch_count() {
            return None;
        }
        let blocked = self
            .plan
            .entries()
            .iter()
            .any(|entry| entry.batch < self.cursor && !entry.status.is_terminal());
        if blocked {
            return None;
        }
        let index = self.cursor;
        self.cursor += 1;
        let mut addresses = Vec::new();
        for entry in self.plan.entries_mut() {
            if entry.batch == index
                && validate_transition(entry.status, ImportStatus::Executing).is_ok()
            {
                entry.status = ImportStatus::Executing;
                addresses.push(entry.address.clone());
            }
        }
        tracing::debug!(batch = index, entries = addresses.len(), "batch released");
        Some(addresses)
    }

    /// Records a successful bind.
    ///
    /// # Errors
    /// [`PlanError::UnknownEntry`] for an address the plan does not hold,
    /// [`PlanError::IllegalTransition`] when the entry was not executing.
    pub fn record_success(&mut self, address: &str) -> Result<(), PlanError> {
        let entry = self
            .plan
            .entry_mut(address)
            .ok_or_else(|| PlanError::UnknownEntry {
                address: address.to_string(),
            })?;
        validate_transition(entry.status, ImportStatus::Succeeded)?;
        entry.status = ImportStatus::Succeeded;
        Ok(())
    }

    /// Records a failed attempt and decides what happens next.
    ///
    /// While retries remain the entry moves to `Retrying` and the caller
    /// gets the backoff to wait out; once they are spent the entry is
    /// failed for good.
    ///
    /// # Errors
    /// [`PlanError::UnknownEntry`] for an address the plan does not hold,
    /// [`PlanError::IllegalTransition`] when the entry was not executing.
    pub fn record_failure(&mut self, address: &str) -> Result<RetryDecision, PlanError> {
        let max_retries = self.policy.max_retries;
        let entry = self
            .plan
            .entry_mut(address)
            .ok_or_else(|| PlanError::UnknownEntry {
                address: address.to_string(),
            })?;
        if entry.retries < max_retries {
            let attempt = entry.retries + 1;
            validate_transition(entry.status, ImportStatus::Retrying(attempt))?;
            entry.retries = attempt;
            entry.status = ImportStatus::Retrying(attempt);
            let backoff = self.policy.backoff(attempt);
            tracing::debug!(
                address,
                attempt,
                backoff_ms = backoff.as_millis() as u64,
                "retry scheduled"
            );
            Ok(RetryDecision::Retry { attempt, backoff })
        } else {
            validate_transition(entry.status, ImportStatus::Failed)?;
            entry.status = ImportStatus::Failed;
            tracing::warn!(address, retries = max_retries, "import failed after retries ran out");
            Ok(RetryDecision::GiveUp)
        }
    }

    /// Moves a waiting entry back to `Executing` after its backoff.
    ///
    /// # Errors
    /// [`PlanError::UnknownEntry`] for an address the plan does not hold,
    /// [`PlanError::IllegalTransition`] when the entry was not retrying.
    pub fn begin_retry(&mut self, address: &str) -> Result<(), PlanError> {
        let entry = self
            .plan
            .entry_mut(address)
            .ok_or_else(|| PlanError::UnknownEntry {
                address: address.to_string(),
            })?;
        validate_transition(entry.status, ImportStatus::Executing)?;
        entry.status = ImportStatus::Executing;
        Ok(())
    }

    /// Stops releasing batches. Entries already handed out still settle
    /// through the usual feedback calls.
    pub fn cancel(&mut self) {
        if !self.cancelled {
            self.cancelled = true;
            tracing::info!("import cancelled; in-flight entries may still settle");
        }
    }

    /// True once cancellation was requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    /// True once every entry has reached a terminal status.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.plan
            .entries()
            .iter()
            .all(|entry| entry.status.is_terminal())
    }

    /// Current tally, counting never-planned resources as skipped.
    #[must_use]
    pub fn summary(&self) -> PlanSummary {
        let mut summary = PlanSummary {
            skipped: self.plan.skipped().len(),
            ..PlanSummary::default()
        };
        for entry in self.plan.entries() {
            match entry.status {
                ImportStatus::Succeeded => summary.succeeded += 1,
                ImportStatus::Failed => summary.failed += 1,
                _ => summary.pending += 1,
            }
        }
        summary
    }
}
