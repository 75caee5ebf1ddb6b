//! The per-entry execution state machine.

use serde::{Deserialize, Serialize};

use crate::error::PlanError;

/// Execution status of one import entry.
///
/// Exactly one external worker owns an entry while it is `Executing`; the
/// tracker is the only writer of the status field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportStatus {
    /// Not yet handed to a worker.
    Pending,
    /// Owned by a worker right now.
    Executing,
    /// Failed and waiting out the backoff before retry number `n`.
    Retrying(u32),
    /// Bound successfully.
    Succeeded,
    /// Retries exhausted.
    Failed,
}

impl ImportStatus {
    /// True once the entry can never change status again.
    #[inline]
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, ImportStatus::Succeeded | ImportStatus::Failed)
    }
}

/// Validates a status transition.
///
/// Illegal transitions, including any change out of a terminal status,
/// come back as [`PlanError::IllegalTransition`] rather than a panic.
pub fn validate_transition(from: ImportStatus, to: ImportStatus) -> Result<(), PlanError> {
    if allowed(from, to) {
        Ok(())
    } else {
        Err(PlanError::IllegalTransition { from, to })
    }
}

fn allowed(from: ImportStatus, to: ImportStatus) -> bool {
    use ImportStatus::{Executing, Failed, Pending, Retrying, Succeeded};
    matches!(
        (from, to),
        (Pending, Executing)
            | (Executing, Succeeded)
            | (Executing, Retrying(_))
            | (Executing, Failed)
            | (Retrying(_), Executing)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn happy_path_transitions_are_legal() {
        assert!(validate_transition(ImportStatus::Pending, ImportStatus::Executing).is_ok());
        assert!(validate_transition(ImportStatus::Executing, ImportStatus::Succeeded).is_ok());
        assert!(validate_transition(ImportStatus::Executing, ImportStatus::Retrying(1)).is_ok());
        assert!(validate_transition(ImportStatus::Retrying(2), ImportStatus::Executing).is_ok());
        assert!(validate_transition(ImportStatus::Executing, ImportStatus::Failed).is_ok());
    }

    #[test]
    fn terminal_states_accept_nothing() {
        for terminal in [ImportStatus::Succeeded, ImportStatus::Failed] {
            assert!(terminal.is_terminal());
            for next in [
                ImportStatus::Pending,
                ImportStatus::Executing,
                ImportStatus::Retrying(1),
                ImportStatus::Succeeded,
                ImportStatus::Failed,
            ] {
                assert!(matches!(
                    validate_transition(terminal, next),
                    Err(PlanError::IllegalTransition { .. })
                ));
            }
        }
    }

    #[test]
    fn pending_cannot_settle_directly() {
        assert!(validate_transition(ImportStatus::Pending, ImportStatus::Succeeded).is_err());
        assert!(validate_transition(ImportStatus::Pending, ImportStatus::Failed).is_err());
    }
}
