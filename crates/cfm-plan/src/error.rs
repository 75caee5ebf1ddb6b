//! Planning and tracking errors.

use crate::status::ImportStatus;

/// Errors raised while driving an import plan.
#[derive(Debug, thiserror::Error)]
pub enum PlanError {
    /// The requested status change is not a legal transition.
    #[error("illegal import status transition: {from:?} -> {to:?}")]
    IllegalTransition {
        /// Status before the attempt.
        from: ImportStatus,
        /// Status the caller asked for.
        to: ImportStatus,
    },

    /// Feedback arrived for an address the plan does not contain.
    #[error("no import entry at address `{address}`")]
    UnknownEntry {
        /// The unmatched address.
        address: String,
    },
}
