//! Dependency-ordered, retryable import planning.
//!
//! Converting a template tells you what the configuration should say;
//! this crate decides how the already-running resources get bound to it
//! without recreation. [`plan_imports`] turns a converted graph into an
//! [`ImportPlan`]: entries in dependency order, grouped into batches
//! with no edges between their members, plus a skip finding for every
//! resource that cannot be imported. [`PlanTracker`] then mediates
//! between the plan and whatever executes it, enforcing the per-entry
//! status machine and the retry policy.
//!
//! Planning is pure and deterministic. Nothing here sleeps, spawns, or
//! talks to a provider; backoff durations are returned to the caller to
//! wait out.

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod error;
mod plan;
mod policy;
mod status;
mod tracker;

pub use error::PlanError;
pub use plan::{plan_imports, ImportEntry, ImportPlan, ImportTarget};
pub use policy::RetryPolicy;
pub use status::{validate_transition, ImportStatus};
pub use tracker::{PlanSummary, PlanTracker, RetryDecision};
