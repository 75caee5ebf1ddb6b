//! The conversion and import-planning engine, in one facade.
//!
//! [`Engine::convert`] takes a discovery [`Inventory`](cfm_model::Inventory)
//! through the full pipeline: dependency graph construction, intrinsic
//! resolution against deployed state, source-to-target type mapping,
//! module partitioning, and import planning. The result is a
//! [`Conversion`]: the module tree for a code emitter, the ordered import
//! plan for an execution harness, and a report of everything that needs a
//! human.
//!
//! The engine is synchronous and deterministic. It performs no I/O and
//! spawns nothing; callers own files, clouds, and threads.

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod config;
mod engine;
mod error;
mod report;

pub use config::MigrationConfig;
pub use engine::{Conversion, Engine};
pub use error::EngineError;
pub use report::{ConversionReport, ReportCounts, ReportEntry};
