//! The engine's consolidated error type.

use cfm_graph::GraphError;
use cfm_modules::PartitionError;

/// Any fatal failure of a conversion run.
///
/// Only structural problems abort a conversion: a hard dependency cycle
/// in the graph, or modules that end up depending on each other. Every
/// per-resource problem degrades to a finding instead.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Graph construction or validation failed.
    #[error("graph construction failed: {0}")]
    Graph(#[from] GraphError),

    /// Module partitioning failed.
    #[error("module partitioning failed: {0}")]
    Partition(#[from] PartitionError),
}
