//! Partitioning errors.

/// Errors raised while partitioning resources into modules.
#[derive(Debug, thiserror::Error)]
pub enum PartitionError {
    /// The module-collapsed dependency graph has a cycle. Fatal: modules
    /// that depend on each other's outputs cannot be instantiated.
    #[error("cyclic module dependency: {path:?}")]
    CyclicModuleDependency {
        /// Names of the modules on the cycle.
        path: Vec<String>,
    },
}
