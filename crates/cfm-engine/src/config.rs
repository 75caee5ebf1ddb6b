//! Engine configuration.

use cfm_modules::{OrganizationStrategy, PartitionOptions};
use cfm_plan::RetryPolicy;
use serde::{Deserialize, Serialize};

/// Caller-supplied configuration for one engine instance.
///
/// This is a plain value: the caller decides where it comes from (flags,
/// a config file, hard-coded defaults) and hands it over already built.
/// Every field has a default, so partial documents deserialize cleanly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MigrationConfig {
    /// How resources are grouped into modules.
    pub strategy: OrganizationStrategy,
    /// Hybrid only: stack modules smaller than this merge into the
    /// service buckets.
    pub hybrid_min_module_size: usize,
    /// Hybrid only: stack modules larger than this split along service
    /// lines.
    pub hybrid_max_module_size: usize,
    /// Keep source resource names verbatim where they are already valid
    /// identifiers.
    pub preserve_original_names: bool,
    /// Retry behavior for import execution.
    pub retry_policy: RetryPolicy,
}

impl Default for MigrationConfig {
    fn default() -> Self {
        let partition = PartitionOptions::default();
        Self {
            strategy: partition.strategy,
            hybrid_min_module_size: partition.hybrid_min_module_size,
            hybrid_max_module_size: partition.hybrid_max_module_size,
            preserve_original_names: partition.preserve_original_names,
            retry_policy: RetryPolicy::default(),
        }
    }
}

impl MigrationConfig {
    pub(crate) fn partition_options(&self) -> PartitionOptions {
        PartitionOptions {
            strategy: self.strategy,
            hybrid_min_module_size: self.hybrid_min_module_size,
            hybrid_max_module_size: self.hybrid_max_module_size,
            preserve_original_names: self.preserve_original_names,
        }
    }
}
