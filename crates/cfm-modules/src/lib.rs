//! Module organization.
//!
//! Partitions the converted resource graph into modules under one of four
//! strategies, then derives the module boundary: a reference that crosses
//! modules becomes an output on the producer and a bound input variable on
//! the consumer, and the consuming property tree is rewritten to use the
//! variable. The collapsed module graph must stay acyclic.
//!
//! # Core Concepts
//!
//! - [`OrganizationStrategy`]: by-service, by-stack, by-lifecycle, hybrid
//! - [`partition`]: the single entry point, a pure function of its inputs
//! - [`ModuleSet`]: modules, membership, and boundary wiring

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod category;
mod error;
mod module;
mod partition;

pub use error::PartitionError;
pub use module::{
    Module, ModuleOutput, ModuleResource, ModuleSet, ModuleVariable, VariableBinding,
};
pub use partition::{partition, OrganizationStrategy, PartitionContext, PartitionOptions};
