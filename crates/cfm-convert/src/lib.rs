//! Conversion passes over an ingested resource graph.
//!
//! Two phases run in order. Resolution rewrites every node's decoded
//! intrinsic tree into [`cfm_model::PropertyValue`] form, collapsing
//! whatever the deployed state pins down and leaving the rest symbolic.
//! Mapping then stamps each node with its target type, target-shaped
//! properties, lifecycle tier, and importable identity, consulting an
//! immutable [`TypeRegistry`] that is built once and shared by reference.
//!
//! Neither phase can fail: unsupported types and unresolvable intrinsics
//! degrade to findings on the affected node and conversion continues.

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod builtin;
mod mapper;
mod pseudo;
mod registry;
mod resolve;

pub use mapper::map_graph;
pub use registry::{Discriminator, IdPart, ImportIdentity, Reshape, TypeMapping, TypeRegistry};
pub use resolve::{resolve_graph, ResolutionOutcome};
