//! Shared data model for the conversion and import-planning engine.
//!
//! Everything that flows between phases lives here: node identity, the
//! resource record itself, resolved values, non-fatal findings, and the
//! inventory handed over by the discovery pass.
//!
//! # Core Concepts
//!
//! - [`NodeId`]: stable 32-byte fingerprint identifying one resource
//! - [`ResourceNode`]: the record every phase reads and fills in
//! - [`PropertyValue`] / [`TargetExpr`]: resolved literal trees with
//!   symbolic leaves for target-system values
//! - [`Finding`]: non-fatal manual-conversion markers
//! - [`Inventory`]: the discovery-engine input

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod finding;
mod id;
mod inventory;
pub mod names;
mod node;
mod value;

pub use finding::Finding;
pub use id::{IdError, NodeId};
pub use inventory::{IndependentResource, Inventory, StackRecord};
pub use node::{LifecycleTier, Origin, ResourceNode};
pub use value::{PropertyValue, TargetExpr};
