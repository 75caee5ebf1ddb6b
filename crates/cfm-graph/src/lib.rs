//! Resource graph construction.
//!
//! Ingests discovered stacks and independent resources into one directed
//! dependency graph. Strong edges come from explicit ordering hints and
//! property references; weak edges from best-effort identifier matching.
//! An edge `A -> B` means B depends on A.
//!
//! # Core Concepts
//!
//! - [`ResourceGraph`]: nodes in ingestion order plus typed edges
//! - [`GraphBuilder`]: inventory ingestion and edge wiring
//! - [`EdgeKind`]: strong (load-bearing) vs weak (advisory) edges

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod builder;
mod error;
mod graph;

pub use builder::GraphBuilder;
pub use error::GraphError;
pub use graph::{EdgeKind, ResourceGraph};
