//! CloudFormation template model.
//!
//! Parses template bodies (JSON or YAML, including the `!Ref` family of
//! short-form tags) into a closed intrinsic-expression tree. Decoding
//! happens exactly once at ingestion; every later phase works on [`Expr`]
//! values and never re-interprets raw JSON.
//!
//! # Core Concepts
//!
//! - [`TemplateBody`]: decoded Parameters/Mappings/Conditions/Resources/Outputs
//! - [`Expr`]: the closed union of supported intrinsic forms
//! - [`sub`]: `Fn::Sub` placeholder parsing
//! - [`TemplateError`]: structural problems found while decoding

#![warn(unreachable_pub)]

mod body;
mod error;
mod expr;
pub mod sub;
mod yaml;

pub use body::{MappingTable, OutputDef, ParameterDef, ResourceDef, TemplateBody};
pub use error::TemplateError;
pub use expr::Expr;
