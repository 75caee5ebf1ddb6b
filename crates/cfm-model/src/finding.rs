//! Non-fatal conversion findings.
//!
//! A finding marks work the engine could not finish automatically. Findings
//! accumulate on nodes and in the consolidated report; they never abort a
//! conversion.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One manual-conversion finding attached to a resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Finding {
    /// The source type has no entry in the type registry.
    UnsupportedResourceType {
        /// Source type name as written in the template or inventory.
        source_type: String,
    },
    /// An intrinsic call the resolver does not understand.
    UnresolvedIntrinsic {
        /// Dotted path of the property holding the call.
        property_path: String,
        /// The intrinsic name as written.
        intrinsic: String,
        /// The whole call site, preserved verbatim.
        raw: Value,
    },
    /// The mapped resource is missing fields its target schema requires.
    MissingRequiredProperties {
        /// Target type name.
        target_type: String,
        /// The absent required fields.
        missing: Vec<String>,
    },
    /// A nested stack resource; its child template must be converted by hand.
    NestedStack {
        /// Logical id of the nested stack resource.
        logical_id: String,
    },
    /// The resource was left out of the import plan.
    SkippedImport {
        /// Why no import entry was produced.
        reason: String,
    },
}

impl Finding {
    /// Human-readable explanation for the report.
    #[must_use]
    pub fn reason(&self) -> String {
        match self {
            Finding::UnsupportedResourceType { source_type } => {
                format!("no mapping is registered for source type `{source_type}`")
            }
            Finding::UnresolvedIntrinsic {
                property_path,
                intrinsic,
                ..
            } => format!("property `{property_path}` uses unsupported intrinsic `{intrinsic}`"),
            Finding::MissingRequiredProperties {
                target_type,
                missing,
            } => format!(
                "`{target_type}` is missing required properties: {}",
                missing.join(", ")
            ),
            Finding::NestedStack { logical_id } => {
                format!("nested stack `{logical_id}` must be converted separately")
            }
            Finding::SkippedImport { reason } => format!("import skipped: {reason}"),
        }
    }

    /// Short machine-friendly category label.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Finding::UnsupportedResourceType { .. } => "unsupported-resource-type",
            Finding::UnresolvedIntrinsic { .. } => "unresolved-intrinsic",
            Finding::MissingRequiredProperties { .. } => "missing-required-properties",
            Finding::NestedStack { .. } => "nested-stack",
            Finding::SkippedImport { .. } => "skipped-import",
        }
    }
}
