//! Resource nodes.
//!
//! A [`ResourceNode`] is created once at graph ingestion and then only ever
//! has fields filled in: the resolver adds resolved properties and findings,
//! the type mapper adds the target type and import identity. Nothing is
//! removed or re-keyed after creation.

use std::collections::BTreeMap;

use cfm_template::Expr;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::finding::Finding;
use crate::id::NodeId;
use crate::value::PropertyValue;

/// Where a resource came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Origin {
    /// Defined by a stack template.
    Template {
        /// Owning stack id.
        stack_id: String,
        /// Logical id within that stack's template.
        logical_id: String,
    },
    /// Discovered outside any stack.
    Independent,
}

/// Rough change-frequency tier of a resource type, used by the by-lifecycle
/// organization strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleTier {
    /// Long-lived shared plumbing: networks, identities, keys, zones.
    Foundation,
    /// Deployable workload resources: instances, functions, services.
    Application,
    /// Stateful stores: databases, tables, buckets, caches.
    Data,
    /// Everything else.
    Support,
}

/// One resource tracked through the whole conversion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceNode {
    /// Stable fingerprint, derived from the origin identity.
    pub id: NodeId,
    /// Ingestion order, used as the deterministic tie-break in planning.
    pub ordinal: usize,
    /// Where the resource came from.
    pub origin: Origin,
    /// Source type name, e.g. `AWS::EC2::Subnet`.
    pub source_type: String,
    /// Region the resource lives in, when known.
    pub region: Option<String>,
    /// Physical identifier of the running resource, when known.
    pub physical_id: Option<String>,
    /// Resource tags.
    pub tags: BTreeMap<String, String>,
    /// Name of the template condition gating this resource, when present.
    pub condition: Option<String>,
    /// Whether the source requested retain-on-delete semantics.
    pub retain_on_delete: bool,
    /// Raw property expressions as decoded at ingestion.
    pub raw_properties: IndexMap<String, Expr>,
    /// Resolved properties; empty until the resolver runs.
    pub resolved_properties: IndexMap<String, PropertyValue>,
    /// Target type name; `None` until the type mapper runs or when the
    /// source type is unsupported.
    pub target_type: Option<String>,
    /// Properties reshaped into the target schema; empty until the type
    /// mapper runs. The resolved source-shaped properties stay untouched.
    pub mapped_properties: IndexMap<String, PropertyValue>,
    /// Identifying value used to bind the running resource, when derivable.
    pub import_identity: Option<String>,
    /// Lifecycle tier from the type registry, once mapped.
    pub lifecycle: Option<LifecycleTier>,
    /// Set when no mapping exists for the source type. The node stays in
    /// the graph so dependents still resolve, but is excluded from emission
    /// and from the import plan.
    pub unsupported: bool,
    /// Manual-conversion findings collected across phases.
    pub findings: Vec<Finding>,
}

impl ResourceNode {
    /// Creates a node for a template-defined resource.
    #[must_use]
    pub fn from_template(
        stack_id: &str,
        logical_id: &str,
        source_type: &str,
        ordinal: usize,
    ) -> Self {
        Self {
            id: NodeId::for_stack_resource(stack_id, logical_id),
            ordinal,
            origin: Origin::Template {
                stack_id: stack_id.to_string(),
                logical_id: logical_id.to_string(),
            },
            source_type: source_type.to_string(),
            region: None,
            physical_id: None,
            tags: BTreeMap::new(),
            condition: None,
            retain_on_delete: false,
            raw_properties: IndexMap::new(),
            resolved_properties: IndexMap::new(),
            target_type: None,
            mapped_properties: IndexMap::new(),
            import_identity: None,
            lifecycle: None,
            unsupported: false,
            findings: Vec::new(),
        }
    }

    /// Creates a node for a resource discovered outside any stack.
    #[must_use]
    pub fn from_independent(physical_id: &str, source_type: &str, ordinal: usize) -> Self {
        Self {
            id: NodeId::for_independent(physical_id),
            ordinal,
            origin: Origin::Independent,
            source_type: source_type.to_string(),
            region: None,
            physical_id: Some(physical_id.to_string()),
            tags: BTreeMap::new(),
            condition: None,
            retain_on_delete: false,
            raw_properties: IndexMap::new(),
            resolved_properties: IndexMap::new(),
            target_type: None,
            mapped_properties: IndexMap::new(),
            import_identity: None,
            lifecycle: None,
            unsupported: false,
            findings: Vec::new(),
        }
    }

    /// Logical id for template-managed nodes.
    #[must_use]
    pub fn logical_id(&self) -> Option<&str> {
        match &self.origin {
            Origin::Template { logical_id, .. } => Some(logical_id),
            Origin::Independent => None,
        }
    }

    /// Owning stack id for template-managed nodes.
    #[must_use]
    pub fn stack_id(&self) -> Option<&str> {
        match &self.origin {
            Origin::Template { stack_id, .. } => Some(stack_id),
            Origin::Independent => None,
        }
    }

    /// Best human-readable handle: logical id, then physical id, then the
    /// short fingerprint.
    #[must_use]
    pub fn display_name(&self) -> String {
        if let Some(logical_id) = self.logical_id() {
            return logical_id.to_string();
        }
        if let Some(physical_id) = &self.physical_id {
            return physical_id.clone();
        }
        self.id.short()
    }

    /// True when the node participates in code emission.
    #[must_use]
    pub fn is_emittable(&self) -> bool {
        !self.unsupported
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn template_nodes_carry_their_origin() {
        let node = ResourceNode::from_template("stack-1", "Vpc", "AWS::EC2::VPC", 0);
        assert_eq!(node.logical_id(), Some("Vpc"));
        assert_eq!(node.stack_id(), Some("stack-1"));
        assert_eq!(node.display_name(), "Vpc");
        assert_eq!(node.id, NodeId::for_stack_resource("stack-1", "Vpc"));
    }

    #[test]
    fn independent_nodes_know_their_physical_id() {
        let node = ResourceNode::from_independent("vpc-9", "AWS::EC2::VPC", 3);
        assert_eq!(node.logical_id(), None);
        assert_eq!(node.physical_id.as_deref(), Some("vpc-9"));
        assert_eq!(node.display_name(), "vpc-9");
    }

    #[test]
    fn unsupported_nodes_are_not_emittable() {
        let mut node = ResourceNode::from_independent("x-1", "Custom::Widget", 0);
        assert!(node.is_emittable());
        node.unsupported = true;
        assert!(!node.is_emittable());
    }
}
