//! Type mapping.
//!
//! The second conversion phase. Stamps each resolved node with its target
//! type, reshapes its properties into target-schema form, derives the
//! importable identity, and records conformance findings. Mapping never
//! fails: a source type without a registry entry marks the node unsupported
//! and the conversion continues around it.

use cfm_graph::ResourceGraph;
use cfm_model::{Finding, LifecycleTier, PropertyValue, ResourceNode, TargetExpr};
use indexmap::IndexMap;

use crate::registry::{IdPart, ImportIdentity, TypeMapping, TypeRegistry};

const NESTED_STACK_TYPE: &str = "AWS::CloudFormation::Stack";

/// Maps every node in the graph against the registry, in ingestion order.
pub fn map_graph(graph: &mut ResourceGraph, registry: &TypeRegistry) {
    let mut unsupported_count = 0usize;
    for id in graph.node_ids() {
        let decision = match graph.node(id) {
            Some(node) => decide(node, graph, registry),
            None => continue,
        };
        let Some(node) = graph.node_mut(id) else {
            continue;
        };
        match decision {
            Decision::Unsupported(finding) => {
                node.unsupported = true;
                node.findings.push(finding);
                unsupported_count += 1;
            }
            Decision::Mapped {
                target_type,
                lifecycle,
                mapped,
                identity,
                conformance,
            } => {
                node.target_type = Some(target_type);
                node.lifecycle = Some(lifecycle);
                node.mapped_properties = mapped;
                node.import_identity = identity;
                if let Some(finding) = conformance {
                    node.findings.push(finding);
                }
            }
        }
    }
    tracing::info!(
        nodes = graph.node_count(),
        unsupported = unsupported_count,
        "mapped resource types"
    );
}

enum Decision {
    Unsupported(Finding),
    Mapped {
        target_type: String,
        lifecycle: LifecycleTier,
        mapped: IndexMap<String, PropertyValue>,
        identity: Option<String>,
        conformance: Option<Finding>,
    },
}

fn decide(node: &ResourceNode, graph: &ResourceGraph, registry: &TypeRegistry) -> Decision {
    if node.source_type == NESTED_STACK_TYPE {
        let logical_id = node
            .logical_id()
            .map_or_else(|| node.display_name(), str::to_string);
        return Decision::Unsupported(Finding::NestedStack { logical_id });
    }
    let Some(mapping) = registry.get(&node.source_type) else {
        tracing::debug!(
            resource = %node.display_name(),
            source_type = %node.source_type,
            "no mapping registered"
        );
        return Decision::Unsupported(Finding::UnsupportedResourceType {
            source_type: node.source_type.clone(),
        });
    };

    let target_type = mapping.target_for(&node.resolved_properties).to_string();
    let mapped = transform_properties(&node.resolved_properties, mapping);
    let conformance = missing_required(&mapped, &target_type, mapping);
    let identity = derive_import_identity(node, graph, mapping);
    Decision::Mapped {
        target_type,
        lifecycle: mapping.lifecycle,
        mapped,
        identity,
        conformance,
    }
}

/// Applies drops, the generic tag reshape, renames, and the entry's
/// structural reshape, in that order.
fn transform_properties(
    resolved: &IndexMap<String, PropertyValue>,
    mapping: &TypeMapping,
) -> IndexMap<String, PropertyValue> {
    let mut out = IndexMap::new();
    for (name, value) in resolved {
        if mapping.drop_properties.contains(&name.as_str()) {
            continue;
        }
        let value = if name == "Tags" {
            reshape_tags(value)
        } else {
            value.clone()
        };
        out.insert(mapping.map_property(name), value);
    }
    if let Some(reshape) = mapping.reshape {
        reshape(&mut out);
    }
    out
}

/// Source tag lists are `{Key, Value}` pairs; the target schema wants a
/// plain map. Lists that do not follow the pair shape pass through as-is.
fn reshape_tags(value: &PropertyValue) -> PropertyValue {
    let PropertyValue::List(entries) = value else {
        return value.clone();
    };
    let mut tags = IndexMap::new();
    for entry in entries {
        let PropertyValue::Map(fields) = entry else {
            return value.clone();
        };
        let Some(key) = fields.get("Key").and_then(PropertyValue::as_str) else {
            return value.clone();
        };
        let tag_value = fields.get("Value").cloned().unwrap_or(PropertyValue::Null);
        tags.insert(key.to_string(), tag_value);
    }
    PropertyValue::Map(tags)
}

fn missing_required(
    mapped: &IndexMap<String, PropertyValue>,
    target_type: &str,
    mapping: &TypeMapping,
) -> Option<Finding> {
    let missing: Vec<String> = mapping
        .required
        .iter()
        .filter(|field| !mapped.contains_key(**field))
        .map(|field| (*field).to_string())
        .collect();
    if missing.is_empty() {
        None
    } else {
        Some(Finding::MissingRequiredProperties {
            target_type: target_type.to_string(),
            missing,
        })
    }
}

/// Renders the importable identity, or `None` when any part is unknown.
/// Parts name source-schema properties; a part that resolved to a sibling's
/// id reference substitutes that sibling's recorded physical id, since the
/// identity must be a concrete deployed value.
fn derive_import_identity(
    node: &ResourceNode,
    graph: &ResourceGraph,
    mapping: &TypeMapping,
) -> Option<String> {
    match mapping.import_identity {
        ImportIdentity::PhysicalId => node.physical_id.clone(),
        ImportIdentity::Property(name) => literal_property(node, graph, name),
        ImportIdentity::Compound { parts, separator } => {
            let rendered: Option<Vec<String>> = parts
                .iter()
                .map(|part| match part {
                    IdPart::PhysicalId => node.physical_id.clone(),
                    IdPart::Property(name) => literal_property(node, graph, name),
                })
                .collect();
            rendered.map(|parts| parts.join(separator))
        }
    }
}

fn literal_property(node: &ResourceNode, graph: &ResourceGraph, name: &str) -> Option<String> {
    match node.resolved_properties.get(name)? {
        PropertyValue::Unresolved(TargetExpr::Attr {
            node: target,
            attribute,
        }) if attribute == "id" => graph.node(*target)?.physical_id.clone(),
        value => value.scalar_to_string(),
    }
}
