//! Graph ingestion.
//!
//! Turns an [`Inventory`] into a [`ResourceGraph`]: one node per template
//! resource definition, one per independent resource, with strong edges
//! from explicit ordering hints and property references, and weak edges
//! from best-effort identifier matching.

use cfm_model::{IndependentResource, Inventory, NodeId, ResourceNode, StackRecord};
use cfm_template::{sub, Expr, ResourceDef};

use crate::error::GraphError;
use crate::graph::{EdgeKind, ResourceGraph};

/// Identifier matches shorter than this are too ambiguous to act on.
const MIN_MATCH_LEN: usize = 6;

/// Incremental graph builder. Nodes for a stack are inserted before its
/// edges are wired, so intra-stack references always find their target.
#[derive(Debug, Default)]
pub struct GraphBuilder {
    graph: ResourceGraph,
    next_ordinal: usize,
}

impl GraphBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the full graph for an inventory in one call.
    ///
    /// # Errors
    /// Fails when the strong-edge subgraph contains a cycle.
    pub fn ingest(inventory: &Inventory) -> Result<ResourceGraph, GraphError> {
        let mut builder = Self::new();
        for stack in inventory.stacks.values() {
            builder.add_stack(stack)?;
        }
        for resource in inventory.independent_resources.values() {
            builder.add_independent(resource)?;
        }
        builder.finish()
    }

    /// Adds one stack: every resource definition becomes a node, then
    /// explicit `DependsOn` hints and property references become strong
    /// edges within the stack.
    pub fn add_stack(&mut self, stack: &StackRecord) -> Result<(), GraphError> {
        for (logical_id, def) in &stack.template.resources {
            let mut node = ResourceNode::from_template(
                &stack.stack_id,
                logical_id,
                &def.resource_type,
                self.next_ordinal,
            );
            self.next_ordinal += 1;
            node.region = Some(stack.region.clone());
            node.physical_id = stack.physical_ids.get(logical_id).cloned();
            node.condition = def.condition.clone();
            node.retain_on_delete = matches!(
                def.deletion_policy.as_deref(),
                Some("Retain" | "RetainExceptOnCreate")
            );
            node.raw_properties = def.properties.clone();
            self.graph.add_node(node)?;
        }

        for (logical_id, def) in &stack.template.resources {
            let this = NodeId::for_stack_resource(&stack.stack_id, logical_id);
            for target in &def.depends_on {
                if stack.template.resources.contains_key(target) {
                    let dep = NodeId::for_stack_resource(&stack.stack_id, target);
                    self.graph.add_edge(dep, this, EdgeKind::Strong)?;
                } else {
                    tracing::warn!(
                        "stack {}: `{}` depends on unknown resource `{}`",
                        stack.stack_name,
                        logical_id,
                        target
                    );
                }
            }
            for target in reference_targets(def) {
                if stack.template.resources.contains_key(&target) {
                    let dep = NodeId::for_stack_resource(&stack.stack_id, &target);
                    self.graph.add_edge(dep, this, EdgeKind::Strong)?;
                }
            }
        }
        Ok(())
    }

    /// Adds one independent resource. Its raw provider configuration is
    /// decoded into the node's property tree; provider config contains no
    /// intrinsics, so the result is all literals.
    pub fn add_independent(&mut self, resource: &IndependentResource) -> Result<(), GraphError> {
        let mut node = ResourceNode::from_independent(
            &resource.resource_id,
            &resource.source_type,
            self.next_ordinal,
        );
        self.next_ordinal += 1;
        node.region = Some(resource.region.clone());
        node.tags = resource.tags.clone();
        if let Some(config) = resource.raw_config.as_object() {
            node.raw_properties = config
                .iter()
                .map(|(k, v)| (k.clone(), Expr::decode(v)))
                .collect();
        }
        self.graph.add_node(node)?;
        Ok(())
    }

    /// Wires heuristic weak edges and validates the result.
    ///
    /// # Errors
    /// Fails when the strong-edge subgraph contains a cycle.
    pub fn finish(mut self) -> Result<ResourceGraph, GraphError> {
        self.wire_heuristic_edges()?;
        self.graph.ensure_strong_acyclic()?;
        tracing::info!(
            "resource graph built: {} nodes, {} edges",
            self.graph.node_count(),
            self.graph.edge_count()
        );
        Ok(self.graph)
    }

    /// Weak-edge heuristic: when an independent resource's identifier
    /// appears inside a template-managed resource's physical id or literal
    /// property strings, the template resource probably depends on it.
    fn wire_heuristic_edges(&mut self) -> Result<(), GraphError> {
        let independents: Vec<(NodeId, String)> = self
            .graph
            .nodes()
            .filter(|n| n.logical_id().is_none())
            .filter_map(|n| n.physical_id.clone().map(|pid| (n.id, pid)))
            .filter(|(_, pid)| pid.len() >= MIN_MATCH_LEN)
            .collect();
        if independents.is_empty() {
            return Ok(());
        }

        let mut matches: Vec<(NodeId, NodeId)> = Vec::new();
        for node in self.graph.nodes().filter(|n| n.logical_id().is_some()) {
            let haystacks = literal_strings(node);
            for (provider, pid) in &independents {
                if node.physical_id.as_deref() == Some(pid.as_str()) {
                    continue;
                }
                if haystacks.iter().any(|s| s.contains(pid.as_str())) {
                    matches.push((*provider, node.id));
                }
            }
        }
        for (provider, consumer) in matches {
            tracing::debug!(
                "heuristic edge: {} -> {}",
                provider.short(),
                consumer.short()
            );
            self.graph.add_edge(provider, consumer, EdgeKind::Weak)?;
        }
        Ok(())
    }
}

/// Logical ids referenced anywhere in a resource definition's property
/// trees: `Ref`, `Fn::GetAtt`, and `Fn::Sub` placeholders, at any nesting
/// depth. Names that turn out to be parameters or pseudo parameters are
/// filtered by the caller's membership check.
fn reference_targets(def: &ResourceDef) -> Vec<String> {
    let mut targets = Vec::new();
    for expr in def.properties.values() {
        expr.walk(&mut |e| match e {
            Expr::Ref(target) => targets.push(target.clone()),
            Expr::GetAtt { logical_id, .. } => targets.push(logical_id.clone()),
            Expr::Sub { template, .. } => {
                for name in sub::placeholder_names(template) {
                    if let Some(base) = name.split('.').next() {
                        targets.push(base.to_string());
                    }
                }
            }
            _ => {}
        });
    }
    targets
}

/// The node's physical id plus every literal string in its raw properties.
fn literal_strings(node: &ResourceNode) -> Vec<String> {
    let mut strings = Vec::new();
    if let Some(pid) = &node.physical_id {
        strings.push(pid.clone());
    }
    for expr in node.raw_properties.values() {
        expr.walk(&mut |e| {
            if let Some(s) = e.as_lit_str() {
                strings.push(s.to_string());
            }
        });
    }
    strings
}
