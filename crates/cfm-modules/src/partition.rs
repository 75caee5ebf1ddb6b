//! Organization strategies and the partitioning pass.
//!
//! Every node lands in exactly one module. References that cross a module
//! boundary become an output on the producing module and a bound input
//! variable on the consuming one; the consumer's property tree is rewritten
//! to use the variable. References inside one module stay direct.

use cfm_graph::{EdgeKind, ResourceGraph};
use cfm_model::names::{is_safe_identifier, sanitize_identifier, sanitize_module_name};
use cfm_model::{NodeId, PropertyValue, ResourceNode, TargetExpr};
use indexmap::{IndexMap, IndexSet};
use petgraph::algo::tarjan_scc;
use petgraph::graphmap::DiGraphMap;
use serde::{Deserialize, Serialize};

use crate::category;
use crate::error::PartitionError;
use crate::module::{
    Module, ModuleOutput, ModuleResource, ModuleSet, ModuleVariable, VariableBinding,
};

/// How resources are grouped into modules.
///
/// Each strategy is a pure function of the graph and context: the same
/// input always yields the same layout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrganizationStrategy {
    /// Group by the service category of the mapped type.
    #[default]
    ByService,
    /// One module per source stack, plus one for independent resources.
    ByStack,
    /// Group by change-frequency tier.
    ByLifecycle,
    /// By-stack first, then merge undersized modules into the service
    /// buckets and split oversized ones along service lines.
    Hybrid,
}

/// Tunables for the partitioning pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PartitionOptions {
    /// Strategy selecting the module layout.
    pub strategy: OrganizationStrategy,
    /// Hybrid only: stack modules with fewer members than this merge into
    /// the global service buckets.
    pub hybrid_min_module_size: usize,
    /// Hybrid only: stack modules with more members than this split into
    /// per-service submodules.
    pub hybrid_max_module_size: usize,
    /// Keep source resource names verbatim when they are already valid
    /// identifiers, instead of rewriting them to snake_case.
    pub preserve_original_names: bool,
}

impl Default for PartitionOptions {
    fn default() -> Self {
        Self {
            strategy: OrganizationStrategy::default(),
            hybrid_min_module_size: 3,
            hybrid_max_module_size: 20,
            preserve_original_names: false,
        }
    }
}

/// Stack-level inputs the strategies draw on: human names for stack ids,
/// and resolved stack outputs to attach under the by-stack strategy.
#[derive(Debug, Clone, Default)]
pub struct PartitionContext {
    /// Stack id to stack name.
    pub stack_names: IndexMap<String, String>,
    /// Stack id to resolved template outputs.
    pub stack_outputs: IndexMap<String, IndexMap<String, PropertyValue>>,
}

/// Partitions every node of the graph into exactly one module and derives
/// the boundary variables and outputs.
///
/// # Errors
/// Returns [`PartitionError::CyclicModuleDependency`] when two modules end
/// up depending on each other through strong edges.
pub fn partition(
    graph: &ResourceGraph,
    options: &PartitionOptions,
    context: &PartitionContext,
) -> Result<ModuleSet, PartitionError> {
    let assignment = assign(graph, options, context);
    let set = build(graph, &assignment, options, context);
    ensure_collapsed_acyclic(graph, &set)?;
    tracing::info!(
        strategy = ?options.strategy,
        modules = set.len(),
        resources = set.resource_count(),
        "partitioned resources into modules"
    );
    Ok(set)
}

/// Module assignment per node, in ingestion order.
fn assign(
    graph: &ResourceGraph,
    options: &PartitionOptions,
    context: &PartitionContext,
) -> IndexMap<NodeId, String> {
    match options.strategy {
        OrganizationStrategy::ByService => graph
            .nodes()
            .map(|node| (node.id, category::category_of(node)))
            .collect(),
        OrganizationStrategy::ByStack => graph
            .nodes()
            .map(|node| (node.id, stack_module_name(node, context)))
            .collect(),
        OrganizationStrategy::ByLifecycle => graph
            .nodes()
            .map(|node| {
                (
                    node.id,
                    category::lifecycle_bucket(node.lifecycle).to_string(),
                )
            })
            .collect(),
        OrganizationStrategy::Hybrid => assign_hybrid(graph, options, context),
    }
}

fn stack_module_name(node: &ResourceNode, context: &PartitionContext) -> String {
    match node.stack_id() {
        Some(stack_id) => {
            let name = context
                .stack_names
                .get(stack_id)
                .map_or(stack_id, String::as_str);
            sanitize_module_name(name)
        }
        None => "independent_resources".to_string(),
    }
}

/// By-stack layout with two corrections: stack modules under the minimum
/// size dissolve into the global service buckets, and stack modules over
/// the maximum split into `<stack>_<service>` submodules.
fn assign_hybrid(
    graph: &ResourceGraph,
    options: &PartitionOptions,
    context: &PartitionContext,
) -> IndexMap<NodeId, String> {
    let mut sizes: IndexMap<String, usize> = IndexMap::new();
    for node in graph.nodes() {
        *sizes.entry(stack_module_name(node, context)).or_insert(0) += 1;
    }
    graph
        .nodes()
        .map(|node| {
            let stack_module = stack_module_name(node, context);
            let size = sizes.get(&stack_module).copied().unwrap_or(0);
            let module = if size < options.hybrid_min_module_size {
                category::category_of(node)
            } else if size > options.hybrid_max_module_size {
                format!("{stack_module}_{}", category::category_of(node))
            } else {
                stack_module
            };
            (node.id, module)
        })
        .collect()
}

fn build(
    graph: &ResourceGraph,
    assignment: &IndexMap<NodeId, String>,
    options: &PartitionOptions,
    context: &PartitionContext,
) -> ModuleSet {
    let mut modules: IndexMap<String, Module> = IndexMap::new();
    let mut local_names: IndexMap<NodeId, String> = IndexMap::new();

    // Membership and resource definitions, in ingestion order. Unsupported
    // nodes become members without a definition.
    for (id, module_name) in assignment {
        let Some(node) = graph.node(*id) else { continue };
        let module = modules
            .entry(module_name.clone())
            .or_insert_with(|| Module::new(module_name));
        module.members.push(*id);
        if !node.is_emittable() {
            continue;
        }
        let Some(target_type) = node.target_type.as_deref() else {
            continue;
        };
        let display = node.display_name();
        let base = if options.preserve_original_names && is_safe_identifier(&display) {
            display
        } else {
            sanitize_identifier(&display)
        };
        let name = if module.resources.iter().any(|r| r.name == base) {
            format!("{base}_{}", node.ordinal)
        } else {
            base
        };
        local_names.insert(*id, name.clone());
        module.resources.push(ModuleResource {
            node: *id,
            name: name.clone(),
            target_type: target_type.to_string(),
            address: format!("{target_type}.{name}"),
            properties: node.mapped_properties.clone(),
        });
    }

    // Boundary scan: find attribute references that cross modules and plan
    // one output plus one variable per crossing.
    type RefKey = (NodeId, String);
    let mut boundary_outputs: IndexMap<RefKey, String> = IndexMap::new();
    let mut module_vars: IndexMap<String, IndexMap<String, Option<VariableBinding>>> =
        IndexMap::new();
    let mut rewrites: IndexMap<String, IndexMap<RefKey, String>> = IndexMap::new();

    for module in modules.values() {
        for resource in &module.resources {
            for value in resource.properties.values() {
                for (producer, attribute) in value.attr_refs() {
                    let Some(producer_module) = assignment.get(&producer) else {
                        continue;
                    };
                    if *producer_module == module.name {
                        continue;
                    }
                    let key = (producer, attribute.clone());
                    if rewrites
                        .get(&module.name)
                        .is_some_and(|planned| planned.contains_key(&key))
                    {
                        continue;
                    }
                    let vars = module_vars.entry(module.name.clone()).or_default();
                    let var_name = match local_names.get(&producer) {
                        Some(producer_local) => {
                            let output_name = boundary_outputs
                                .entry(key.clone())
                                .or_insert_with(|| {
                                    format!(
                                        "{producer_local}_{}",
                                        sanitize_identifier(&attribute)
                                    )
                                })
                                .clone();
                            let binding = VariableBinding {
                                module: producer_module.clone(),
                                output: output_name.clone(),
                            };
                            // Two producers in different modules can share a
                            // local name; qualify the variable when the plain
                            // name is already taken by something else.
                            let var_name = match vars.get(&output_name) {
                                Some(existing) if existing.as_ref() != Some(&binding) => {
                                    format!("{producer_module}_{output_name}")
                                }
                                _ => output_name,
                            };
                            vars.entry(var_name.clone()).or_insert(Some(binding));
                            var_name
                        }
                        None => {
                            // The producer emits nothing, so there is no
                            // output to bind. Leave an operator-supplied
                            // variable named after it.
                            let display = graph
                                .node(producer)
                                .map_or_else(|| producer.short(), ResourceNode::display_name);
                            let var_name =
                                sanitize_identifier(&format!("{display}_{attribute}"));
                            vars.entry(var_name.clone()).or_insert(None);
                            var_name
                        }
                    };
                    rewrites
                        .entry(module.name.clone())
                        .or_default()
                        .insert(key, var_name);
                }
            }
        }
    }

    // Rewrite crossing references to their variables.
    for (name, module) in &mut modules {
        let Some(planned) = rewrites.get(name) else {
            continue;
        };
        for resource in &mut module.resources {
            for value in resource.properties.values_mut() {
                value.walk_unresolved_mut(&mut |expr| {
                    if let TargetExpr::Attr { node, attribute } = expr {
                        if let Some(var) = planned.get(&(*node, attribute.clone())) {
                            *expr = TargetExpr::Var(var.clone());
                        }
                    }
                });
            }
        }
    }

    // Producer-side outputs for every crossing.
    for ((producer, attribute), output_name) in &boundary_outputs {
        let Some(module_name) = assignment.get(producer) else {
            continue;
        };
        if let Some(module) = modules.get_mut(module_name) {
            module.outputs.push(ModuleOutput {
                name: output_name.clone(),
                value: PropertyValue::Unresolved(TargetExpr::Attr {
                    node: *producer,
                    attribute: attribute.clone(),
                }),
            });
        }
    }

    // Template outputs stay meaningful when a module is a whole stack.
    if options.strategy == OrganizationStrategy::ByStack {
        for (stack_id, outputs) in &context.stack_outputs {
            let name = context
                .stack_names
                .get(stack_id)
                .map_or(stack_id.as_str(), String::as_str);
            let Some(module) = modules.get_mut(&sanitize_module_name(name)) else {
                continue;
            };
            for (output, value) in outputs {
                let output_name = sanitize_identifier(output);
                if module.outputs.iter().any(|o| o.name == output_name) {
                    continue;
                }
                module.outputs.push(ModuleOutput {
                    name: output_name,
                    value: value.clone(),
                });
            }
        }
    }

    // Variable declarations in first-use order: bound crossings keep the
    // binding planned above, anything else is operator-supplied.
    for (name, module) in &mut modules {
        let bindings = module_vars.get(name);
        let mut seen: IndexSet<String> = IndexSet::new();
        for resource in &module.resources {
            for value in resource.properties.values() {
                collect_vars(value, &mut seen);
            }
        }
        for output in &module.outputs {
            collect_vars(&output.value, &mut seen);
        }
        for var in seen {
            let binding = bindings.and_then(|map| map.get(&var)).cloned().flatten();
            module.variables.push(ModuleVariable { name: var, binding });
        }
    }

    ModuleSet::from_modules(modules)
}

fn collect_vars(value: &PropertyValue, out: &mut IndexSet<String>) {
    let mut probe = value.clone();
    probe.walk_unresolved_mut(&mut |expr| {
        if let TargetExpr::Var(name) = expr {
            out.insert(name.clone());
        }
    });
}

/// Verifies the module-collapsed strong-edge graph is acyclic.
fn ensure_collapsed_acyclic(
    graph: &ResourceGraph,
    set: &ModuleSet,
) -> Result<(), PartitionError> {
    let names: Vec<&str> = set.modules().map(|m| m.name.as_str()).collect();
    let index_of: IndexMap<&str, usize> =
        names.iter().enumerate().map(|(i, n)| (*n, i)).collect();

    let mut collapsed: DiGraphMap<usize, ()> = DiGraphMap::new();
    for index in 0..names.len() {
        collapsed.add_node(index);
    }
    for (from, to, kind) in graph.edges() {
        if kind != EdgeKind::Strong {
            continue;
        }
        let (Some(from_module), Some(to_module)) = (set.module_of(from), set.module_of(to))
        else {
            continue;
        };
        if from_module == to_module {
            continue;
        }
        let (Some(&a), Some(&b)) = (index_of.get(from_module), index_of.get(to_module)) else {
            continue;
        };
        collapsed.add_edge(a, b, ());
    }

    for component in tarjan_scc(&collapsed) {
        if component.len() > 1 {
            let path = component.iter().map(|i| names[*i].to_string()).collect();
            return Err(PartitionError::CyclicModuleDependency { path });
        }
    }
    Ok(())
}
