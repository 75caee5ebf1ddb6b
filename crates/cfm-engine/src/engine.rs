//! The pipeline facade.

use cfm_convert::{map_graph, resolve_graph, TypeRegistry};
use cfm_graph::GraphBuilder;
use cfm_model::{Inventory, NodeId};
use cfm_modules::{partition, ModuleSet, PartitionContext};
use cfm_plan::{plan_imports, ImportPlan, ImportTarget};
use indexmap::IndexMap;

use crate::config::MigrationConfig;
use crate::error::EngineError;
use crate::report::{self, ConversionReport};

/// Everything one conversion run produces.
#[derive(Debug)]
pub struct Conversion {
    /// The partitioned module tree, ready for a code emitter.
    pub modules: ModuleSet,
    /// The ordered, batched import plan, ready for an execution harness.
    pub plan: ImportPlan,
    /// The consolidated manual-conversion report.
    pub report: ConversionReport,
}

/// The conversion engine: one configuration and one type registry,
/// reusable across inventories.
#[derive(Debug)]
pub struct Engine {
    config: MigrationConfig,
    registry: TypeRegistry,
}

impl Engine {
    /// Creates an engine backed by the built-in type registry.
    #[must_use]
    pub fn new(config: MigrationConfig) -> Self {
        Self::with_registry(config, TypeRegistry::builtin())
    }

    /// Creates an engine with a caller-assembled registry.
    #[must_use]
    pub fn with_registry(config: MigrationConfig, registry: TypeRegistry) -> Self {
        Self { config, registry }
    }

    /// The configuration in force.
    #[must_use]
    pub fn config(&self) -> &MigrationConfig {
        &self.config
    }

    /// Runs the whole pipeline over one inventory: graph construction,
    /// intrinsic resolution, type mapping, partitioning, import planning,
    /// and report assembly.
    ///
    /// # Errors
    /// Fails only on structural problems: a strong dependency cycle in
    /// the graph or a cycle between modules. Per-resource problems become
    /// findings in the report instead.
    pub fn convert(&self, inventory: &Inventory) -> Result<Conversion, EngineError> {
        tracing::info!(
            stacks = inventory.stacks.len(),
            independent = inventory.independent_resources.len(),
            resources = inventory.resource_count(),
            "starting conversion"
        );

        let mut graph = GraphBuilder::ingest(inventory)?;
        let outcome = resolve_graph(&mut graph, inventory, &self.registry);
        map_graph(&mut graph, &self.registry);

        let context = PartitionContext {
            stack_names: inventory
                .stacks
                .values()
                .map(|stack| (stack.stack_id.clone(), stack.stack_name.clone()))
                .collect(),
            stack_outputs: outcome.stack_outputs,
        };
        let modules = partition(&graph, &self.config.partition_options(), &context)?;

        let targets = import_targets(&modules);
        let plan = plan_imports(&graph, &targets);
        let report = report::build_report(&graph, &modules, &plan, &outcome.output_findings);

        tracing::info!(
            modules = modules.len(),
            import_entries = plan.len(),
            findings = report.entries.len(),
            "conversion finished"
        );
        Ok(Conversion {
            modules,
            plan,
            report,
        })
    }
}

/// Where each emitted resource definition landed, keyed by node. This is
/// the only bridge the planner needs into the module layout.
fn import_targets(modules: &ModuleSet) -> IndexMap<NodeId, ImportTarget> {
    let mut targets = IndexMap::new();
    for module in modules.modules() {
        for resource in &module.resources {
            targets.insert(
                resource.node,
                ImportTarget {
                    module: module.name.clone(),
                    address: resource.address.clone(),
                },
            );
        }
    }
    targets
}
