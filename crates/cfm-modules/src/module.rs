//! The module model produced by partitioning.

use cfm_model::{NodeId, PropertyValue};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// One resource definition inside a module.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleResource {
    /// The underlying graph node.
    pub node: NodeId,
    /// Local resource name, unique within the module.
    pub name: String,
    /// Mapped target type.
    pub target_type: String,
    /// Resource address, `<target_type>.<name>`.
    pub address: String,
    /// Mapped properties, with references that cross a module boundary
    /// rewritten to variable placeholders.
    pub properties: IndexMap<String, PropertyValue>,
}

/// Where a module variable's value comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariableBinding {
    /// Producing module.
    pub module: String,
    /// Output name on that module.
    pub output: String,
}

/// An input variable of a module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleVariable {
    /// Variable name.
    pub name: String,
    /// Bound to another module's output, or left for the operator to
    /// supply when nothing in the conversion produces the value.
    pub binding: Option<VariableBinding>,
}

/// An output exposed by a module.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleOutput {
    /// Output name.
    pub name: String,
    /// Output value.
    pub value: PropertyValue,
}

/// One module of the partitioned configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Module {
    /// Module name, unique across the set.
    pub name: String,
    /// Every member node, supported or not, in ingestion order.
    pub members: Vec<NodeId>,
    /// Resource definitions for the emittable members, in ingestion order.
    pub resources: Vec<ModuleResource>,
    /// Input variables, in first-use order.
    pub variables: Vec<ModuleVariable>,
    /// Outputs, in creation order.
    pub outputs: Vec<ModuleOutput>,
}

impl Module {
    pub(crate) fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            members: Vec::new(),
            resources: Vec::new(),
            variables: Vec::new(),
            outputs: Vec::new(),
        }
    }

    /// Looks up the resource definition for a member node.
    #[must_use]
    pub fn resource(&self, node: NodeId) -> Option<&ModuleResource> {
        self.resources.iter().find(|r| r.node == node)
    }

    /// Looks up a variable by name.
    #[must_use]
    pub fn variable(&self, name: &str) -> Option<&ModuleVariable> {
        self.variables.iter().find(|v| v.name == name)
    }

    /// Looks up an output by name.
    #[must_use]
    pub fn output(&self, name: &str) -> Option<&ModuleOutput> {
        self.outputs.iter().find(|o| o.name == name)
    }
}

/// The complete partitioning result: modules in creation order plus the
/// node-to-module membership index.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ModuleSet {
    modules: IndexMap<String, Module>,
    membership: IndexMap<NodeId, String>,
}

impl ModuleSet {
    pub(crate) fn from_modules(modules: IndexMap<String, Module>) -> Self {
        let membership = modules
            .values()
            .flat_map(|module| {
                module
                    .members
                    .iter()
                    .map(|id| (*id, module.name.clone()))
            })
            .collect();
        Self {
            modules,
            membership,
        }
    }

    /// Modules in creation order.
    pub fn modules(&self) -> impl Iterator<Item = &Module> {
        self.modules.values()
    }

    /// One module by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Module> {
        self.modules.get(name)
    }

    /// Name of the module a node was assigned to.
    #[must_use]
    pub fn module_of(&self, node: NodeId) -> Option<&str> {
        self.membership.get(&node).map(String::as_str)
    }

    /// Number of modules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    /// True when no modules were produced.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// Total number of resource definitions across all modules.
    #[must_use]
    pub fn resource_count(&self) -> usize {
        self.modules.values().map(|m| m.resources.len()).sum()
    }
}
