//! Discovery-engine input records.
//!
//! The engine never talks to a cloud API; it receives an [`Inventory`]
//! assembled by an external discovery pass and works entirely from it.

use std::collections::BTreeMap;

use cfm_template::TemplateBody;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One discovered stack with its parsed template and deployment facts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StackRecord {
    /// Stack identifier, unique within the inventory.
    pub stack_id: String,
    /// Stack name as shown by the source system.
    pub stack_name: String,
    /// Region the stack is deployed in.
    pub region: String,
    /// The stack's template, already parsed.
    pub template: TemplateBody,
    /// Parameter values the running deployment was launched with.
    #[serde(default)]
    pub parameter_values: IndexMap<String, String>,
    /// Logical id to physical id, for every resource the stack created.
    #[serde(default)]
    pub physical_ids: IndexMap<String, String>,
    /// Stack-level tags.
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
}

impl StackRecord {
    /// Creates a record with empty deployment facts.
    #[must_use]
    pub fn new(stack_id: &str, stack_name: &str, region: &str, template: TemplateBody) -> Self {
        Self {
            stack_id: stack_id.to_string(),
            stack_name: stack_name.to_string(),
            region: region.to_string(),
            template,
            parameter_values: IndexMap::new(),
            physical_ids: IndexMap::new(),
            tags: BTreeMap::new(),
        }
    }

    /// The effective value of a template parameter: the deployed value wins
    /// over the declared default.
    #[must_use]
    pub fn parameter_value(&self, name: &str) -> Option<Value> {
        if let Some(deployed) = self.parameter_values.get(name) {
            return Some(Value::String(deployed.clone()));
        }
        self.template
            .parameters
            .get(name)
            .and_then(|p| p.default.clone())
    }
}

/// One resource discovered outside any stack.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndependentResource {
    /// Physical identifier, unique within the inventory.
    pub resource_id: String,
    /// Source type name, e.g. `AWS::EC2::VPC`.
    pub source_type: String,
    /// Region the resource lives in.
    pub region: String,
    /// Resource tags.
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
    /// Raw provider configuration, kept for heuristics and reporting.
    #[serde(default)]
    pub raw_config: Value,
}

impl IndependentResource {
    /// Creates a record with no tags or raw configuration.
    #[must_use]
    pub fn new(resource_id: &str, source_type: &str, region: &str) -> Self {
        Self {
            resource_id: resource_id.to_string(),
            source_type: source_type.to_string(),
            region: region.to_string(),
            tags: BTreeMap::new(),
            raw_config: Value::Null,
        }
    }
}

/// Everything the discovery pass found, keyed for deterministic iteration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Inventory {
    /// Stacks keyed by stack id, in discovery order.
    #[serde(default)]
    pub stacks: IndexMap<String, StackRecord>,
    /// Independent resources keyed by physical id, in discovery order.
    #[serde(default)]
    pub independent_resources: IndexMap<String, IndependentResource>,
}

impl Inventory {
    /// An empty inventory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a stack, keyed by its id.
    pub fn add_stack(&mut self, stack: StackRecord) {
        self.stacks.insert(stack.stack_id.clone(), stack);
    }

    /// Adds an independent resource, keyed by its physical id.
    pub fn add_independent(&mut self, resource: IndependentResource) {
        self.independent_resources
            .insert(resource.resource_id.clone(), resource);
    }

    /// Total number of resource records across stacks and independents.
    #[must_use]
    pub fn resource_count(&self) -> usize {
        let templated: usize = self
            .stacks
            .values()
            .map(|s| s.template.resources.len())
            .sum();
        templated + self.independent_resources.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deployed_parameter_values_win_over_defaults() {
        let template = TemplateBody::from_json_str(
            r#"{"Parameters": {"Env": {"Type": "String", "Default": "dev"}}, "Resources": {}}"#,
        )
        .unwrap();
        let mut stack = StackRecord::new("s-1", "app", "us-east-1", template);
        assert_eq!(stack.parameter_value("Env"), Some(Value::String("dev".into())));

        stack
            .parameter_values
            .insert("Env".to_string(), "prod".to_string());
        assert_eq!(stack.parameter_value("Env"), Some(Value::String("prod".into())));
        assert_eq!(stack.parameter_value("Missing"), None);
    }

    #[test]
    fn resource_count_spans_both_kinds() {
        let template = TemplateBody::from_json_str(
            r#"{"Resources": {"A": {"Type": "T"}, "B": {"Type": "T"}}}"#,
        )
        .unwrap();
        let mut inventory = Inventory::new();
        inventory.add_stack(StackRecord::new("s-1", "app", "us-east-1", template));
        inventory.add_independent(IndependentResource::new("vpc-1", "AWS::EC2::VPC", "us-east-1"));
        assert_eq!(inventory.resource_count(), 3);
    }
}
