//! Intrinsic resolution.
//!
//! Walks every node's decoded property tree and rewrites intrinsic calls
//! into resolved values: concrete literals where deployed state pins them
//! down, symbolic [`TargetExpr`] leaves where only the target system can
//! supply the value. Resolution never fails; anything the resolver cannot
//! express degrades to an unresolved-intrinsic finding on the owning node
//! and the conversion continues.

use cfm_graph::ResourceGraph;
use cfm_model::{names, Finding, Inventory, NodeId, PropertyValue, StackRecord, TargetExpr};
use cfm_template::sub::{self, SubPart};
use cfm_template::Expr;
use indexmap::IndexMap;
use serde_json::{json, Value};

use crate::pseudo::{self, Pseudo};
use crate::registry::TypeRegistry;

/// Out-of-band results of a resolution pass.
#[derive(Debug, Default)]
pub struct ResolutionOutcome {
    /// Resolved stack outputs, keyed by stack id then output name.
    pub stack_outputs: IndexMap<String, IndexMap<String, PropertyValue>>,
    /// Findings raised while resolving stack outputs, which have no owning
    /// node to carry them.
    pub output_findings: Vec<Finding>,
}

/// Resolves intrinsics for every node in the graph, in ingestion order.
///
/// Stack-originated nodes resolve against their stack's deployed parameter
/// values, mappings, and conditions; independent nodes carry only literal
/// configuration and pass through unchanged. Stack outputs are resolved in
/// the same pass so the partitioner can surface them as module outputs.
pub fn resolve_graph(
    graph: &mut ResourceGraph,
    inventory: &Inventory,
    registry: &TypeRegistry,
) -> ResolutionOutcome {
    let mut finding_total = 0usize;
    for id in graph.node_ids() {
        let (raw, stack_id) = match graph.node(id) {
            Some(node) => (
                node.raw_properties.clone(),
                node.stack_id().map(str::to_string),
            ),
            None => continue,
        };
        let stack = stack_id
            .as_deref()
            .and_then(|sid| inventory.stacks.get(sid));
        let mut resolver = NodeResolver::new(graph, stack, registry);
        let resolved = resolver.resolve_properties(&raw);
        let findings = resolver.findings;
        finding_total += findings.len();
        if let Some(node) = graph.node_mut(id) {
            node.resolved_properties = resolved;
            node.findings.extend(findings);
        }
    }

    let mut outcome = ResolutionOutcome::default();
    for (stack_id, stack) in &inventory.stacks {
        let mut resolver = NodeResolver::new(graph, Some(stack), registry);
        let mut outputs = IndexMap::new();
        for (name, output) in &stack.template.outputs {
            let path = format!("Outputs.{name}");
            if let Some(value) = resolver.resolve(&output.value, &path) {
                outputs.insert(name.clone(), value);
            }
        }
        finding_total += resolver.findings.len();
        outcome.output_findings.extend(resolver.findings);
        if !outputs.is_empty() {
            outcome.stack_outputs.insert(stack_id.clone(), outputs);
        }
    }

    tracing::info!(
        nodes = graph.node_count(),
        findings = finding_total,
        "resolved intrinsics"
    );
    outcome
}

/// Per-node resolution state. Holds the shared graph read-only; results are
/// written back by the caller once the borrow ends.
struct NodeResolver<'a> {
    graph: &'a ResourceGraph,
    stack: Option<&'a StackRecord>,
    registry: &'a TypeRegistry,
    findings: Vec<Finding>,
    // Condition names currently being evaluated, guarding against
    // self-referential condition definitions.
    active_conditions: Vec<String>,
}

impl<'a> NodeResolver<'a> {
    fn new(
        graph: &'a ResourceGraph,
        stack: Option<&'a StackRecord>,
        registry: &'a TypeRegistry,
    ) -> Self {
        Self {
            graph,
            stack,
            registry,
            findings: Vec::new(),
            active_conditions: Vec::new(),
        }
    }

    fn resolve_properties(
        &mut self,
        raw: &IndexMap<String, Expr>,
    ) -> IndexMap<String, PropertyValue> {
        let mut out = IndexMap::new();
        for (name, expr) in raw {
            if let Some(value) = self.resolve(expr, name) {
                out.insert(name.clone(), value);
            }
        }
        out
    }

    /// Resolves one expression. `None` means the surrounding property is
    /// omitted entirely, the `AWS::NoValue` contract.
    fn resolve(&mut self, expr: &Expr, path: &str) -> Option<PropertyValue> {
        match expr {
            Expr::Lit(value) => Some(PropertyValue::from_json(value)),
            Expr::Seq(items) => {
                let resolved = items
                    .iter()
                    .enumerate()
                    .filter_map(|(i, item)| self.resolve(item, &format!("{path}[{i}]")))
                    .collect();
                Some(PropertyValue::List(resolved))
            }
            Expr::Obj(map) => {
                let mut resolved = IndexMap::new();
                for (key, value) in map {
                    if let Some(v) = self.resolve(value, &format!("{path}.{key}")) {
                        resolved.insert(key.clone(), v);
                    }
                }
                Some(PropertyValue::Map(resolved))
            }
            Expr::Ref(name) => self.resolve_ref(name, path),
            Expr::GetAtt {
                logical_id,
                attribute,
            } => self.resolve_get_att(logical_id, attribute, path),
            Expr::Sub { template, vars } => self.resolve_sub(template, vars, path),
            Expr::Join { delimiter, parts } => self.resolve_join(delimiter, parts, path),
            Expr::Select { index, list } => self.resolve_select(index, list, expr, path),
            Expr::Split { delimiter, source } => self.resolve_split(delimiter, source, path),
            Expr::If {
                condition,
                when_true,
                when_false,
            } => self.resolve_if(condition, when_true, when_false, path),
            Expr::Equals(..)
            | Expr::And(_)
            | Expr::Or(_)
            | Expr::Not(_)
            | Expr::Condition(_) => match self.evaluate_condition(expr, path) {
                Some(value) => Some(PropertyValue::Bool(value)),
                None => {
                    self.unresolved(path, condition_intrinsic_name(expr), expr);
                    None
                }
            },
            Expr::FindInMap {
                map,
                top_key,
                second_key,
            } => self.resolve_find_in_map(map, top_key, second_key, expr, path),
            Expr::Base64(inner) => {
                let argument = self.resolve(inner, path)?;
                Some(PropertyValue::Unresolved(TargetExpr::Call {
                    name: "base64encode".to_string(),
                    args: vec![argument],
                }))
            }
            Expr::GetAzs(region) => self.resolve_get_azs(region, expr, path),
            Expr::Unknown { name, raw } => {
                self.findings.push(Finding::UnresolvedIntrinsic {
                    property_path: path.to_string(),
                    intrinsic: name.clone(),
                    raw: raw.clone(),
                });
                None
            }
        }
    }

    fn resolve_ref(&mut self, name: &str, path: &str) -> Option<PropertyValue> {
        if pseudo::is_pseudo(name) {
            return match pseudo::lookup(name) {
                Some(Pseudo::Expr(expr)) => Some(PropertyValue::Unresolved(expr)),
                Some(Pseudo::NoValue) => None,
                None => {
                    self.findings.push(Finding::UnresolvedIntrinsic {
                        property_path: path.to_string(),
                        intrinsic: "Ref".to_string(),
                        raw: json!({ "Ref": name }),
                    });
                    Some(self.variable_placeholder(name))
                }
            };
        }

        if let Some(stack) = self.stack {
            if stack.template.parameters.contains_key(name) {
                return Some(match stack.parameter_value(name) {
                    Some(value) => PropertyValue::from_json(&value),
                    None => self.variable_placeholder(name),
                });
            }
            if stack.template.resources.contains_key(name) {
                return Some(self.resource_reference(stack, name, path));
            }
        }

        self.findings.push(Finding::UnresolvedIntrinsic {
            property_path: path.to_string(),
            intrinsic: "Ref".to_string(),
            raw: json!({ "Ref": name }),
        });
        Some(self.variable_placeholder(name))
    }

    /// A reference to a sibling resource in the same stack. Supported types
    /// stay symbolic so the emitted configuration tracks the resource; types
    /// without a mapping collapse to their known physical id, since no
    /// emitted resource exists to refer to. An unconvertible sibling with no
    /// known physical id stays symbolic too, with a finding so the reference
    /// gets manual follow-up.
    fn resource_reference(
        &mut self,
        stack: &StackRecord,
        logical_id: &str,
        path: &str,
    ) -> PropertyValue {
        let id = NodeId::for_stack_resource(&stack.stack_id, logical_id);
        if let Some(node) = self.graph.node(id) {
            if !self.registry.contains(&node.source_type) {
                if let Some(physical) = &node.physical_id {
                    return PropertyValue::String(physical.clone());
                }
                self.findings.push(Finding::UnresolvedIntrinsic {
                    property_path: path.to_string(),
                    intrinsic: "Ref".to_string(),
                    raw: json!({ "Ref": logical_id }),
                });
            }
            return PropertyValue::Unresolved(TargetExpr::Attr {
                node: id,
                attribute: self.registry.id_attribute(&node.source_type).to_string(),
            });
        }
        self.variable_placeholder(logical_id)
    }

    fn resolve_get_att(
        &mut self,
        logical_id: &str,
        attribute: &str,
        path: &str,
    ) -> Option<PropertyValue> {
        if let Some(stack) = self.stack {
            if stack.template.resources.contains_key(logical_id) {
                let id = NodeId::for_stack_resource(&stack.stack_id, logical_id);
                if let Some(node) = self.graph.node(id) {
                    if self.registry.contains(&node.source_type) {
                        return Some(PropertyValue::Unresolved(TargetExpr::Attr {
                            node: id,
                            attribute: self.registry.map_attribute(&node.source_type, attribute),
                        }));
                    }
                }
            }
        }

        self.findings.push(Finding::UnresolvedIntrinsic {
            property_path: path.to_string(),
            intrinsic: "Fn::GetAtt".to_string(),
            raw: json!({ "Fn::GetAtt": [logical_id, attribute] }),
        });
        Some(self.variable_placeholder(&format!("{logical_id}_{attribute}")))
    }

    fn resolve_sub(
        &mut self,
        template: &str,
        vars: &IndexMap<String, Expr>,
        path: &str,
    ) -> Option<PropertyValue> {
        let mut pieces = Vec::new();
        for part in sub::parse_parts(template) {
            match part {
                SubPart::Text(text) => pieces.push(PropertyValue::String(text)),
                SubPart::Placeholder(name) => {
                    let resolved = self.resolve_placeholder(&name, vars, path);
                    pieces.push(resolved.unwrap_or_else(|| PropertyValue::String(String::new())));
                }
            }
        }

        let literal: Option<String> = pieces
            .iter()
            .map(PropertyValue::scalar_to_string)
            .collect::<Option<Vec<_>>>()
            .map(|parts| parts.concat());
        Some(match literal {
            Some(text) => PropertyValue::String(text),
            None => PropertyValue::Unresolved(TargetExpr::Concat(pieces)),
        })
    }

    fn resolve_placeholder(
        &mut self,
        name: &str,
        vars: &IndexMap<String, Expr>,
        path: &str,
    ) -> Option<PropertyValue> {
        if let Some(bound) = vars.get(name) {
            return self.resolve(bound, path);
        }
        if !pseudo::is_pseudo(name) {
            if let Some((logical_id, attribute)) = name.split_once('.') {
                return self.resolve_get_att(logical_id, attribute, path);
            }
        }
        self.resolve_ref(name, path)
    }

    fn resolve_join(
        &mut self,
        delimiter: &str,
        parts: &[Expr],
        path: &str,
    ) -> Option<PropertyValue> {
        let mut resolved = Vec::new();
        for (i, part) in parts.iter().enumerate() {
            if let Some(value) = self.resolve(part, &format!("{path}[{i}]")) {
                resolved.push(value);
            }
        }

        let literal: Option<Vec<String>> = resolved
            .iter()
            .map(PropertyValue::scalar_to_string)
            .collect();
        Some(match literal {
            Some(parts) => PropertyValue::String(parts.join(delimiter)),
            None => PropertyValue::Unresolved(TargetExpr::Call {
                name: "join".to_string(),
                args: vec![
                    PropertyValue::String(delimiter.to_string()),
                    PropertyValue::List(resolved),
                ],
            }),
        })
    }

    fn resolve_select(
        &mut self,
        index: &Expr,
        list: &Expr,
        call: &Expr,
        path: &str,
    ) -> Option<PropertyValue> {
        let index_value = self.resolve(index, path)?;
        let list_value = self.resolve(list, path)?;

        if let (Some(i), PropertyValue::List(items)) = (literal_index(&index_value), &list_value) {
            return match items.get(i) {
                Some(item) => Some(item.clone()),
                None => {
                    // Out-of-range selection is a data problem in the source
                    // template, reported rather than propagated as a panic.
                    self.unresolved(path, "Fn::Select", call);
                    None
                }
            };
        }

        Some(PropertyValue::Unresolved(TargetExpr::Call {
            name: "element".to_string(),
            args: vec![list_value, index_value],
        }))
    }

    fn resolve_split(
        &mut self,
        delimiter: &str,
        source: &Expr,
        path: &str,
    ) -> Option<PropertyValue> {
        let value = self.resolve(source, path)?;
        Some(match value.as_str() {
            Some(text) => PropertyValue::List(
                text.split(delimiter)
                    .map(|part| PropertyValue::String(part.to_string()))
                    .collect(),
            ),
            None => PropertyValue::Unresolved(TargetExpr::Call {
                name: "split".to_string(),
                args: vec![PropertyValue::String(delimiter.to_string()), value],
            }),
        })
    }

    fn resolve_if(
        &mut self,
        condition: &str,
        when_true: &Expr,
        when_false: &Expr,
        path: &str,
    ) -> Option<PropertyValue> {
        match self.evaluate_condition_name(condition, path) {
            Some(true) => self.resolve(when_true, path),
            Some(false) => self.resolve(when_false, path),
            None => {
                let when_true = self
                    .resolve(when_true, path)
                    .unwrap_or(PropertyValue::Null);
                let when_false = self
                    .resolve(when_false, path)
                    .unwrap_or(PropertyValue::Null);
                Some(PropertyValue::Unresolved(TargetExpr::Conditional {
                    condition: Box::new(self.variable_placeholder(condition)),
                    when_true: Box::new(when_true),
                    when_false: Box::new(when_false),
                }))
            }
        }
    }

    fn resolve_find_in_map(
        &mut self,
        map: &Expr,
        top_key: &Expr,
        second_key: &Expr,
        call: &Expr,
        path: &str,
    ) -> Option<PropertyValue> {
        let map_name = self.resolve(map, path).and_then(|v| v.scalar_to_string());
        let table = match (self.stack, map_name) {
            (Some(stack), Some(name)) => stack.template.mappings.get(&name).cloned(),
            _ => None,
        };
        let Some(table) = table else {
            self.unresolved(path, "Fn::FindInMap", call);
            return None;
        };

        let top = self.resolve(top_key, path)?;
        let second = self.resolve(second_key, path)?;
        match (top.scalar_to_string(), second.scalar_to_string()) {
            (Some(top), Some(second)) => {
                match table.get(&top).and_then(|row| row.get(&second)) {
                    Some(value) => Some(PropertyValue::from_json(value)),
                    None => {
                        self.unresolved(path, "Fn::FindInMap", call);
                        None
                    }
                }
            }
            // Non-literal keys: embed the static table and defer the lookup
            // to the target language.
            _ => {
                let rows = PropertyValue::Map(
                    table
                        .iter()
                        .map(|(key, row)| {
                            let row = PropertyValue::Map(
                                row.iter()
                                    .map(|(k, v)| (k.clone(), PropertyValue::from_json(v)))
                                    .collect(),
                            );
                            (key.clone(), row)
                        })
                        .collect(),
                );
                let row = PropertyValue::Unresolved(TargetExpr::Call {
                    name: "lookup".to_string(),
                    args: vec![rows, top],
                });
                Some(PropertyValue::Unresolved(TargetExpr::Call {
                    name: "lookup".to_string(),
                    args: vec![row, second],
                }))
            }
        }
    }

    fn resolve_get_azs(
        &mut self,
        region: &Expr,
        call: &Expr,
        path: &str,
    ) -> Option<PropertyValue> {
        const AZS: &str = "data.aws_availability_zones.available.names";
        let resolved = self.resolve(region, path)?;
        let current_region = match &resolved {
            PropertyValue::String(text) => {
                text.is_empty() || Some(text.as_str()) == self.stack.map(|s| s.region.as_str())
            }
            PropertyValue::Unresolved(TargetExpr::Data(data)) => {
                data == "data.aws_region.current.name"
            }
            _ => false,
        };
        if !current_region {
            // Zone lists for foreign regions are not observable here; fall
            // back to the deployment region's list and report it.
            self.unresolved(path, "Fn::GetAZs", call);
        }
        Some(PropertyValue::Unresolved(TargetExpr::Data(AZS.to_string())))
    }

    fn evaluate_condition_name(&mut self, name: &str, path: &str) -> Option<bool> {
        if self.active_conditions.iter().any(|active| active == name) {
            return None;
        }
        let condition = self.stack?.template.conditions.get(name)?.clone();
        self.active_conditions.push(name.to_string());
        let result = self.evaluate_condition(&condition, path);
        self.active_conditions.pop();
        result
    }

    /// Statically evaluates a condition tree. `None` means the truth value
    /// depends on something only the target system knows.
    fn evaluate_condition(&mut self, expr: &Expr, path: &str) -> Option<bool> {
        match expr {
            Expr::Lit(Value::Bool(value)) => Some(*value),
            Expr::Equals(left, right) => {
                let left = self.resolve(left, path)?.scalar_to_string()?;
                let right = self.resolve(right, path)?.scalar_to_string()?;
                Some(left == right)
            }
            Expr::And(operands) => {
                let values: Vec<Option<bool>> = operands
                    .iter()
                    .map(|operand| self.evaluate_condition(operand, path))
                    .collect();
                if values.iter().any(|v| *v == Some(false)) {
                    Some(false)
                } else if values.iter().any(Option::is_none) {
                    None
                } else {
                    Some(true)
                }
            }
            Expr::Or(operands) => {
                let values: Vec<Option<bool>> = operands
                    .iter()
                    .map(|operand| self.evaluate_condition(operand, path))
                    .collect();
                if values.iter().any(|v| *v == Some(true)) {
                    Some(true)
                } else if values.iter().any(Option::is_none) {
                    None
                } else {
                    Some(false)
                }
            }
            Expr::Not(operand) => self.evaluate_condition(operand, path).map(|v| !v),
            Expr::Condition(name) => self.evaluate_condition_name(name, path),
            Expr::If {
                condition,
                when_true,
                when_false,
            } => match self.evaluate_condition_name(condition, path) {
                Some(true) => self.evaluate_condition(when_true, path),
                Some(false) => self.evaluate_condition(when_false, path),
                None => None,
            },
            _ => None,
        }
    }

    fn unresolved(&mut self, path: &str, intrinsic: &str, call: &Expr) {
        self.findings.push(Finding::UnresolvedIntrinsic {
            property_path: path.to_string(),
            intrinsic: intrinsic.to_string(),
            raw: call.to_value(),
        });
    }

    fn variable_placeholder(&self, name: &str) -> PropertyValue {
        PropertyValue::Unresolved(TargetExpr::Var(names::sanitize_identifier(name)))
    }
}

fn literal_index(value: &PropertyValue) -> Option<usize> {
    match value {
        PropertyValue::Number(n) => n.as_u64().and_then(|n| usize::try_from(n).ok()),
        PropertyValue::String(s) => s.parse().ok(),
        _ => None,
    }
}

fn condition_intrinsic_name(expr: &Expr) -> &'static str {
    match expr {
        Expr::Equals(..) => "Fn::Equals",
        Expr::And(_) => "Fn::And",
        Expr::Or(_) => "Fn::Or",
        Expr::Not(_) => "Fn::Not",
        _ => "Condition",
    }
}
