//! Parsed template bodies.
//!
//! A [`TemplateBody`] is the fully decoded form of one CloudFormation
//! template: sections keyed in declaration order, every property and
//! condition already turned into [`Expr`] trees.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::TemplateError;
use crate::expr::Expr;
use crate::yaml;

/// A template parameter declaration.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ParameterDef {
    /// Declared parameter type, e.g. `String` or `AWS::EC2::VPC::Id`.
    pub param_type: String,
    /// Declared default, when present.
    pub default: Option<Value>,
    /// Human-readable description.
    pub description: Option<String>,
    /// Declared value whitelist, empty when unconstrained.
    pub allowed_values: Vec<Value>,
    /// Whether the value is masked in console output.
    pub no_echo: bool,
}

/// One resource definition inside a template.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceDef {
    /// Source type name, e.g. `AWS::EC2::Subnet`.
    pub resource_type: String,
    /// Raw property expressions in declaration order.
    pub properties: IndexMap<String, Expr>,
    /// Explicit ordering hints, normalized to a list.
    pub depends_on: Vec<String>,
    /// Name of the condition gating this resource, when present.
    pub condition: Option<String>,
    /// `DeletionPolicy` attribute as written, when present.
    pub deletion_policy: Option<String>,
}

/// One output declaration inside a template.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputDef {
    /// Human-readable description.
    pub description: Option<String>,
    /// The output value expression.
    pub value: Expr,
    /// Export name expression, when the output is exported.
    pub export_name: Option<Expr>,
}

/// Two-level mapping table from the template's `Mappings` section.
pub type MappingTable = IndexMap<String, IndexMap<String, Value>>;

/// A fully decoded template.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TemplateBody {
    /// Template description, when present.
    pub description: Option<String>,
    /// Parameter declarations in order.
    pub parameters: IndexMap<String, ParameterDef>,
    /// `Mappings` section, mapping name to a two-level lookup table.
    pub mappings: IndexMap<String, MappingTable>,
    /// Condition declarations, each decoded in condition context.
    pub conditions: IndexMap<String, Expr>,
    /// Resource definitions in declaration order.
    pub resources: IndexMap<String, ResourceDef>,
    /// Output declarations in order.
    pub outputs: IndexMap<String, OutputDef>,
}

impl TemplateBody {
    /// Parses a JSON template document.
    pub fn from_json_str(text: &str) -> Result<Self, TemplateError> {
        let value: Value = serde_json::from_str(text)?;
        Self::from_value(&value)
    }

    /// Parses a YAML template document, normalizing CloudFormation's
    /// short-form tags (`!Ref`, `!GetAtt`, `!Sub`, ...) first.
    pub fn from_yaml_str(text: &str) -> Result<Self, TemplateError> {
        let value = yaml::to_json(text)?;
        Self::from_value(&value)
    }

    /// Decodes an already-parsed JSON document.
    pub fn from_value(value: &Value) -> Result<Self, TemplateError> {
        let root = value.as_object().ok_or(TemplateError::RootNotObject {
            found: value_kind(value),
        })?;
        let mut body = TemplateBody {
            description: root
                .get("Description")
                .and_then(Value::as_str)
                .map(String::from),
            ..TemplateBody::default()
        };

        for (name, raw) in section(root, "Parameters")? {
            body.parameters.insert(name.clone(), decode_parameter(raw));
        }
        for (name, raw) in section(root, "Mappings")? {
            body.mappings.insert(name.clone(), decode_mapping(raw));
        }
        for (name, raw) in section(root, "Conditions")? {
            body.conditions
                .insert(name.clone(), Expr::decode_condition(raw));
        }
        for (logical_id, raw) in section(root, "Resources")? {
            body.resources
                .insert(logical_id.clone(), decode_resource(logical_id, raw)?);
        }
        for (name, raw) in section(root, "Outputs")? {
            body.outputs.insert(name.clone(), decode_output(name, raw)?);
        }
        Ok(body)
    }

    /// Re-encodes the body as canonical long-form template JSON.
    #[must_use]
    pub fn to_value(&self) -> Value {
        let mut root = serde_json::Map::new();
        if let Some(description) = &self.description {
            root.insert("Description".into(), Value::String(description.clone()));
        }
        if !self.parameters.is_empty() {
            let section: serde_json::Map<String, Value> = self
                .parameters
                .iter()
                .map(|(name, p)| (name.clone(), encode_parameter(p)))
                .collect();
            root.insert("Parameters".into(), Value::Object(section));
        }
        if !self.mappings.is_empty() {
            let section: serde_json::Map<String, Value> = self
                .mappings
                .iter()
                .map(|(name, table)| (name.clone(), encode_mapping(table)))
                .collect();
            root.insert("Mappings".into(), Value::Object(section));
        }
        if !self.conditions.is_empty() {
            let section: serde_json::Map<String, Value> = self
                .conditions
                .iter()
                .map(|(name, expr)| (name.clone(), expr.to_value()))
                .collect();
            root.insert("Conditions".into(), Value::Object(section));
        }
        let resources: serde_json::Map<String, Value> = self
            .resources
            .iter()
            .map(|(id, def)| (id.clone(), encode_resource(def)))
            .collect();
        root.insert("Resources".into(), Value::Object(resources));
        if !self.outputs.is_empty() {
            let section: serde_json::Map<String, Value> = self
                .outputs
                .iter()
                .map(|(name, def)| (name.clone(), encode_output(def)))
                .collect();
            root.insert("Outputs".into(), Value::Object(section));
        }
        Value::Object(root)
    }
}

impl Serialize for TemplateBody {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.to_value().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for TemplateBody {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Self::from_value(&value).map_err(serde::de::Error::custom)
    }
}

fn encode_parameter(p: &ParameterDef) -> Value {
    let mut map = serde_json::Map::new();
    map.insert("Type".into(), Value::String(p.param_type.clone()));
    if let Some(default) = &p.default {
        map.insert("Default".into(), default.clone());
    }
    if let Some(description) = &p.description {
        map.insert("Description".into(), Value::String(description.clone()));
    }
    if !p.allowed_values.is_empty() {
        map.insert("AllowedValues".into(), Value::Array(p.allowed_values.clone()));
    }
    if p.no_echo {
        map.insert("NoEcho".into(), Value::Bool(true));
    }
    Value::Object(map)
}

fn encode_mapping(table: &MappingTable) -> Value {
    let top: serde_json::Map<String, Value> = table
        .iter()
        .map(|(top_key, inner)| {
            let inner: serde_json::Map<String, Value> = inner
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect();
            (top_key.clone(), Value::Object(inner))
        })
        .collect();
    Value::Object(top)
}

fn encode_resource(def: &ResourceDef) -> Value {
    let mut map = serde_json::Map::new();
    map.insert("Type".into(), Value::String(def.resource_type.clone()));
    if !def.properties.is_empty() {
        let props: serde_json::Map<String, Value> = def
            .properties
            .iter()
            .map(|(name, expr)| (name.clone(), expr.to_value()))
            .collect();
        map.insert("Properties".into(), Value::Object(props));
    }
    if !def.depends_on.is_empty() {
        map.insert(
            "DependsOn".into(),
            Value::Array(def.depends_on.iter().cloned().map(Value::String).collect()),
        );
    }
    if let Some(condition) = &def.condition {
        map.insert("Condition".into(), Value::String(condition.clone()));
    }
    if let Some(policy) = &def.deletion_policy {
        map.insert("DeletionPolicy".into(), Value::String(policy.clone()));
    }
    Value::Object(map)
}

fn encode_output(def: &OutputDef) -> Value {
    let mut map = serde_json::Map::new();
    if let Some(description) = &def.description {
        map.insert("Description".into(), Value::String(description.clone()));
    }
    map.insert("Value".into(), def.value.to_value());
    if let Some(export_name) = &def.export_name {
        let mut export = serde_json::Map::new();
        export.insert("Name".into(), export_name.to_value());
        map.insert("Export".into(), Value::Object(export));
    }
    Value::Object(map)
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Fetches a named top-level section as object entries; a missing section is
/// an empty iterator, a non-object section is an error.
fn section<'a>(
    root: &'a serde_json::Map<String, Value>,
    name: &str,
) -> Result<Box<dyn Iterator<Item = (&'a String, &'a Value)> + 'a>, TemplateError> {
    match root.get(name) {
        None => Ok(Box::new(std::iter::empty())),
        Some(Value::Object(map)) => Ok(Box::new(map.iter())),
        Some(_) => Err(TemplateError::SectionNotObject {
            section: name.to_string(),
        }),
    }
}

fn decode_parameter(raw: &Value) -> ParameterDef {
    let Some(map) = raw.as_object() else {
        return ParameterDef::default();
    };
    ParameterDef {
        param_type: map
            .get("Type")
            .and_then(Value::as_str)
            .unwrap_or("String")
            .to_string(),
        default: map.get("Default").cloned(),
        description: map
            .get("Description")
            .and_then(Value::as_str)
            .map(String::from),
        allowed_values: map
            .get("AllowedValues")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default(),
        no_echo: map.get("NoEcho").and_then(Value::as_bool).unwrap_or(false),
    }
}

fn decode_mapping(raw: &Value) -> MappingTable {
    let mut table = MappingTable::new();
    let Some(top) = raw.as_object() else {
        return table;
    };
    for (top_key, second) in top {
        let mut inner = IndexMap::new();
        if let Some(second) = second.as_object() {
            for (second_key, leaf) in second {
                inner.insert(second_key.clone(), leaf.clone());
            }
        }
        table.insert(top_key.clone(), inner);
    }
    table
}

fn decode_resource(logical_id: &str, raw: &Value) -> Result<ResourceDef, TemplateError> {
    let map = raw
        .as_object()
        .ok_or_else(|| TemplateError::MissingResourceType {
            logical_id: logical_id.to_string(),
        })?;
    let resource_type = map
        .get("Type")
        .and_then(Value::as_str)
        .ok_or_else(|| TemplateError::MissingResourceType {
            logical_id: logical_id.to_string(),
        })?
        .to_string();

    let mut properties = IndexMap::new();
    if let Some(Value::Object(props)) = map.get("Properties") {
        for (name, value) in props {
            properties.insert(name.clone(), Expr::decode(value));
        }
    }

    let depends_on = match map.get("DependsOn") {
        None => Vec::new(),
        Some(Value::String(one)) => vec![one.clone()],
        Some(Value::Array(items)) => {
            let mut names = Vec::with_capacity(items.len());
            for item in items {
                let name = item
                    .as_str()
                    .ok_or_else(|| TemplateError::MalformedDependsOn {
                        logical_id: logical_id.to_string(),
                    })?;
                names.push(name.to_string());
            }
            names
        }
        Some(_) => {
            return Err(TemplateError::MalformedDependsOn {
                logical_id: logical_id.to_string(),
            })
        }
    };

    Ok(ResourceDef {
        resource_type,
        properties,
        depends_on,
        condition: map
            .get("Condition")
            .and_then(Value::as_str)
            .map(String::from),
        deletion_policy: map
            .get("DeletionPolicy")
            .and_then(Value::as_str)
            .map(String::from),
    })
}

fn decode_output(name: &str, raw: &Value) -> Result<OutputDef, TemplateError> {
    let map = raw
        .as_object()
        .ok_or_else(|| TemplateError::MissingOutputValue {
            name: name.to_string(),
        })?;
    let value = map
        .get("Value")
        .ok_or_else(|| TemplateError::MissingOutputValue {
            name: name.to_string(),
        })?;
    let export_name = map
        .get("Export")
        .and_then(Value::as_object)
        .and_then(|export| export.get("Name"))
        .map(Expr::decode);
    Ok(OutputDef {
        description: map
            .get("Description")
            .and_then(Value::as_str)
            .map(String::from),
        value: Expr::decode(value),
        export_name,
    })
}
