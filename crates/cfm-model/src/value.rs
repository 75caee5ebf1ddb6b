//! Resolved property values and symbolic target expressions.
//!
//! After intrinsic resolution a property is either fully literal or carries
//! [`TargetExpr`] leaves for the parts only the target system can know, such
//! as another resource's generated identifier.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::id::NodeId;

/// A resolved property tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PropertyValue {
    /// Explicit null.
    Null,
    /// Boolean literal.
    Bool(bool),
    /// Numeric literal.
    Number(serde_json::Number),
    /// String literal.
    String(String),
    /// Ordered list.
    List(Vec<PropertyValue>),
    /// Ordered map.
    Map(IndexMap<String, PropertyValue>),
    /// A value that stays symbolic until the target system supplies it.
    Unresolved(TargetExpr),
}

/// A symbolic value in the target configuration language.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TargetExpr {
    /// Attribute of another converted resource, e.g. its generated id.
    Attr {
        /// The producing resource.
        node: NodeId,
        /// Target-schema attribute name, e.g. `id` or `arn`.
        attribute: String,
    },
    /// Module input variable by name.
    Var(String),
    /// Provider data-source path, e.g. `data.aws_region.current.name`.
    Data(String),
    /// Concatenation of literal and symbolic pieces into one string.
    Concat(Vec<PropertyValue>),
    /// Builtin function call, e.g. `base64encode` or `lookup`.
    Call {
        /// Function name.
        name: String,
        /// Positional arguments.
        args: Vec<PropertyValue>,
    },
    /// Two-way conditional.
    Conditional {
        /// Condition operand.
        condition: Box<PropertyValue>,
        /// Value when the condition holds.
        when_true: Box<PropertyValue>,
        /// Value otherwise.
        when_false: Box<PropertyValue>,
    },
}

impl PropertyValue {
    /// Converts plain JSON into a literal property tree.
    #[must_use]
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Null => PropertyValue::Null,
            Value::Bool(b) => PropertyValue::Bool(*b),
            Value::Number(n) => PropertyValue::Number(n.clone()),
            Value::String(s) => PropertyValue::String(s.clone()),
            Value::Array(items) => {
                PropertyValue::List(items.iter().map(Self::from_json).collect())
            }
            Value::Object(map) => PropertyValue::Map(
                map.iter()
                    .map(|(k, v)| (k.clone(), Self::from_json(v)))
                    .collect(),
            ),
        }
    }

    /// Returns the string when this value is a string literal.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropertyValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// True when no [`TargetExpr`] appears anywhere in the tree.
    #[must_use]
    pub fn is_fully_literal(&self) -> bool {
        match self {
            PropertyValue::Null
            | PropertyValue::Bool(_)
            | PropertyValue::Number(_)
            | PropertyValue::String(_) => true,
            PropertyValue::List(items) => items.iter().all(Self::is_fully_literal),
            PropertyValue::Map(map) => map.values().all(Self::is_fully_literal),
            PropertyValue::Unresolved(_) => false,
        }
    }

    /// Renders a literal scalar as a plain string, the way template string
    /// interpolation does. Lists, maps, and symbolic values have no such
    /// rendering.
    #[must_use]
    pub fn scalar_to_string(&self) -> Option<String> {
        match self {
            PropertyValue::String(s) => Some(s.clone()),
            PropertyValue::Number(n) => Some(n.to_string()),
            PropertyValue::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    /// Mutable pre-order walk over every symbolic leaf in the tree. The
    /// callback may replace the leaf wholesale; nested values of whatever is
    /// present afterwards are walked next.
    pub fn walk_unresolved_mut(&mut self, visit: &mut impl FnMut(&mut TargetExpr)) {
        match self {
            PropertyValue::Null
            | PropertyValue::Bool(_)
            | PropertyValue::Number(_)
            | PropertyValue::String(_) => {}
            PropertyValue::List(items) => {
                for item in items {
                    item.walk_unresolved_mut(visit);
                }
            }
            PropertyValue::Map(map) => {
                for value in map.values_mut() {
                    value.walk_unresolved_mut(visit);
                }
            }
            PropertyValue::Unresolved(expr) => {
                visit(expr);
                match expr {
                    TargetExpr::Attr { .. } | TargetExpr::Var(_) | TargetExpr::Data(_) => {}
                    TargetExpr::Concat(parts) => {
                        for part in parts {
                            part.walk_unresolved_mut(visit);
                        }
                    }
                    TargetExpr::Call { args, .. } => {
                        for arg in args {
                            arg.walk_unresolved_mut(visit);
                        }
                    }
                    TargetExpr::Conditional {
                        condition,
                        when_true,
                        when_false,
                    } => {
                        condition.walk_unresolved_mut(visit);
                        when_true.walk_unresolved_mut(visit);
                        when_false.walk_unresolved_mut(visit);
                    }
                }
            }
        }
    }

    /// Collects every resource-attribute reference in the tree, in
    /// encounter order.
    #[must_use]
    pub fn attr_refs(&self) -> Vec<(NodeId, String)> {
        let mut refs = Vec::new();
        // Walk without mutating; the mutable walker covers both uses.
        let mut clone = self.clone();
        clone.walk_unresolved_mut(&mut |expr| {
            if let TargetExpr::Attr { node, attribute } = expr {
                refs.push((*node, attribute.clone()));
            }
        });
        refs
    }
}

impl From<&str> for PropertyValue {
    fn from(s: &str) -> Self {
        PropertyValue::String(s.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(s: String) -> Self {
        PropertyValue::String(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn from_json_preserves_shape() {
        let value = PropertyValue::from_json(&json!({
            "CidrBlock": "10.0.0.0/16",
            "Tags": [{"Key": "Name", "Value": "vpc"}],
            "Count": 2
        }));
        assert!(value.is_fully_literal());
        match value {
            PropertyValue::Map(map) => {
                assert_eq!(map["CidrBlock"].as_str(), Some("10.0.0.0/16"));
                assert!(matches!(map["Tags"], PropertyValue::List(_)));
            }
            other => panic!("wrong variant: {other:?}"),
        }
    }

    #[test]
    fn symbolic_leaves_break_literality() {
        let value = PropertyValue::List(vec![
            PropertyValue::from("a"),
            PropertyValue::Unresolved(TargetExpr::Var("vpc_id".into())),
        ]);
        assert!(!value.is_fully_literal());
    }

    #[test]
    fn walk_can_replace_attr_with_var() {
        let node = NodeId::for_independent("vpc-1");
        let mut value = PropertyValue::Map(
            [(
                "VpcId".to_string(),
                PropertyValue::Unresolved(TargetExpr::Attr {
                    node,
                    attribute: "id".into(),
                }),
            )]
            .into_iter()
            .collect(),
        );
        value.walk_unresolved_mut(&mut |expr| {
            if matches!(expr, TargetExpr::Attr { .. }) {
                *expr = TargetExpr::Var("vpc_id".into());
            }
        });
        assert_eq!(value.attr_refs(), vec![]);
        match value {
            PropertyValue::Map(map) => assert_eq!(
                map["VpcId"],
                PropertyValue::Unresolved(TargetExpr::Var("vpc_id".into()))
            ),
            other => panic!("wrong variant: {other:?}"),
        }
    }

    #[test]
    fn attr_refs_reach_into_concat() {
        let node = NodeId::for_independent("sg-1");
        let value = PropertyValue::Unresolved(TargetExpr::Concat(vec![
            PropertyValue::from("prefix-"),
            PropertyValue::Unresolved(TargetExpr::Attr {
                node,
                attribute: "arn".into(),
            }),
        ]));
        assert_eq!(value.attr_refs(), vec![(node, "arn".to_string())]);
    }

    #[test]
    fn scalar_rendering_matches_interpolation() {
        assert_eq!(
            PropertyValue::Number(3.into()).scalar_to_string(),
            Some("3".to_string())
        );
        assert_eq!(
            PropertyValue::Bool(true).scalar_to_string(),
            Some("true".to_string())
        );
        assert_eq!(PropertyValue::Null.scalar_to_string(), None);
    }
}
