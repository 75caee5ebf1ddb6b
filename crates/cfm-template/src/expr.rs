//! The closed intrinsic-expression union.
//!
//! Raw property JSON is decoded into [`Expr`] exactly once, at ingestion.
//! Every later phase pattern-matches on the variants and never looks at raw
//! JSON again. Unrecognized or structurally malformed intrinsic calls are
//! preserved verbatim under [`Expr::Unknown`] rather than rejected, so a
//! single odd call site cannot sink a whole conversion.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Decode context. The `Conditions` section allows the bare
/// `{"Condition": name}` reference form; inside resource properties the same
/// shape is ordinary data (IAM policies are full of `Condition` keys).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Ctx {
    Value,
    Condition,
}

/// One node of a decoded property or condition tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Literal scalar: string, number, boolean, or null.
    Lit(Value),
    /// Plain array with decoded elements.
    Seq(Vec<Expr>),
    /// Plain object with decoded values.
    Obj(IndexMap<String, Expr>),
    /// `Ref` to a logical id, template parameter, or pseudo parameter.
    Ref(String),
    /// `Fn::GetAtt` on a logical id.
    GetAtt {
        /// Target logical id.
        logical_id: String,
        /// Attribute name, possibly dotted.
        attribute: String,
    },
    /// `Fn::Sub` string template with optional local bindings.
    Sub {
        /// The raw template text including `${...}` placeholders.
        template: String,
        /// Local substitution bindings, empty for the one-argument form.
        vars: IndexMap<String, Expr>,
    },
    /// `Fn::Join` over a literal part list.
    Join {
        /// Literal delimiter.
        delimiter: String,
        /// Parts to join.
        parts: Vec<Expr>,
    },
    /// `Fn::Select` by zero-based index.
    Select {
        /// Index expression, usually a literal number or numeric string.
        index: Box<Expr>,
        /// List expression.
        list: Box<Expr>,
    },
    /// `Fn::Split` of a source string.
    Split {
        /// Literal delimiter.
        delimiter: String,
        /// Source string expression.
        source: Box<Expr>,
    },
    /// `Fn::If` over a named condition.
    If {
        /// Name of a condition declared in the owning template.
        condition: String,
        /// Branch taken when the condition holds.
        when_true: Box<Expr>,
        /// Branch taken otherwise.
        when_false: Box<Expr>,
    },
    /// `Fn::Equals` comparison.
    Equals(Box<Expr>, Box<Expr>),
    /// `Fn::And` over two or more condition operands.
    And(Vec<Expr>),
    /// `Fn::Or` over two or more condition operands.
    Or(Vec<Expr>),
    /// `Fn::Not` over one condition operand.
    Not(Box<Expr>),
    /// Reference to another named condition.
    Condition(String),
    /// `Fn::FindInMap` two-level lookup into the template's Mappings.
    FindInMap {
        /// Mapping name expression.
        map: Box<Expr>,
        /// First-level key expression.
        top_key: Box<Expr>,
        /// Second-level key expression.
        second_key: Box<Expr>,
    },
    /// `Fn::Base64` encoding of a nested expression.
    Base64(Box<Expr>),
    /// `Fn::GetAZs` for a region; an empty string means the current region.
    GetAzs(Box<Expr>),
    /// Unrecognized intrinsic call, preserved verbatim for reporting.
    Unknown {
        /// The intrinsic name as written, e.g. `Fn::ImportValue`.
        name: String,
        /// The whole original call site.
        raw: Value,
    },
}

impl Expr {
    /// Decodes a property-position value.
    pub fn decode(value: &Value) -> Self {
        Self::decode_with(value, Ctx::Value)
    }

    /// Decodes a `Conditions`-section value, where `{"Condition": name}`
    /// references another condition.
    pub fn decode_condition(value: &Value) -> Self {
        Self::decode_with(value, Ctx::Condition)
    }

    fn decode_with(value: &Value, ctx: Ctx) -> Self {
        match value {
            Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_) => {
                Expr::Lit(value.clone())
            }
            Value::Array(items) => {
                Expr::Seq(items.iter().map(|v| Self::decode_with(v, ctx)).collect())
            }
            Value::Object(map) => {
                if map.len() == 1 {
                    if let Some((name, arg)) = map.iter().next() {
                        if let Some(expr) = Self::decode_call(name, arg, value, ctx) {
                            return expr;
                        }
                    }
                }
                Expr::Obj(
                    map.iter()
                        .map(|(k, v)| (k.clone(), Self::decode_with(v, Ctx::Value)))
                        .collect(),
                )
            }
        }
    }

    /// Decodes a single-key object as an intrinsic call. Returns `None` when
    /// the key is not an intrinsic name, so the caller falls through to plain
    /// object decoding. A malformed call of a known name becomes
    /// [`Expr::Unknown`] instead of an error.
    fn decode_call(name: &str, arg: &Value, whole: &Value, ctx: Ctx) -> Option<Expr> {
        let unknown = || {
            Some(Expr::Unknown {
                name: name.to_string(),
                raw: whole.clone(),
            })
        };
        match name {
            "Ref" => match arg.as_str() {
                Some(target) => Some(Expr::Ref(target.to_string())),
                None => unknown(),
            },
            "Fn::GetAtt" => match arg {
                Value::String(dotted) => {
                    let Some((logical_id, attribute)) = dotted.split_once('.') else {
                        return unknown();
                    };
                    if logical_id.is_empty() || attribute.is_empty() {
                        return unknown();
                    }
                    Some(Expr::GetAtt {
                        logical_id: logical_id.to_string(),
                        attribute: attribute.to_string(),
                    })
                }
                Value::Array(items) if items.len() >= 2 => {
                    let mut strings = Vec::with_capacity(items.len());
                    for item in items {
                        let Some(s) = item.as_str() else {
                            return unknown();
                        };
                        strings.push(s.to_string());
                    }
                    Some(Expr::GetAtt {
                        logical_id: strings[0].clone(),
                        attribute: strings[1..].join("."),
                    })
                }
                _ => unknown(),
            },
            "Fn::Sub" => match arg {
                Value::String(template) => Some(Expr::Sub {
                    template: template.clone(),
                    vars: IndexMap::new(),
                }),
                Value::Array(items) if items.len() == 2 => {
                    let Some(template) = items[0].as_str().map(str::to_string) else {
                        return unknown();
                    };
                    let Some(vars) = items[1].as_object() else {
                        return unknown();
                    };
                    Some(Expr::Sub {
                        template,
                        vars: vars
                            .iter()
                            .map(|(k, v)| (k.clone(), Self::decode_with(v, Ctx::Value)))
                            .collect(),
                    })
                }
                _ => unknown(),
            },
            "Fn::Join" => match arg {
                Value::Array(items) if items.len() == 2 => {
                    let Some(delimiter) = items[0].as_str().map(str::to_string) else {
                        return unknown();
                    };
                    let Some(parts) = items[1].as_array() else {
                        return unknown();
                    };
                    Some(Expr::Join {
                        delimiter,
                        parts: parts.iter().map(Self::decode).collect(),
                    })
                }
                _ => unknown(),
            },
            "Fn::Select" => match arg {
                Value::Array(items) if items.len() == 2 => Some(Expr::Select {
                    index: Box::new(Self::decode(&items[0])),
                    list: Box::new(Self::decode(&items[1])),
                }),
                _ => unknown(),
            },
            "Fn::Split" => match arg {
                Value::Array(items) if items.len() == 2 => {
                    let Some(delimiter) = items[0].as_str().map(str::to_string) else {
                        return unknown();
                    };
                    Some(Expr::Split {
                        delimiter,
                        source: Box::new(Self::decode(&items[1])),
                    })
                }
                _ => unknown(),
            },
            "Fn::If" => match arg {
                Value::Array(items) if items.len() == 3 => {
                    let Some(condition) = items[0].as_str().map(str::to_string) else {
                        return unknown();
                    };
                    Some(Expr::If {
                        condition,
                        when_true: Box::new(Self::decode(&items[1])),
                        when_false: Box::new(Self::decode(&items[2])),
                    })
                }
                _ => unknown(),
            },
            "Fn::Equals" => match arg {
                Value::Array(items) if items.len() == 2 => Some(Expr::Equals(
                    Box::new(Self::decode(&items[0])),
                    Box::new(Self::decode(&items[1])),
                )),
                _ => unknown(),
            },
            "Fn::And" | "Fn::Or" => match arg {
                Value::Array(items) if items.len() >= 2 => {
                    let operands = items
                        .iter()
                        .map(|v| Self::decode_with(v, Ctx::Condition))
                        .collect();
                    if name == "Fn::And" {
                        Some(Expr::And(operands))
                    } else {
                        Some(Expr::Or(operands))
                    }
                }
                _ => unknown(),
            },
            "Fn::Not" => match arg {
                Value::Array(items) if items.len() == 1 => Some(Expr::Not(Box::new(
                    Self::decode_with(&items[0], Ctx::Condition),
                ))),
                _ => unknown(),
            },
            "Condition" if ctx == Ctx::Condition => match arg {
                Value::String(cond) => Some(Expr::Condition(cond.clone())),
                _ => unknown(),
            },
            "Fn::FindInMap" => match arg {
                Value::Array(items) if items.len() == 3 => Some(Expr::FindInMap {
                    map: Box::new(Self::decode(&items[0])),
                    top_key: Box::new(Self::decode(&items[1])),
                    second_key: Box::new(Self::decode(&items[2])),
                }),
                _ => unknown(),
            },
            "Fn::Base64" => Some(Expr::Base64(Box::new(Self::decode(arg)))),
            "Fn::GetAZs" => Some(Expr::GetAzs(Box::new(Self::decode(arg)))),
            other if other.starts_with("Fn::") => unknown(),
            _ => None,
        }
    }

    /// Re-encodes this expression as canonical long-form template JSON.
    ///
    /// Decoding the result yields an equal expression, so the JSON form can
    /// serve as the wire representation of decoded trees.
    #[must_use]
    pub fn to_value(&self) -> Value {
        use serde_json::json;
        match self {
            Expr::Lit(v) => v.clone(),
            Expr::Seq(items) => Value::Array(items.iter().map(Expr::to_value).collect()),
            Expr::Obj(map) => Value::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), v.to_value()))
                    .collect(),
            ),
            Expr::Ref(target) => json!({ "Ref": target }),
            Expr::GetAtt {
                logical_id,
                attribute,
            } => json!({ "Fn::GetAtt": [logical_id, attribute] }),
            Expr::Sub { template, vars } => {
                if vars.is_empty() {
                    json!({ "Fn::Sub": template })
                } else {
                    let vars: serde_json::Map<String, Value> = vars
                        .iter()
                        .map(|(k, v)| (k.clone(), v.to_value()))
                        .collect();
                    json!({ "Fn::Sub": [template, vars] })
                }
            }
            Expr::Join { delimiter, parts } => {
                let parts: Vec<Value> = parts.iter().map(Expr::to_value).collect();
                json!({ "Fn::Join": [delimiter, parts] })
            }
            Expr::Select { index, list } => {
                json!({ "Fn::Select": [index.to_value(), list.to_value()] })
            }
            Expr::Split { delimiter, source } => {
                json!({ "Fn::Split": [delimiter, source.to_value()] })
            }
            Expr::If {
                condition,
                when_true,
                when_false,
            } => json!({ "Fn::If": [condition, when_true.to_value(), when_false.to_value()] }),
            Expr::Equals(left, right) => {
                json!({ "Fn::Equals": [left.to_value(), right.to_value()] })
            }
            Expr::And(operands) => {
                json!({ "Fn::And": operands.iter().map(Expr::to_value).collect::<Vec<_>>() })
            }
            Expr::Or(operands) => {
                json!({ "Fn::Or": operands.iter().map(Expr::to_value).collect::<Vec<_>>() })
            }
            Expr::Not(inner) => json!({ "Fn::Not": [inner.to_value()] }),
            Expr::Condition(name) => json!({ "Condition": name }),
            Expr::FindInMap {
                map,
                top_key,
                second_key,
            } => {
                json!({ "Fn::FindInMap": [map.to_value(), top_key.to_value(), second_key.to_value()] })
            }
            Expr::Base64(inner) => json!({ "Fn::Base64": inner.to_value() }),
            Expr::GetAzs(inner) => json!({ "Fn::GetAZs": inner.to_value() }),
            Expr::Unknown { raw, .. } => raw.clone(),
        }
    }

    /// Returns the literal string when this node is a string literal.
    #[must_use]
    pub fn as_lit_str(&self) -> Option<&str> {
        match self {
            Expr::Lit(Value::String(s)) => Some(s),
            _ => None,
        }
    }

    /// Returns a list index when this node is a literal number or a string
    /// of digits. CloudFormation templates write `Fn::Select` indexes both
    /// ways.
    #[must_use]
    pub fn as_lit_index(&self) -> Option<usize> {
        match self {
            Expr::Lit(Value::Number(n)) => n.as_u64().map(|v| v as usize),
            Expr::Lit(Value::String(s)) => s.parse().ok(),
            _ => None,
        }
    }

    /// Pre-order walk over this expression and everything below it.
    pub fn walk(&self, visit: &mut impl FnMut(&Expr)) {
        visit(self);
        match self {
            Expr::Lit(_) | Expr::Ref(_) | Expr::GetAtt { .. } | Expr::Condition(_) => {}
            Expr::Unknown { .. } => {}
            Expr::Seq(items) | Expr::And(items) | Expr::Or(items) | Expr::Join { parts: items, .. } => {
                for item in items {
                    item.walk(visit);
                }
            }
            Expr::Obj(map) => {
                for value in map.values() {
                    value.walk(visit);
                }
            }
            Expr::Sub { vars, .. } => {
                for value in vars.values() {
                    value.walk(visit);
                }
            }
            Expr::Select { index, list } => {
                index.walk(visit);
                list.walk(visit);
            }
            Expr::Split { source, .. } => source.walk(visit),
            Expr::If {
                when_true,
                when_false,
                ..
            } => {
                when_true.walk(visit);
                when_false.walk(visit);
            }
            Expr::Equals(left, right) => {
                left.walk(visit);
                right.walk(visit);
            }
            Expr::Not(inner) | Expr::Base64(inner) | Expr::GetAzs(inner) => inner.walk(visit),
            Expr::FindInMap {
                map,
                top_key,
                second_key,
            } => {
                map.walk(visit);
                top_key.walk(visit);
                second_key.walk(visit);
            }
        }
    }
}

// The wire form is the canonical long-form template JSON from `to_value`.
// Decoding is total, so deserialization cannot fail past the JSON layer.
impl Serialize for Expr {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.to_value().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Expr {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(Self::decode(&value))
    }
}
