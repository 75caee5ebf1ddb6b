//! YAML template normalization.
//!
//! CloudFormation YAML allows short-form intrinsic tags (`!Ref X`,
//! `!GetAtt A.B`, `!Sub "..."`). This module converts a YAML document to
//! canonical JSON, rewriting each tag into its long-form object so the rest
//! of the crate only ever sees one spelling.

use serde_json::Value as Json;
use serde_yaml::Value as Yaml;

use crate::error::TemplateError;

/// Parses YAML text into canonical JSON with long-form intrinsics.
pub(crate) fn to_json(text: &str) -> Result<Json, TemplateError> {
    let value: Yaml = serde_yaml::from_str(text)?;
    value_to_json(&value)
}

fn value_to_json(value: &Yaml) -> Result<Json, TemplateError> {
    match value {
        Yaml::Null => Ok(Json::Null),
        Yaml::Bool(b) => Ok(Json::Bool(*b)),
        Yaml::Number(n) => number_to_json(n),
        Yaml::String(s) => Ok(Json::String(s.clone())),
        Yaml::Sequence(items) => {
            let mut out = Vec::with_capacity(items.len());
            for item in items {
                out.push(value_to_json(item)?);
            }
            Ok(Json::Array(out))
        }
        Yaml::Mapping(map) => {
            let mut out = serde_json::Map::with_capacity(map.len());
            for (key, item) in map {
                let Yaml::String(key) = key else {
                    return Err(TemplateError::NonStringKey);
                };
                out.insert(key.clone(), value_to_json(item)?);
            }
            Ok(Json::Object(out))
        }
        Yaml::Tagged(tagged) => {
            let name = tagged.tag.to_string();
            let short = name.trim_start_matches('!');
            let mut out = serde_json::Map::with_capacity(1);
            out.insert(long_form_key(short), value_to_json(&tagged.value)?);
            Ok(Json::Object(out))
        }
    }
}

/// Maps a short-form tag name to the long-form object key. `!Ref` and
/// `!Condition` keep their bare names; everything else gains the `Fn::`
/// prefix, which is exactly CloudFormation's rule.
fn long_form_key(short: &str) -> String {
    match short {
        "Ref" | "Condition" => short.to_string(),
        other => format!("Fn::{other}"),
    }
}

fn number_to_json(n: &serde_yaml::Number) -> Result<Json, TemplateError> {
    if let Some(u) = n.as_u64() {
        return Ok(Json::Number(u.into()));
    }
    if let Some(i) = n.as_i64() {
        return Ok(Json::Number(i.into()));
    }
    let f = n
        .as_f64()
        .ok_or_else(|| TemplateError::UnrepresentableNumber(n.to_string()))?;
    serde_json::Number::from_f64(f)
        .map(Json::Number)
        .ok_or_else(|| TemplateError::UnrepresentableNumber(n.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn short_form_tags_become_long_form() {
        let text = r#"
Resources:
  Subnet:
    Type: AWS::EC2::Subnet
    Properties:
      VpcId: !Ref Vpc
      Arn: !GetAtt [Vpc, Arn]
      Name: !Sub "${Vpc}-subnet"
      Gated: !If [IsProd, a, b]
"#;
        let value = to_json(text).unwrap();
        let props = &value["Resources"]["Subnet"]["Properties"];
        assert_eq!(props["VpcId"], json!({"Ref": "Vpc"}));
        assert_eq!(props["Arn"], json!({"Fn::GetAtt": ["Vpc", "Arn"]}));
        assert_eq!(props["Name"], json!({"Fn::Sub": "${Vpc}-subnet"}));
        assert_eq!(props["Gated"], json!({"Fn::If": ["IsProd", "a", "b"]}));
    }

    #[test]
    fn dotted_getatt_scalar_survives() {
        let value = to_json("A: !GetAtt Db.Endpoint.Address").unwrap();
        assert_eq!(value["A"], json!({"Fn::GetAtt": "Db.Endpoint.Address"}));
    }

    #[test]
    fn condition_tag_keeps_bare_name() {
        let value = to_json("C: !Condition Other").unwrap();
        assert_eq!(value["C"], json!({"Condition": "Other"}));
    }

    #[test]
    fn numbers_convert() {
        let value = to_json("a: 3\nb: -2\nc: 1.5").unwrap();
        assert_eq!(value, json!({"a": 3, "b": -2, "c": 1.5}));
    }

    #[test]
    fn non_string_keys_are_rejected() {
        assert!(to_json("1: x").is_err());
    }
}
