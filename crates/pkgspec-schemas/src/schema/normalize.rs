//! Decoding of file contents into JSON trees
//!
//! Copyright (c) 2025 Specado Team
//! Licensed under the Apache-2.0 license

use crate::loader::parser::yaml_to_json;
use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NormalizeError {
    #[error("unmarshalling YAML file failed: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("unmarshalling JSON file failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("key \"{key}\" conflicts with a value that is not an object")]
    Conflict { key: String },
}

/// Decode YAML content, expanding dotted keys when asked to.
pub fn yaml_content(data: &[u8], expand_keys: bool) -> Result<Value, NormalizeError> {
    let yaml: serde_yaml::Value = serde_yaml::from_slice(data)?;
    let value = yaml_to_json(yaml);
    if expand_keys {
        expand_dotted_keys(value)
    } else {
        Ok(value)
    }
}

pub fn json_content(data: &[u8]) -> Result<Value, NormalizeError> {
    Ok(serde_json::from_slice(data)?)
}

/// Turn `{"a.b": 1}` into `{"a": {"b": 1}}`, recursively.
///
/// Objects reached through different spellings are merged; a key that
/// needs to be both a scalar and an object is an error.
pub fn expand_dotted_keys(value: Value) -> Result<Value, NormalizeError> {
    match value {
        Value::Array(items) => items
            .into_iter()
            .map(expand_dotted_keys)
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        Value::Object(fields) => {
            let mut expanded = Map::new();
            for (key, value) in fields {
                let value = expand_dotted_keys(value)?;
                put(&mut expanded, &key, value)?;
            }
            Ok(Value::Object(expanded))
        }
        other => Ok(other),
    }
}

fn put(target: &mut Map<String, Value>, key: &str, value: Value) -> Result<(), NormalizeError> {
    let mut segments = key.split('.').peekable();
    let mut current = target;
    while let Some(segment) = segments.next() {
        if segments.peek().is_none() {
            return merge_into(current, segment, value, key);
        }
        let next = current
            .entry(segment.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        current = match next {
            Value::Object(map) => map,
            _ => {
                return Err(NormalizeError::Conflict {
                    key: key.to_string(),
                })
            }
        };
    }
    Ok(())
}

fn merge_into(
    target: &mut Map<String, Value>,
    segment: &str,
    value: Value,
    key: &str,
) -> Result<(), NormalizeError> {
    match (target.get_mut(segment), value) {
        (None, value) => {
            target.insert(segment.to_string(), value);
            Ok(())
        }
        (Some(Value::Object(existing)), Value::Object(incoming)) => {
            for (k, v) in incoming {
                merge_into(existing, &k, v, key)?;
            }
            Ok(())
        }
        _ => Err(NormalizeError::Conflict {
            key: key.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_expand_dotted_keys() {
        let value = json!({
            "owner.github": "team",
            "owner": {"type": "elastic"},
            "list": [{"a.b": 1}],
            "plain": true
        });
        assert_eq!(
            expand_dotted_keys(value).unwrap(),
            json!({
                "owner": {"github": "team", "type": "elastic"},
                "list": [{"a": {"b": 1}}],
                "plain": true
            })
        );
    }

    #[test]
    fn test_conflicting_keys() {
        let value = json!({"a": 1, "a.b": 2});
        assert!(matches!(
            expand_dotted_keys(value),
            Err(NormalizeError::Conflict { .. })
        ));
    }

    #[test]
    fn test_yaml_content() {
        let data = b"---\nname: nginx\nconditions.kibana.version: ^8.0.0\n";
        assert_eq!(
            yaml_content(data, true).unwrap(),
            json!({"name": "nginx", "conditions": {"kibana": {"version": "^8.0.0"}}})
        );
        assert_eq!(
            yaml_content(data, false).unwrap(),
            json!({"name": "nginx", "conditions.kibana.version": "^8.0.0"})
        );
        assert!(yaml_content(b"a: [", false).is_err());
    }

    #[test]
    fn test_json_content() {
        assert_eq!(json_content(br#"{"a": 1}"#).unwrap(), json!({"a": 1}));
        assert!(matches!(json_content(b"{"), Err(NormalizeError::Json(_))));
    }
}
