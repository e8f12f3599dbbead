//! Spec document parsing for YAML and JSON dialects
//!
//! Copyright (c) 2025 Specado Team
//! Licensed under the Apache-2.0 license

use crate::loader::error::{LoaderError, LoaderResult};
use crate::versioning::VersionPatch;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::path::Path;

/// Supported spec document dialects
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// YAML format (.yaml, .yml)
    Yaml,
    /// JSON format (.json)
    Json,
}

impl Format {
    /// Detect the dialect from the file extension
    pub fn from_path(path: &Path) -> LoaderResult<Self> {
        match path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_lowercase())
            .as_deref()
        {
            Some("yaml") | Some("yml") => Ok(Format::Yaml),
            Some("json") => Ok(Format::Json),
            _ => Err(LoaderError::unsupported_format(path.to_path_buf())),
        }
    }
}

/// A spec document: an inline node plus the patches that adapt it to
/// older versions
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SpecDocument {
    #[serde(default)]
    pub spec: Value,
    #[serde(default)]
    pub versions: Vec<VersionPatch>,
}

/// Parser turning either dialect into the same JSON tree
#[derive(Debug, Default)]
pub struct SpecParser;

impl SpecParser {
    pub fn new() -> Self {
        Self
    }

    /// Parse a file, detecting the dialect from its extension
    pub fn parse_file(&self, path: &Path) -> LoaderResult<Value> {
        let format = Format::from_path(path)?;
        let content =
            std::fs::read_to_string(path).map_err(|e| LoaderError::io_error(path.to_path_buf(), e))?;
        if content.trim().is_empty() {
            return Err(LoaderError::invalid_spec(path.to_path_buf(), "spec file is empty"));
        }
        self.parse_content(&content, format, path)
    }

    /// Parse a file into the document envelope
    pub fn parse_document(&self, path: &Path) -> LoaderResult<SpecDocument> {
        let value = self.parse_file(path)?;
        serde_json::from_value(value).map_err(|e| LoaderError::json_parse_error(path.to_path_buf(), e))
    }

    pub fn parse_content(&self, content: &str, format: Format, path: &Path) -> LoaderResult<Value> {
        match format {
            Format::Yaml => self.parse_yaml(content, path),
            Format::Json => self.parse_json(content, path),
        }
    }

    pub fn parse_yaml(&self, content: &str, path: &Path) -> LoaderResult<Value> {
        let yaml_value: serde_yaml::Value = serde_yaml::from_str(content)
            .map_err(|e| LoaderError::yaml_parse_error(path.to_path_buf(), e))?;
        Ok(yaml_to_json(yaml_value))
    }

    pub fn parse_json(&self, content: &str, path: &Path) -> LoaderResult<Value> {
        serde_json::from_str(content).map_err(|e| LoaderError::json_parse_error(path.to_path_buf(), e))
    }
}

/// Convert a YAML tree into a JSON tree.
///
/// Non-string keys are stringified, tags are dropped and non-finite
/// floats become null.
pub fn yaml_to_json(value: serde_yaml::Value) -> Value {
    match value {
        serde_yaml::Value::Null => Value::Null,
        serde_yaml::Value::Bool(b) => Value::Bool(b),
        serde_yaml::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::from(i)
            } else if let Some(u) = n.as_u64() {
                Value::from(u)
            } else {
                n.as_f64()
                    .and_then(serde_json::Number::from_f64)
                    .map(Value::Number)
                    .unwrap_or(Value::Null)
            }
        }
        serde_yaml::Value::String(s) => Value::String(s),
        serde_yaml::Value::Sequence(seq) => Value::Array(seq.into_iter().map(yaml_to_json).collect()),
        serde_yaml::Value::Mapping(mapping) => {
            let mut object = Map::new();
            for (key, value) in mapping {
                object.insert(yaml_key_to_string(key), yaml_to_json(value));
            }
            Value::Object(object)
        }
        serde_yaml::Value::Tagged(tagged) => yaml_to_json(tagged.value),
    }
}

fn yaml_key_to_string(key: serde_yaml::Value) -> String {
    match key {
        serde_yaml::Value::String(s) => s,
        serde_yaml::Value::Null => "null".to_string(),
        serde_yaml::Value::Bool(b) => b.to_string(),
        serde_yaml::Value::Number(n) => n.to_string(),
        other => match yaml_to_json(other) {
            Value::String(s) => s,
            json => json.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_format_detection() {
        assert_eq!(Format::from_path(Path::new("spec.yml")).unwrap(), Format::Yaml);
        assert_eq!(Format::from_path(Path::new("spec.YAML")).unwrap(), Format::Yaml);
        assert_eq!(Format::from_path(Path::new("spec.json")).unwrap(), Format::Json);
        assert!(matches!(
            Format::from_path(Path::new("spec.toml")),
            Err(LoaderError::UnsupportedFormat { .. })
        ));
        assert!(Format::from_path(Path::new("spec")).is_err());
    }

    #[test]
    fn test_both_dialects_parse_to_same_document() -> LoaderResult<()> {
        let dir = TempDir::new().unwrap();
        let yaml_path = dir.path().join("spec.yml");
        let json_path = dir.path().join("spec.json");
        fs::write(
            &yaml_path,
            "spec:\n  type: folder\n  contents:\n    - type: file\n      name: manifest.yml\nversions:\n  - before: 2.0.0\n    patch: []\n",
        )
        .unwrap();
        fs::write(
            &json_path,
            r#"{"spec": {"type": "folder", "contents": [{"type": "file", "name": "manifest.yml"}]}, "versions": [{"before": "2.0.0", "patch": []}]}"#,
        )
        .unwrap();

        let parser = SpecParser::new();
        let from_yaml = parser.parse_document(&yaml_path)?;
        let from_json = parser.parse_document(&json_path)?;
        assert_eq!(from_yaml.spec, from_json.spec);
        assert_eq!(from_yaml.versions, from_json.versions);
        Ok(())
    }

    #[test]
    fn test_empty_file_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("empty.yml");
        fs::write(&path, "\n").unwrap();
        assert!(matches!(
            SpecParser::new().parse_file(&path),
            Err(LoaderError::InvalidSpec { .. })
        ));
    }

    #[test]
    fn test_yaml_keys_are_stringified() {
        let yaml: serde_yaml::Value = serde_yaml::from_str("1: one\ntrue: yes\nnested:\n  - !custom 3\n").unwrap();
        assert_eq!(
            yaml_to_json(yaml),
            json!({"1": "one", "true": "yes", "nested": [3]})
        );
    }
}
