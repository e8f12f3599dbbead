//! Self-contained content schemas
//!
//! Content schemas may point into other schema documents. Every document
//! reached that way is version-patched, stored once under `$defs` of the
//! root schema, and the references are rewritten to point there.
//!
//! Copyright (c) 2025 Specado Team
//! Licensed under the Apache-2.0 license

use crate::loader::error::{LoaderError, LoaderResult};
use crate::loader::parser::{SpecDocument, SpecParser};
use crate::loader::resolver::{normalize_path, resolve_relative, split_reference};
use crate::versioning::{resolve_patch, PackageVersion};
use serde_json::{Map, Value};
use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use tracing::debug;

const DEFS_KEYWORD: &str = "$defs";
const BUNDLE_KEY_PREFIX: &str = "__ext_";

/// Load a schema document and resolve its version patches.
///
/// Documents with a `spec` key use the patch envelope, any other document
/// is taken as a plain schema.
pub fn load_schema_document(
    parser: &SpecParser,
    path: &Path,
    version: &PackageVersion,
) -> LoaderResult<Value> {
    let value = parser.parse_file(path)?;
    let is_envelope = value.as_object().is_some_and(|o| o.contains_key("spec"));
    if !is_envelope {
        return Ok(value);
    }

    let document: SpecDocument =
        serde_json::from_value(value).map_err(|e| LoaderError::json_parse_error(path.to_path_buf(), e))?;
    let resolved = resolve_patch(&document.spec, version, &document.versions)
        .map_err(|e| LoaderError::patch_error(path.to_path_buf(), e))?;
    Ok(resolved.into_owned())
}

/// Load the schema at `root_path` with all the documents it references
pub fn bundle_schema(
    parser: &SpecParser,
    root_path: &Path,
    version: &PackageVersion,
) -> LoaderResult<Value> {
    let root_path = normalize_path(root_path);
    let mut root = load_schema_document(parser, &root_path, version)?;

    let mut bundler = Bundler::new(root_path.clone());
    bundler.rewrite(&mut root, &root_path, None)?;

    let mut bundled = Map::new();
    while let Some((path, key)) = bundler.pending.pop_front() {
        debug!(path = %path.display(), key = %key, "Bundling referenced schema");
        let mut document = load_schema_document(parser, &path, version)?;
        if let Value::Object(fields) = &mut document {
            fields.remove("$schema");
            fields.remove("$id");
        }
        bundler.rewrite(&mut document, &path, Some(&key))?;
        bundled.insert(key, document);
    }

    if bundled.is_empty() {
        return Ok(root);
    }

    let Value::Object(fields) = &mut root else {
        return Err(LoaderError::schema_error(
            root_path,
            "schema with references must be an object",
        ));
    };
    match fields
        .entry(DEFS_KEYWORD.to_string())
        .or_insert_with(|| Value::Object(Map::new()))
    {
        Value::Object(defs) => defs.extend(bundled),
        _ => {
            return Err(LoaderError::schema_error(
                root_path,
                format!("{} must be an object", DEFS_KEYWORD),
            ))
        }
    }
    Ok(root)
}

struct Bundler {
    /// Bundle key of every known document, `None` for the root.
    keys: HashMap<PathBuf, Option<String>>,
    pending: VecDeque<(PathBuf, String)>,
}

impl Bundler {
    fn new(root_path: PathBuf) -> Self {
        let mut keys = HashMap::new();
        keys.insert(root_path, None);
        Self {
            keys,
            pending: VecDeque::new(),
        }
    }

    fn key_for(&mut self, path: PathBuf) -> Option<String> {
        if let Some(key) = self.keys.get(&path) {
            return key.clone();
        }
        let key = format!("{}{}", BUNDLE_KEY_PREFIX, self.keys.len() - 1);
        self.keys.insert(path.clone(), Some(key.clone()));
        self.pending.push_back((path, key.clone()));
        Some(key)
    }

    /// Rewrite the references of a document stored under `own_key`.
    fn rewrite(&mut self, value: &mut Value, doc_path: &Path, own_key: Option<&str>) -> LoaderResult<()> {
        match value {
            Value::Object(fields) => {
                if let Some(Value::String(reference)) = fields.get_mut("$ref") {
                    if let Some(rewritten) = self.rewrite_reference(reference, doc_path, own_key)? {
                        *reference = rewritten;
                    }
                }
                for (key, child) in fields.iter_mut() {
                    if key != "$ref" {
                        self.rewrite(child, doc_path, own_key)?;
                    }
                }
            }
            Value::Array(items) => {
                for item in items {
                    self.rewrite(item, doc_path, own_key)?;
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn rewrite_reference(
        &mut self,
        reference: &str,
        doc_path: &Path,
        own_key: Option<&str>,
    ) -> LoaderResult<Option<String>> {
        let (file, pointer) = split_reference(reference);
        if file.contains("://") {
            return Ok(None);
        }
        if !pointer.is_empty() && !pointer.starts_with('/') {
            if file.is_empty() && own_key.is_none() {
                return Ok(None);
            }
            return Err(LoaderError::reference_error(
                reference.to_string(),
                doc_path.to_path_buf(),
                "anchors in referenced documents are not supported".to_string(),
            ));
        }

        let key = if file.is_empty() {
            match own_key {
                Some(key) => Some(key.to_string()),
                None => return Ok(None),
            }
        } else {
            self.key_for(resolve_relative(doc_path, file))
        };

        Ok(Some(match key {
            Some(key) => format!("#/{}/{}{}", DEFS_KEYWORD, key, pointer),
            None => format!("#{}", pointer),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    fn version(v: &str) -> PackageVersion {
        PackageVersion::parse(v).unwrap()
    }

    #[test]
    fn test_plain_schema_is_unchanged() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("schema.json");
        fs::write(&path, r##"{"type": "object", "properties": {"a": {"$ref": "#/definitions/a"}}}"##).unwrap();

        let bundled = bundle_schema(&SpecParser::new(), &path, &version("3.0.0")).unwrap();
        assert_eq!(bundled["properties"]["a"]["$ref"], "#/definitions/a");
        assert!(bundled.get("$defs").is_none());
    }

    #[test]
    fn test_external_references_are_bundled() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("common")).unwrap();
        fs::write(
            dir.path().join("manifest.spec.yml"),
            r##"
spec:
  type: object
  properties:
    owner:
      $ref: "./common/defs.spec.yml#/definitions/owner"
    again:
      $ref: "./common/defs.spec.yml"
"##,
        )
        .unwrap();
        fs::write(
            dir.path().join("common/defs.spec.yml"),
            r##"
spec:
  $id: "https://example.com/defs"
  definitions:
    owner:
      type: object
      properties:
        github:
          $ref: "#/definitions/team"
        back:
          $ref: "../manifest.spec.yml#/properties"
    team:
      type: string
versions:
  - before: 2.0.0
    patch:
      - op: replace
        path: /definitions/team/type
        value: integer
"##,
        )
        .unwrap();

        let parser = SpecParser::new();
        let path = dir.path().join("manifest.spec.yml");
        let bundled = bundle_schema(&parser, &path, &version("3.0.0")).unwrap();

        assert_eq!(
            bundled["properties"]["owner"]["$ref"],
            "#/$defs/__ext_0/definitions/owner"
        );
        assert_eq!(bundled["properties"]["again"]["$ref"], "#/$defs/__ext_0");

        let defs = &bundled["$defs"]["__ext_0"];
        assert!(defs.get("$id").is_none());
        assert_eq!(
            defs["definitions"]["owner"]["properties"]["github"]["$ref"],
            "#/$defs/__ext_0/definitions/team"
        );
        assert_eq!(
            defs["definitions"]["owner"]["properties"]["back"]["$ref"],
            "#/properties"
        );
        assert_eq!(defs["definitions"]["team"], json!({"type": "string"}));

        let old = bundle_schema(&parser, &path, &version("1.0.0")).unwrap();
        assert_eq!(old["$defs"]["__ext_0"]["definitions"]["team"]["type"], "integer");
    }

    #[test]
    fn test_missing_referenced_document() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("schema.yml");
        fs::write(&path, "spec:\n  $ref: ./missing.yml\n").unwrap();
        assert!(bundle_schema(&SpecParser::new(), &path, &version("3.0.0")).is_err());
    }
}
