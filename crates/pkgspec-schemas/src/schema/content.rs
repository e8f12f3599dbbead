//! Content schema validation of package files
//!
//! Copyright (c) 2025 Specado Team
//! Licensed under the Apache-2.0 license

use crate::loader::error::{LoaderError, LoaderResult};
use crate::loader::parser::SpecParser;
use crate::package::fspath::parent;
use crate::package::PackageFs;
use crate::schema::bundle::bundle_schema;
use crate::schema::formats::{
    data_stream_name_checker, relative_path_checker, DATA_STREAM_NAME_FORMAT, RELATIVE_PATH_FORMAT,
};
use crate::schema::normalize::{json_content, yaml_content};
use crate::spectypes::filesize::FileSize;
use crate::spectypes::limits::Limits;
use crate::spectypes::schema::{FileSchema, FileSchemaLoadOptions, FileSchemaLoader};
use crate::validation::error::{StructuredError, ValidationErrors};
use crate::versioning::PackageVersion;
use jsonschema::error::ValidationErrorKind;
use jsonschema::Validator;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// Spec versions below this one expand dotted keys in YAML content.
const DOTTED_KEYS_UNTIL: PackageVersion = PackageVersion {
    major: 3,
    minor: 0,
    patch: 0,
    pre_release: None,
    build_metadata: None,
};

/// Loads and bundles content schemas from spec documents
#[derive(Debug, Default)]
pub struct ContentSchemaLoader {
    parser: SpecParser,
}

impl ContentSchemaLoader {
    pub fn new() -> Self {
        Self::default()
    }
}

impl FileSchemaLoader for ContentSchemaLoader {
    fn load(&self, schema_path: &Path, options: &FileSchemaLoadOptions) -> LoaderResult<Arc<dyn FileSchema>> {
        let schema = bundle_schema(&self.parser, schema_path, &options.spec_version)?;

        let validator = build_validator(&schema, PackageFs::new("."), ".", FileSize::default())
            .map_err(|reason| LoaderError::schema_error(schema_path.to_path_buf(), reason))?;
        // Package formats depend on the validated file, those schemas are rebuilt per file.
        let compiled = (!uses_package_formats(&schema)).then(|| Arc::new(validator));

        debug!(
            path = %schema_path.display(),
            reusable = compiled.is_some(),
            "Compiled content schema"
        );
        Ok(Arc::new(ContentSchema {
            schema,
            path: schema_path.to_path_buf(),
            options: options.clone(),
            compiled,
        }))
    }
}

/// A compiled content schema
#[derive(Clone)]
pub struct ContentSchema {
    schema: Value,
    path: PathBuf,
    options: FileSchemaLoadOptions,
    /// Validator shared by every file, absent when the schema uses
    /// package formats.
    compiled: Option<Arc<Validator>>,
}

impl std::fmt::Debug for ContentSchema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContentSchema")
            .field("path", &self.path)
            .field("options", &self.options)
            .field("reusable", &self.compiled.is_some())
            .finish()
    }
}

impl ContentSchema {
    pub fn schema(&self) -> &Value {
        &self.schema
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn decode(&self, file_path: &str, data: &[u8]) -> Result<Value, String> {
        let is_yaml = match &self.options.content_type {
            Some(content_type) => content_type.is_yaml(),
            None => file_path.ends_with(".yml") || file_path.ends_with(".yaml"),
        };
        let decoded = if is_yaml {
            yaml_content(data, self.options.spec_version < DOTTED_KEYS_UNTIL)
        } else {
            json_content(data)
        };
        decoded.map_err(|e| e.to_string())
    }
}

impl FileSchema for ContentSchema {
    fn validate(&self, fsys: &PackageFs, path: &str, limits: &Limits) -> ValidationErrors {
        let data = match fsys.read(path) {
            Ok(data) => data,
            Err(e) => return StructuredError::unassigned(format!("reading item file failed: {}", e)).into(),
        };
        let instance = match self.decode(path, &data) {
            Ok(instance) => instance,
            Err(reason) => return StructuredError::unassigned(reason).into(),
        };

        let per_file;
        let validator: &Validator = match &self.compiled {
            Some(validator) => validator,
            None => {
                per_file = match build_validator(
                    &self.schema,
                    fsys.clone(),
                    parent(path),
                    limits.relative_path_size_limit,
                ) {
                    Ok(validator) => validator,
                    Err(reason) => return StructuredError::unassigned(reason).into(),
                };
                &per_file
            }
        };

        validator
            .iter_errors(&instance)
            .map(|error| {
                let field = field_name(&error.instance_path.to_string());
                let description = match &error.kind {
                    ValidationErrorKind::Format { format } => adjust_format_description(format)
                        .map(str::to_string)
                        .unwrap_or_else(|| error.to_string()),
                    _ => error.to_string(),
                };
                StructuredError::unassigned(format!("field {}: {}", field, description))
            })
            .collect()
    }
}

fn build_validator(
    schema: &Value,
    fsys: PackageFs,
    current_dir: &str,
    relative_path_limit: FileSize,
) -> Result<Validator, String> {
    jsonschema::options()
        .should_validate_formats(true)
        .with_format(
            RELATIVE_PATH_FORMAT,
            relative_path_checker(fsys.clone(), current_dir.to_string(), relative_path_limit),
        )
        .with_format(
            DATA_STREAM_NAME_FORMAT,
            data_stream_name_checker(fsys, current_dir.to_string()),
        )
        .build(schema)
        .map_err(|e| format!("failed to compile schema: {}", e))
}

/// Whether any subschema declares one of the formats reading the package.
fn uses_package_formats(schema: &Value) -> bool {
    match schema {
        Value::Object(fields) => fields.iter().any(|(key, value)| match value {
            Value::String(format) if key == "format" => {
                format == RELATIVE_PATH_FORMAT || format == DATA_STREAM_NAME_FORMAT
            }
            other => uses_package_formats(other),
        }),
        Value::Array(items) => items.iter().any(uses_package_formats),
        _ => false,
    }
}

/// Dotted field name of a JSON pointer, `(root)` for the document itself.
fn field_name(pointer: &str) -> String {
    if pointer.is_empty() || pointer == "/" {
        return "(root)".to_string();
    }
    pointer
        .trim_start_matches('/')
        .split('/')
        .map(|segment| segment.replace("~1", "/").replace("~0", "~"))
        .collect::<Vec<_>>()
        .join(".")
}

fn adjust_format_description(format: &str) -> Option<&'static str> {
    match format {
        RELATIVE_PATH_FORMAT => {
            Some("relative path is invalid, target doesn't exist or it exceeds the file size limit")
        }
        DATA_STREAM_NAME_FORMAT => Some("data stream doesn't exist"),
        _ => None,
    }
}
