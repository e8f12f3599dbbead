//! Spec tree loading
//!
//! A folder spec document holds an inline node and its version patches.
//! Child items are resolved breadth first: folder references are loaded
//! and spliced in, file references get a compiled content schema, and
//! inline folders have their own children queued.
//!
//! Copyright (c) 2025 Specado Team
//! Licensed under the Apache-2.0 license

use crate::loader::error::{LoaderError, LoaderResult};
use crate::loader::parser::SpecParser;
use crate::loader::resolver::{normalize_path, resolve_relative, ResolverContext};
use crate::spectypes::item::{ItemSpec, ItemType, VISIBILITY_PRIVATE, VISIBILITY_PUBLIC};
use crate::spectypes::schema::{FileSchemaLoadOptions, FileSchemaLoader};
use crate::versioning::{resolve_patch, PackageVersion};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// File name of the root spec of every package type.
pub const ROOT_SPEC_FILE_NAME: &str = "spec.yml";

/// Loads spec trees for one target version
pub struct FolderSpecLoader {
    parser: SpecParser,
    file_schema_loader: Option<Arc<dyn FileSchemaLoader>>,
    spec_version: PackageVersion,
}

impl std::fmt::Debug for FolderSpecLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FolderSpecLoader")
            .field("spec_version", &self.spec_version)
            .field("loads_file_schemas", &self.file_schema_loader.is_some())
            .finish()
    }
}

impl FolderSpecLoader {
    /// Create a loader. Without a file schema loader, file references are
    /// kept in the tree but no content schema is attached.
    pub fn new(file_schema_loader: Option<Arc<dyn FileSchemaLoader>>, spec_version: PackageVersion) -> Self {
        Self {
            parser: SpecParser::new(),
            file_schema_loader,
            spec_version,
        }
    }

    pub fn spec_version(&self) -> &PackageVersion {
        &self.spec_version
    }

    /// Load the folder spec document at `spec_path` and everything it references
    pub fn load(&self, spec_path: &Path) -> LoaderResult<ItemSpec> {
        let mut context = ResolverContext::new();
        let mut root = self.load_folder_spec(Map::new(), spec_path, &mut context, false)?;
        root.set_default_values();
        root.propagate_content_limits();
        debug!(path = %spec_path.display(), version = %self.spec_version, "Loaded spec tree");
        Ok(root)
    }

    /// Load the root spec of a package type from a spec directory
    pub fn load_package_type(&self, spec_dir: &Path, package_type: &str) -> LoaderResult<ItemSpec> {
        let spec_path = spec_dir.join(package_type).join(ROOT_SPEC_FILE_NAME);
        if package_type.is_empty() || package_type.contains(['/', '\\']) || !spec_path.is_file() {
            return Err(LoaderError::UnsupportedPackageType {
                package_type: package_type.to_string(),
            });
        }
        self.load(&spec_path)
    }

    fn load_folder_spec(
        &self,
        base: Map<String, Value>,
        spec_path: &Path,
        context: &mut ResolverContext,
        inherited_development: bool,
    ) -> LoaderResult<ItemSpec> {
        let spec_path = normalize_path(spec_path);
        context.push_path(spec_path.clone())?;
        debug!(path = %spec_path.display(), "Reading folder spec");

        let document = self.parser.parse_document(&spec_path)?;
        let node = overlay(base, document.spec, &spec_path)?;

        let resolved = resolve_patch(&node, &self.spec_version, &document.versions)
            .map_err(|e| LoaderError::patch_error(spec_path.clone(), e))?;
        let mut item = ItemSpec::deserialize(resolved.as_ref())
            .map_err(|e| LoaderError::invalid_spec(spec_path.clone(), e.to_string()))?;

        if inherited_development {
            item.development_folder = true;
        }
        self.load_contents(&mut item, &spec_path, context)?;

        context.pop_path();
        Ok(item)
    }

    fn load_contents(
        &self,
        folder: &mut ItemSpec,
        spec_path: &Path,
        context: &mut ResolverContext,
    ) -> LoaderResult<()> {
        let development = folder.development_folder;
        let mut pending: VecDeque<(&mut ItemSpec, bool)> =
            folder.contents.iter_mut().map(|content| (content, development)).collect();

        while let Some((content, parent_development)) = pending.pop_front() {
            check_item(content, spec_path)?;

            if parent_development {
                content.development_folder = true;
            }

            if !content.reference.is_empty() {
                let target = resolve_relative(spec_path, &content.reference);
                match content.item_type {
                    ItemType::File => {
                        let Some(loader) = &self.file_schema_loader else {
                            continue;
                        };
                        let options = FileSchemaLoadOptions {
                            content_type: content.content_media_type.clone(),
                            spec_version: self.spec_version.clone(),
                        };
                        content.schema = Some(loader.load(&target, &options)?);
                    }
                    ItemType::Folder => {
                        let base = referencing_fields(content, spec_path)?;
                        let development = content.development_folder;
                        *content = self.load_folder_spec(base, &target, context, development)?;
                        check_item(content, spec_path)?;
                    }
                }
            } else if !content.contents.is_empty() {
                let development = content.development_folder;
                pending.extend(content.contents.iter_mut().map(|child| (child, development)));
            }
        }

        Ok(())
    }
}

/// Reject items the validator could not interpret.
fn check_item(item: &ItemSpec, spec_path: &Path) -> LoaderResult<()> {
    let visibility = item.visibility.as_str();
    if !visibility.is_empty() && visibility != VISIBILITY_PUBLIC && visibility != VISIBILITY_PRIVATE {
        return Err(LoaderError::invalid_spec(
            spec_path.to_path_buf(),
            format!(
                "item [{}] visibility is expected to be private or public, not [{}]",
                item_display_path(spec_path, &item.name).display(),
                visibility
            ),
        ));
    }

    if !item.name.is_empty() && !item.pattern.is_empty() {
        return Err(LoaderError::invalid_spec(
            spec_path.to_path_buf(),
            format!(
                "item [{}] defines both a name and a pattern ({})",
                item.name, item.pattern
            ),
        ));
    }

    if item.required && item.name.is_empty() && item.pattern.is_empty() {
        return Err(LoaderError::invalid_spec(
            spec_path.to_path_buf(),
            "required item defines neither a name nor a pattern",
        ));
    }

    item.compile_patterns().map_err(|e| {
        LoaderError::invalid_spec(
            spec_path.to_path_buf(),
            format!("item with pattern [{}] has an invalid regular expression: {}", item.pattern, e),
        )
    })
}

fn item_display_path(spec_path: &Path, name: &str) -> PathBuf {
    spec_path.join(name)
}

/// Fields of a referencing item that survive when the reference is spliced in.
fn referencing_fields(item: &ItemSpec, spec_path: &Path) -> LoaderResult<Map<String, Value>> {
    match serde_json::to_value(item) {
        Ok(Value::Object(mut fields)) => {
            fields.remove("$ref");
            Ok(fields)
        }
        Ok(_) => Err(LoaderError::invalid_spec(spec_path.to_path_buf(), "item is not an object")),
        Err(e) => Err(LoaderError::invalid_spec(spec_path.to_path_buf(), e.to_string())),
    }
}

/// Overlay the inline node of a document on the fields of the item referencing it.
fn overlay(mut base: Map<String, Value>, spec: Value, spec_path: &Path) -> LoaderResult<Value> {
    match spec {
        Value::Object(fields) => {
            base.extend(fields);
            Ok(Value::Object(base))
        }
        Value::Null if !base.is_empty() => Ok(Value::Object(base)),
        _ => Err(LoaderError::invalid_spec(
            spec_path.to_path_buf(),
            "document has no spec node",
        )),
    }
}
