//! Spec tree nodes
//!
//! Copyright (c) 2025 Specado Team
//! Licensed under the Apache-2.0 license

use crate::spectypes::content_type::ContentType;
use crate::spectypes::limits::Limits;
use crate::spectypes::schema::FileSchema;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Arc, OnceLock, RwLock};
use tracing::debug;

/// Placeholder substituted with the package name in item patterns.
pub const PACKAGE_NAME_PLACEHOLDER: &str = "{PACKAGE_NAME}";

/// Stand-in package name used to check templated patterns at load time.
const PATTERN_CHECK_NAME: &str = "package";

pub const VISIBILITY_PUBLIC: &str = "public";
pub const VISIBILITY_PRIVATE: &str = "private";

/// Kind of filesystem entry an item describes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemType {
    #[default]
    File,
    Folder,
}

impl fmt::Display for ItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemType::File => write!(f, "file"),
            ItemType::Folder => write!(f, "folder"),
        }
    }
}

/// Expectation for a file or folder inside a package
///
/// Folder items own an ordered list of child items. File items may hold
/// a compiled content schema, attached by the loader when the item
/// references one.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemSpec {
    #[serde(rename = "type")]
    pub item_type: ItemType,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,

    /// Exact entry name.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,

    /// Regular expression for entry names, may contain `{PACKAGE_NAME}`.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub pattern: String,

    #[serde(default, skip_serializing_if = "is_false")]
    pub required: bool,

    /// Reference to a folder spec or a content schema, relative to the
    /// document that declares the item.
    #[serde(rename = "$ref", default, skip_serializing_if = "String::is_empty")]
    pub reference: String,

    /// Either `public` or `private`. Carried in the model, no checks depend on it.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub visibility: String,

    #[serde(default, skip_serializing_if = "is_false")]
    pub additional_contents: bool,

    #[serde(default, skip_serializing_if = "is_false")]
    pub development_folder: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_media_type: Option<ContentType>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub forbidden_patterns: Vec<String>,

    /// `ga`, `beta` or empty.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub release: String,

    #[serde(flatten)]
    pub limits: Limits,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub contents: Vec<ItemSpec>,

    #[serde(skip)]
    pub schema: Option<Arc<dyn FileSchema>>,

    #[serde(skip)]
    pub compiled: CompiledPatterns,
}

/// Regular expressions of an item, compiled when the spec is loaded or on
/// first use. The name pattern is cached per package name.
#[derive(Debug, Default)]
pub struct CompiledPatterns {
    pattern: RwLock<Option<(String, Regex)>>,
    forbidden: OnceLock<(Vec<String>, Vec<Regex>)>,
}

impl Clone for CompiledPatterns {
    fn clone(&self) -> Self {
        let pattern = self
            .pattern
            .read()
            .map(|cached| (*cached).clone())
            .unwrap_or_default();
        Self {
            pattern: RwLock::new(pattern),
            forbidden: self.forbidden.clone(),
        }
    }
}

impl CompiledPatterns {
    fn regex_for(&self, expanded: &str) -> Result<Regex, regex::Error> {
        if let Ok(cached) = self.pattern.read() {
            if let Some((source, regex)) = cached.as_ref() {
                if source == expanded {
                    return Ok(regex.clone());
                }
            }
        }
        let regex = Regex::new(expanded)?;
        if let Ok(mut cached) = self.pattern.write() {
            *cached = Some((expanded.to_string(), regex.clone()));
        }
        Ok(regex)
    }

    fn forbidden_for(&self, patterns: &[String]) -> Result<Vec<Regex>, regex::Error> {
        if let Some((sources, compiled)) = self.forbidden.get() {
            if sources.as_slice() == patterns {
                return Ok(compiled.clone());
            }
        }
        let compiled = patterns
            .iter()
            .map(|p| Regex::new(p))
            .collect::<Result<Vec<_>, _>>()?;
        let _ = self.forbidden.set((patterns.to_vec(), compiled.clone()));
        Ok(compiled)
    }
}

fn is_false(value: &bool) -> bool {
    !*value
}

impl ItemSpec {
    /// File item matched by exact name
    pub fn file(name: impl Into<String>) -> Self {
        Self {
            item_type: ItemType::File,
            name: name.into(),
            ..Default::default()
        }
    }

    /// Folder item matched by exact name
    pub fn folder(name: impl Into<String>) -> Self {
        Self {
            item_type: ItemType::Folder,
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn is_dir(&self) -> bool {
        self.item_type == ItemType::Folder
    }

    /// Whether an entry of the given kind has the type this item expects.
    pub fn is_same_type(&self, entry_is_dir: bool) -> bool {
        self.is_dir() == entry_is_dir
    }

    /// Pattern with the package name placeholder substituted.
    pub fn expanded_pattern(&self, package_name: &str) -> String {
        self.pattern.replace(PACKAGE_NAME_PLACEHOLDER, package_name)
    }

    /// Compile the pattern and the forbidden patterns of this item.
    /// Templated patterns are checked with a stand-in package name.
    pub fn compile_patterns(&self) -> Result<(), regex::Error> {
        if !self.pattern.is_empty() {
            self.compiled.regex_for(&self.expanded_pattern(PATTERN_CHECK_NAME))?;
        }
        self.compiled.forbidden_for(&self.forbidden_patterns)?;
        Ok(())
    }

    /// Whether `entry_name` matches the pattern of this item and none of
    /// its forbidden patterns. Items without a pattern never match, nor do
    /// items whose patterns don't compile.
    pub fn matches_pattern(&self, entry_name: &str, package_name: &str) -> bool {
        if self.pattern.is_empty() {
            return false;
        }
        let compiled = self
            .compiled
            .regex_for(&self.expanded_pattern(package_name))
            .and_then(|pattern| {
                self.compiled
                    .forbidden_for(&self.forbidden_patterns)
                    .map(|forbidden| (pattern, forbidden))
            });
        match compiled {
            Ok((pattern, forbidden)) => {
                pattern.is_match(entry_name) && !forbidden.iter().any(|f| f.is_match(entry_name))
            }
            Err(e) => {
                debug!(pattern = %self.pattern, error = %e, "Item pattern does not compile");
                false
            }
        }
    }

    /// Fill unset fields with their defaults, in the whole subtree.
    pub fn set_default_values(&mut self) {
        if self.visibility.is_empty() {
            self.visibility = VISIBILITY_PUBLIC.to_string();
        }
        for content in &mut self.contents {
            content.set_default_values();
        }
    }

    /// Let every descendant inherit the limits it leaves unset.
    pub fn propagate_content_limits(&mut self) {
        let limits = self.limits;
        for content in &mut self.contents {
            content.limits.inherit_from(&limits);
            content.propagate_content_limits();
        }
    }

    /// Walk this item and all its descendants, parents first.
    pub fn walk<'a>(&'a self, visit: &mut dyn FnMut(&'a ItemSpec)) {
        visit(self);
        for child in &self.contents {
            child.walk(visit);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spectypes::filesize::FileSize;

    #[test]
    fn test_deserialize_item() {
        let yaml = r#"
type: folder
name: data_stream
required: true
additionalContents: false
totalContentsLimit: 10
sizeLimit: 5MB
contents:
  - type: file
    pattern: '^{PACKAGE_NAME}-.+\.yml$'
    forbiddenPatterns: ['^{PACKAGE_NAME}-internal']
    contentMediaType: "application/x-yaml; require-document-dashes=true"
    $ref: "./manifest.spec.yml"
"#;
        let value: serde_json::Value = serde_yaml::from_str(yaml).unwrap();
        let item: ItemSpec = serde_json::from_value(value).unwrap();

        assert!(item.is_dir());
        assert!(item.required);
        assert_eq!(item.limits.total_contents_limit, 10);
        assert_eq!(item.limits.size_limit, FileSize::megabytes(5));
        assert_eq!(item.contents.len(), 1);

        let child = &item.contents[0];
        assert_eq!(child.item_type, ItemType::File);
        assert_eq!(child.reference, "./manifest.spec.yml");
        assert!(child.content_media_type.as_ref().unwrap().requires_document_dashes());
    }

    #[test]
    fn test_pattern_matching() {
        let item = ItemSpec {
            pattern: r"^{PACKAGE_NAME}-.+\.yml$".to_string(),
            forbidden_patterns: vec!["-internal".to_string()],
            ..ItemSpec::file("")
        };

        assert!(item.matches_pattern("nginx-access.yml", "nginx"));
        assert!(!item.matches_pattern("apache-access.yml", "nginx"));
        assert!(!item.matches_pattern("nginx-internal.yml", "nginx"));
        assert!(!ItemSpec::file("a").matches_pattern("a", "pkg"));

        // The cached pattern follows the package name.
        assert!(item.matches_pattern("apache-access.yml", "apache"));
        assert!(!item.matches_pattern("nginx-access.yml", "apache"));

        let broken = ItemSpec {
            pattern: "(".to_string(),
            ..ItemSpec::file("")
        };
        assert!(!broken.matches_pattern("x", "pkg"));
    }

    #[test]
    fn test_compile_patterns() {
        let item = ItemSpec {
            pattern: r"^{PACKAGE_NAME}-.+\.yml$".to_string(),
            forbidden_patterns: vec!["-internal".to_string()],
            ..ItemSpec::file("")
        };
        item.compile_patterns().unwrap();
        assert!(item.clone().matches_pattern("nginx-access.yml", "nginx"));

        let broken = ItemSpec {
            pattern: "^([a-z+$".to_string(),
            ..ItemSpec::file("")
        };
        assert!(broken.compile_patterns().is_err());

        let broken_forbidden = ItemSpec {
            pattern: ".*".to_string(),
            forbidden_patterns: vec!["[".to_string()],
            ..ItemSpec::file("")
        };
        assert!(broken_forbidden.compile_patterns().is_err());

        let mut changed = ItemSpec {
            pattern: ".*".to_string(),
            forbidden_patterns: vec!["^_".to_string()],
            ..ItemSpec::file("")
        };
        assert!(!changed.matches_pattern("_x", "pkg"));
        changed.forbidden_patterns = vec!["^-".to_string()];
        assert!(changed.matches_pattern("_x", "pkg"));
    }

    #[test]
    fn test_defaults_and_limit_propagation() {
        let mut root = ItemSpec::folder("");
        root.limits.size_limit = FileSize::megabytes(1);
        root.limits.total_contents_limit = 5;

        let mut docs = ItemSpec::folder("docs");
        docs.limits.size_limit = FileSize::kilobytes(10);
        docs.visibility = VISIBILITY_PRIVATE.to_string();
        docs.contents.push(ItemSpec::file("README.md"));
        root.contents.push(docs);
        root.contents.push(ItemSpec::file("manifest.yml"));

        root.set_default_values();
        root.propagate_content_limits();

        let docs = &root.contents[0];
        assert_eq!(docs.visibility, VISIBILITY_PRIVATE);
        assert_eq!(docs.limits.size_limit, FileSize::kilobytes(10));
        assert_eq!(docs.limits.total_contents_limit, 5);
        assert_eq!(docs.contents[0].limits.size_limit, FileSize::kilobytes(10));
        assert_eq!(docs.contents[0].visibility, VISIBILITY_PUBLIC);
        assert_eq!(root.contents[1].limits.size_limit, FileSize::megabytes(1));
    }

    #[test]
    fn test_unknown_type_is_rejected() {
        let value = serde_json::json!({"type": "symlink", "name": "x"});
        assert!(serde_json::from_value::<ItemSpec>(value).is_err());
    }
}
