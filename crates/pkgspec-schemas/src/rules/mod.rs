//! Semantic rules run after structural validation
//!
//! A rule looks at the package as a whole and reports findings the
//! structure of the spec tree can't express. Rules are kept in a
//! [`RuleRegistry`] and selected by spec version and package type.
//!
//! Copyright (c) 2025 Specado Team
//! Licensed under the Apache-2.0 license

pub mod prerelease;
pub mod version_integrity;

pub use prerelease::validate_prerelease;
pub use version_integrity::validate_version_integrity;

use crate::package::{PackageFs, MANIFEST_FILE_NAME};
use crate::validation::error::ValidationErrors;
use crate::versioning::PackageVersion;
use serde::Deserialize;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// A semantic rule over the package filesystem
pub type Rule = Arc<dyn Fn(&PackageFs) -> ValidationErrors + Send + Sync>;

/// A rule and the conditions under which it applies
#[derive(Clone)]
pub struct RuleEntry {
    pub name: &'static str,
    pub rule: Rule,
    /// First spec version the rule applies to.
    pub since: Option<PackageVersion>,
    /// First spec version the rule no longer applies to.
    pub until: Option<PackageVersion>,
    /// Package types the rule applies to, all of them when empty.
    pub types: Vec<String>,
    /// Coded findings are logged instead of reported, unless warnings
    /// are treated as errors.
    pub warning: bool,
}

impl fmt::Debug for RuleEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuleEntry")
            .field("name", &self.name)
            .field("since", &self.since)
            .field("until", &self.until)
            .field("types", &self.types)
            .field("warning", &self.warning)
            .finish()
    }
}

impl RuleEntry {
    pub fn new<F>(name: &'static str, rule: F) -> Self
    where
        F: Fn(&PackageFs) -> ValidationErrors + Send + Sync + 'static,
    {
        Self {
            name,
            rule: Arc::new(rule),
            since: None,
            until: None,
            types: Vec::new(),
            warning: false,
        }
    }

    pub fn since(mut self, version: PackageVersion) -> Self {
        self.since = Some(version);
        self
    }

    pub fn until(mut self, version: PackageVersion) -> Self {
        self.until = Some(version);
        self
    }

    pub fn for_types(mut self, types: &[&str]) -> Self {
        self.types = types.iter().map(|t| t.to_string()).collect();
        self
    }

    /// Report the coded findings of this rule as warnings, see [`warn_on`].
    pub fn as_warning(mut self) -> Self {
        self.warning = true;
        self
    }

    /// Whether the rule applies to packages of `package_type` written
    /// against `spec_version`: `since <= spec_version < until`.
    pub fn applies_to(&self, spec_version: &PackageVersion, package_type: &str) -> bool {
        if self.since.as_ref().is_some_and(|since| spec_version < since) {
            return false;
        }
        if self.until.as_ref().is_some_and(|until| spec_version >= until) {
            return false;
        }
        self.types.is_empty() || self.types.iter().any(|t| t == package_type)
    }
}

/// Ordered list of semantic rules
#[derive(Debug, Clone, Default)]
pub struct RuleRegistry {
    entries: Vec<RuleEntry>,
}

impl RuleRegistry {
    /// An empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the rules shipped with this crate
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.register(RuleEntry::new("version_integrity", validate_version_integrity));
        registry.register(RuleEntry::new("prerelease", validate_prerelease));
        registry
    }

    pub fn register(&mut self, entry: RuleEntry) {
        self.entries.push(entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Rules that apply, in registration order
    pub fn rules_for<'a>(
        &'a self,
        spec_version: &'a PackageVersion,
        package_type: &'a str,
    ) -> impl Iterator<Item = &'a RuleEntry> + 'a {
        self.entries
            .iter()
            .filter(move |entry| entry.applies_to(spec_version, package_type))
    }

    /// Run every applicable rule and merge their findings. Warning rules
    /// report all of their findings when `warnings_as_errors` is set.
    pub fn validate(
        &self,
        spec_version: &PackageVersion,
        package_type: &str,
        fsys: &PackageFs,
        warnings_as_errors: bool,
    ) -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        for entry in self.rules_for(spec_version, package_type) {
            let rule = if entry.warning && !warnings_as_errors {
                warn_on(Arc::clone(&entry.rule))
            } else {
                Arc::clone(&entry.rule)
            };
            let found = rule(fsys);
            debug!(rule = entry.name, errors = found.len(), "Ran semantic rule");
            errors.append(found);
        }
        errors
    }
}

/// Wrap a rule so that its findings carrying a code are logged as
/// warnings. Findings without a code are still reported.
pub fn warn_on(rule: Rule) -> Rule {
    Arc::new(move |fsys: &PackageFs| {
        let (kept, warned) = rule(fsys).collect(|e| e.is_unassigned());
        for error in warned.iter() {
            warn!(code = error.code(), "{}", error.message);
        }
        kept
    })
}

#[derive(Debug, Deserialize)]
struct ManifestVersion {
    #[serde(default)]
    version: Option<serde_yaml::Value>,
}

/// The `version` declared in the package manifest
pub(crate) fn read_manifest_version(fsys: &PackageFs) -> Result<String, String> {
    let data = fsys
        .read_to_string(MANIFEST_FILE_NAME)
        .map_err(|e| format!("can't locate manifest file: {}", e))?;
    let manifest: ManifestVersion =
        serde_yaml::from_str(&data).map_err(|e| format!("can't read manifest version: {}", e))?;
    match manifest.version {
        Some(serde_yaml::Value::String(version)) => Ok(version),
        _ => Err("version is undefined".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::error::StructuredError;
    use std::fs;
    use tempfile::TempDir;

    fn failing(fsys: &PackageFs) -> ValidationErrors {
        let _ = fsys;
        vec![
            StructuredError::new("coded finding", "SVR00002"),
            StructuredError::unassigned("plain finding"),
        ]
        .into()
    }

    #[test]
    fn test_applies_to() {
        let entry = RuleEntry::new("r", failing)
            .since(PackageVersion::new(2, 0, 0))
            .until(PackageVersion::new(3, 0, 0))
            .for_types(&["integration", "input"]);

        assert!(entry.applies_to(&PackageVersion::new(2, 0, 0), "integration"));
        assert!(entry.applies_to(&PackageVersion::new(2, 9, 9), "input"));
        assert!(!entry.applies_to(&PackageVersion::new(1, 9, 0), "integration"));
        assert!(!entry.applies_to(&PackageVersion::new(3, 0, 0), "integration"));
        assert!(!entry.applies_to(&PackageVersion::new(2, 5, 0), "content"));
    }

    #[test]
    fn test_registry_selection() {
        let mut registry = RuleRegistry::new();
        registry.register(RuleEntry::new("always", failing));
        registry.register(RuleEntry::new("new", failing).since(PackageVersion::new(3, 0, 0)));
        registry.register(RuleEntry::new("content", failing).for_types(&["content"]));

        let version = PackageVersion::new(2, 0, 0);
        let names: Vec<_> = registry.rules_for(&version, "integration").map(|e| e.name).collect();
        assert_eq!(names, vec!["always"]);

        let version = PackageVersion::new(3, 1, 0);
        let names: Vec<_> = registry.rules_for(&version, "content").map(|e| e.name).collect();
        assert_eq!(names, vec!["always", "new", "content"]);
    }

    #[test]
    fn test_warn_on_keeps_unassigned_findings() {
        let dir = TempDir::new().unwrap();
        let fsys = PackageFs::new(dir.path());

        let mut registry = RuleRegistry::new();
        registry.register(RuleEntry::new("warned", failing).as_warning());
        let errors = registry.validate(&PackageVersion::new(3, 0, 0), "integration", &fsys, false);

        assert_eq!(errors.len(), 1);
        assert_eq!(errors.errors[0].message, "plain finding");
    }

    #[test]
    fn test_warnings_as_errors_reports_warning_rules() {
        let dir = TempDir::new().unwrap();
        let fsys = PackageFs::new(dir.path());

        let mut registry = RuleRegistry::new();
        registry.register(RuleEntry::new("warned", failing).as_warning());
        registry.register(RuleEntry::new("plain", failing));
        let errors = registry.validate(&PackageVersion::new(3, 0, 0), "integration", &fsys, true);

        let codes: Vec<_> = errors.iter().map(|e| e.code()).collect();
        assert_eq!(codes, vec!["SVR00002", "", "SVR00002", ""]);
    }

    #[test]
    fn test_read_manifest_version() {
        let dir = TempDir::new().unwrap();
        let fsys = PackageFs::new(dir.path());
        assert!(read_manifest_version(&fsys)
            .unwrap_err()
            .starts_with("can't locate manifest file"));

        fs::write(dir.path().join(MANIFEST_FILE_NAME), "name: nginx\n").unwrap();
        assert_eq!(read_manifest_version(&fsys).unwrap_err(), "version is undefined");

        fs::write(dir.path().join(MANIFEST_FILE_NAME), "version: 1.2.3\n").unwrap();
        assert_eq!(read_manifest_version(&fsys).unwrap(), "1.2.3");
    }
}
