//! Validation of packages against a specification directory
//!
//! A specification directory holds one root spec per package type
//! (`<type>/spec.yml`) and, optionally, a `changelog.yml` listing the
//! released spec versions.
//!
//! Copyright (c) 2025 Specado Team
//! Licensed under the Apache-2.0 license

use crate::loader::error::{LoaderError, LoaderResult};
use crate::loader::spec_loader::FolderSpecLoader;
use crate::package::{Package, MANIFEST_FILE_NAME};
use crate::rules::RuleRegistry;
use crate::schema::ContentSchemaLoader;
use crate::spectypes::item::ItemSpec;
use crate::validation::error::{StructuredError, ValidationErrors, CODE_NON_GA_SPEC_ON_GA_PACKAGE};
use crate::validation::folder::FolderValidator;
use crate::versioning::PackageVersion;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Changelog of the specification itself.
pub const SPEC_CHANGELOG_FILE_NAME: &str = "changelog.yml";

/// Environment variable turning warnings into reported errors.
pub const WARNINGS_AS_ERRORS_ENV: &str = "PACKAGE_SPEC_WARNINGS_AS_ERRORS";

/// First spec version reporting GA packages built on unreleased specs.
const GA_SPEC_CHECK_VERSION: PackageVersion = PackageVersion {
    major: 3,
    minor: 0,
    patch: 1,
    pre_release: None,
    build_metadata: None,
};

#[derive(Debug, Deserialize)]
struct SpecChangelogEntry {
    version: String,
}

/// A specification bound to the version requested by packages
#[derive(Debug, Clone)]
pub struct Spec {
    spec_dir: PathBuf,
    /// Version requested by the package, without prerelease tags.
    version: PackageVersion,
    /// Version of the spec actually loaded, may be a prerelease.
    spec_version: PackageVersion,
    rules: RuleRegistry,
    warnings_as_errors: bool,
}

impl Spec {
    /// Bind the specification in `spec_dir` to `version`.
    ///
    /// When the directory has a changelog, `version` must match one of
    /// its entries, prerelease tags aside. Warnings are treated as errors
    /// when [`WARNINGS_AS_ERRORS_ENV`] holds a true boolean.
    pub fn new<P: Into<PathBuf>>(spec_dir: P, version: PackageVersion) -> LoaderResult<Self> {
        let spec_dir = spec_dir.into();
        let spec_version = find_spec_version(&spec_dir, &version)?;

        if version < GA_SPEC_CHECK_VERSION && spec_version.is_pre_release() {
            warn!(spec_version = %spec_version, "Package using an unreleased version of the spec");
        }

        Ok(Self {
            spec_dir,
            version,
            spec_version,
            rules: RuleRegistry::builtin(),
            warnings_as_errors: warnings_as_errors_from_env(),
        })
    }

    /// Report warnings as errors, overriding the environment
    pub fn with_warnings_as_errors(mut self, enabled: bool) -> Self {
        self.warnings_as_errors = enabled;
        self
    }

    pub fn warnings_as_errors(&self) -> bool {
        self.warnings_as_errors
    }

    /// Replace the semantic rules run after structural validation
    pub fn with_rules(mut self, rules: RuleRegistry) -> Self {
        self.rules = rules;
        self
    }

    pub fn spec_dir(&self) -> &Path {
        &self.spec_dir
    }

    pub fn version(&self) -> &PackageVersion {
        &self.version
    }

    pub fn spec_version(&self) -> &PackageVersion {
        &self.spec_version
    }

    /// Load the resolved spec tree of a package type
    pub fn load_root_spec(&self, package_type: &str) -> LoaderResult<ItemSpec> {
        FolderSpecLoader::new(Some(Arc::new(ContentSchemaLoader::new())), self.version.clone())
            .load_package_type(&self.spec_dir, package_type)
    }

    /// Validate a package: structure first, then the semantic rules
    pub fn validate_package(&self, package: &Package) -> ValidationErrors {
        let mut errors = ValidationErrors::new();

        let root = match self.load_root_spec(&package.package_type) {
            Ok(root) => root,
            Err(e) => {
                errors.push(StructuredError::unassigned(format!(
                    "could not read root folder spec file: {}",
                    e
                )));
                return errors;
            }
        };

        if self.version >= GA_SPEC_CHECK_VERSION && package.is_ga() && self.spec_version.is_pre_release() {
            let package_version = package
                .version
                .as_ref()
                .map(ToString::to_string)
                .unwrap_or_default();
            errors.push(
                StructuredError::new(
                    format!(
                        "file \"{}\": package with GA version ({}) is using an unreleased version of the spec ({})",
                        package.path(&[MANIFEST_FILE_NAME]),
                        package_version,
                        self.spec_version
                    ),
                    CODE_NON_GA_SPEC_ON_GA_PACKAGE,
                )
                .with_file(MANIFEST_FILE_NAME),
            );
        }

        errors.append(
            FolderValidator::new(&root, package, ".")
                .with_warnings_as_errors(self.warnings_as_errors)
                .validate(),
        );
        errors.append(self.rules.validate(
            &self.version,
            &package.package_type,
            package.fs(),
            self.warnings_as_errors,
        ));

        info!(
            package = %package.name,
            package_type = %package.package_type,
            spec_version = %self.spec_version,
            errors = errors.len(),
            "Validated package"
        );
        errors
    }
}

/// Value of [`WARNINGS_AS_ERRORS_ENV`], false when unset or not a boolean
pub fn warnings_as_errors_from_env() -> bool {
    std::env::var(WARNINGS_AS_ERRORS_ENV)
        .ok()
        .and_then(|value| parse_bool(&value))
        .unwrap_or(false)
}

fn parse_bool(value: &str) -> Option<bool> {
    match value {
        "1" | "t" | "T" | "true" | "TRUE" | "True" => Some(true),
        "0" | "f" | "F" | "false" | "FALSE" | "False" => Some(false),
        _ => None,
    }
}

fn find_spec_version(spec_dir: &Path, version: &PackageVersion) -> LoaderResult<PackageVersion> {
    let changelog_path = spec_dir.join(SPEC_CHANGELOG_FILE_NAME);
    if !changelog_path.is_file() {
        return Ok(version.clone());
    }

    let data =
        std::fs::read_to_string(&changelog_path).map_err(|e| LoaderError::io_error(changelog_path.clone(), e))?;
    let entries: Vec<SpecChangelogEntry> =
        serde_yaml::from_str(&data).map_err(|e| LoaderError::yaml_parse_error(changelog_path.clone(), e))?;

    for entry in entries {
        let entry_version = PackageVersion::parse(&entry.version)
            .map_err(|e| LoaderError::version_error(changelog_path.clone(), e))?;
        if entry_version.release() == version.release() {
            debug!(version = %version, spec_version = %entry_version, "Found spec version");
            return Ok(entry_version);
        }
    }
    Err(LoaderError::invalid_spec(
        changelog_path,
        format!("spec version \"{}\" not found", version),
    ))
}

/// Failure of [`validate_from_path`] and [`validate_from_zip`]
#[derive(Debug, Error)]
pub enum ValidateError {
    #[error(transparent)]
    Loader(#[from] LoaderError),

    #[error(transparent)]
    Invalid(#[from] ValidationErrors),
}

/// Open the package at `package_path` and validate it against the
/// specification in `spec_dir`, using the package's own spec version
pub fn validate_from_path<S, P>(spec_dir: S, package_path: P) -> Result<(), ValidateError>
where
    S: Into<PathBuf>,
    P: AsRef<Path>,
{
    let package = Package::open(package_path)?;
    let spec = Spec::new(spec_dir, package.spec_version.clone())?;
    spec.validate_package(&package).into_result()?;
    Ok(())
}

/// Open the zipped package at `zip_path` and validate it against the
/// specification in `spec_dir`
pub fn validate_from_zip<S, P>(spec_dir: S, zip_path: P) -> Result<(), ValidateError>
where
    S: Into<PathBuf>,
    P: AsRef<Path>,
{
    let package = Package::open_zip(zip_path)?;
    let spec = Spec::new(spec_dir, package.spec_version.clone())?;
    spec.validate_package(&package).into_result()?;
    Ok(())
}
