//! Structural validation of a package directory against a spec tree
//!
//! The walk is depth first. Every folder reports its own findings and the
//! number and size of the files it contains, which its parent folds into
//! its own totals unless the folder is a development folder.
//!
//! Copyright (c) 2025 Specado Team
//! Licensed under the Apache-2.0 license

use crate::package::fspath::{join, DirEntry};
use crate::package::Package;
use crate::spectypes::filesize::FileSize;
use crate::spectypes::item::ItemSpec;
use crate::validation::error::{StructuredError, ValidationErrors, CODE_PRERELEASE_FEATURE_ON_GA_PACKAGE};
use crate::validation::file::validate_file;
use tracing::{debug, warn};

const RELEASE_GA: &str = "ga";
const RELEASE_BETA: &str = "beta";

/// Validate the package against the root item of its spec tree
pub fn validate_package_structure(package: &Package, root: &ItemSpec) -> ValidationErrors {
    FolderValidator::new(root, package, ".").validate()
}

/// Validator for a single folder of a package
#[derive(Debug)]
pub struct FolderValidator<'a> {
    spec: &'a ItemSpec,
    package: &'a Package,
    folder_path: String,
    warnings_as_errors: bool,

    total_size: FileSize,
    total_contents: usize,
}

impl<'a> FolderValidator<'a> {
    pub fn new(spec: &'a ItemSpec, package: &'a Package, folder_path: impl Into<String>) -> Self {
        Self {
            spec,
            package,
            folder_path: folder_path.into(),
            warnings_as_errors: false,
            total_size: FileSize::default(),
            total_contents: 0,
        }
    }

    /// Report findings that are otherwise logged as warnings
    pub fn with_warnings_as_errors(mut self, enabled: bool) -> Self {
        self.warnings_as_errors = enabled;
        self
    }

    /// Validator for a subfolder of this one
    fn child(&self, spec: &'a ItemSpec, name: &str) -> Self {
        Self::new(spec, self.package, join(&self.folder_path, name)).with_warnings_as_errors(self.warnings_as_errors)
    }

    /// Size of the files accounted to this folder so far
    pub fn total_size(&self) -> FileSize {
        self.total_size
    }

    /// Number of files accounted to this folder so far
    pub fn total_contents(&self) -> usize {
        self.total_contents
    }

    fn display_path(&self) -> String {
        self.package.path(&[&self.folder_path])
    }

    pub fn validate(&mut self) -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        let entries = match self.package.fs().read_dir(&self.folder_path) {
            Ok(entries) => entries,
            Err(e) => {
                errors.push(StructuredError::unassigned(format!(
                    "could not read folder [{}]: {}",
                    self.display_path(),
                    e
                )));
                return errors;
            }
        };

        // Enforced in development folders too, to avoid reading too many files.
        let contents_limit = self.spec.limits.total_contents_limit;
        if contents_limit > 0 && entries.len() > contents_limit {
            errors.push(StructuredError::unassigned(format!(
                "folder [{}] exceeds the limit of {} files",
                self.display_path(),
                contents_limit
            )));
            return errors;
        }

        self.check_release(&mut errors);

        for entry in &entries {
            self.validate_entry(entry, &mut errors);
        }

        let size_limit = self.spec.limits.total_size_limit;
        if !size_limit.is_zero() && self.total_size > size_limit {
            errors.push(StructuredError::unassigned(format!(
                "folder [{}] exceeds the total size limit of {}",
                self.display_path(),
                size_limit
            )));
        }

        self.check_required(&entries, &mut errors);

        debug!(
            folder = %self.folder_path,
            files = self.total_contents,
            size = %self.total_size,
            errors = errors.len(),
            "Validated folder"
        );
        errors
    }

    fn check_release(&self, errors: &mut ValidationErrors) {
        match self.spec.release.as_str() {
            "" | RELEASE_GA => {}
            RELEASE_BETA if self.package.is_ga() => {
                errors.push(StructuredError::unassigned(format!(
                    "spec for [{}] defines beta features which can't be enabled for packages with a stable semantic version",
                    self.display_path()
                )));
            }
            RELEASE_BETA if self.warnings_as_errors => {
                errors.push(StructuredError::new(
                    format!(
                        "package with non-stable semantic version and active beta features (enabled in [{}]) can't be released as stable version.",
                        self.display_path()
                    ),
                    CODE_PRERELEASE_FEATURE_ON_GA_PACKAGE,
                ));
            }
            RELEASE_BETA => {
                warn!(
                    folder = %self.display_path(),
                    "Package with non-stable semantic version and active beta features can't be released as stable version"
                );
            }
            _ => errors.push(StructuredError::unassigned(
                "unsupport release level, supported values: beta, ga",
            )),
        }
    }

    fn validate_entry(&mut self, entry: &DirEntry, errors: &mut ValidationErrors) {
        let Some(item) = self.find_item_spec(&entry.name) else {
            if !self.spec.additional_contents {
                errors.push(StructuredError::unassigned(format!(
                    "item [{}] is not allowed in folder [{}]",
                    entry.name,
                    self.display_path()
                )));
            } else if entry.is_dir && !self.spec.development_folder && entry.name.contains('-') {
                errors.push(StructuredError::unassigned(format!(
                    "file \"{}\" is invalid: directory name inside package {} contains -: {}",
                    self.package.path(&[&self.folder_path, &entry.name]),
                    self.package.name,
                    entry.name
                )));
            }
            return;
        };

        if entry.is_dir {
            if !item.is_dir() {
                errors.push(StructuredError::unassigned(format!(
                    "[{}] is a folder but is expected to be a file",
                    entry.name
                )));
                return;
            }

            let mut child = self.child(item, &entry.name);
            errors.append(child.validate());

            if !item.development_folder {
                self.total_contents += child.total_contents;
                self.total_size = FileSize::bytes(self.total_size.as_u64() + child.total_size.as_u64());
            }
            return;
        }

        let item_path = join(&self.folder_path, &entry.name);
        if item.is_dir() {
            errors.push(StructuredError::unassigned(format!(
                "[{}] is a file but is expected to be a folder",
                self.package.path(&[&item_path])
            )));
            return;
        }

        let display = self.package.path(&[&item_path]);
        for error in validate_file(item, self.package.fs(), &item_path) {
            errors.push(StructuredError {
                message: format!("file \"{}\" is invalid: {}", display, error.message),
                file: Some(item_path.clone()),
                ..error
            });
        }

        match self.package.fs().metadata(&item_path) {
            Ok(metadata) => {
                self.total_contents += 1;
                self.total_size = FileSize::bytes(self.total_size.as_u64() + metadata.size());
            }
            Err(e) => errors.push(StructuredError::unassigned(format!(
                "failed to obtain file size for \"{}\": {}",
                display, e
            ))),
        }
    }

    /// Child item for an entry name. Exact names win over patterns, then
    /// the first pattern in declaration order.
    fn find_item_spec(&self, entry_name: &str) -> Option<&'a ItemSpec> {
        let spec: &'a ItemSpec = self.spec;
        let contents = &spec.contents;
        contents
            .iter()
            .find(|item| !item.name.is_empty() && item.name == entry_name)
            .or_else(|| {
                contents
                    .iter()
                    .find(|item| item.matches_pattern(entry_name, &self.package.name))
            })
    }

    fn check_required(&self, entries: &[DirEntry], errors: &mut ValidationErrors) {
        for item in self.spec.contents.iter().filter(|item| item.required) {
            if matching_entry_exists(item, entries, &self.package.name) {
                continue;
            }
            let message = if !item.name.is_empty() {
                format!(
                    "expecting to find [{}] {} in folder [{}]",
                    item.name,
                    item.item_type,
                    self.display_path()
                )
            } else {
                format!(
                    "expecting to find {} matching pattern [{}] in folder [{}]",
                    item.item_type,
                    item.pattern,
                    self.display_path()
                )
            };
            errors.push(StructuredError::unassigned(message));
        }
    }
}

/// Whether a required item is present among the entries with the expected type
fn matching_entry_exists(item: &ItemSpec, entries: &[DirEntry], package_name: &str) -> bool {
    let found = if !item.name.is_empty() {
        entries.iter().find(|entry| entry.name == item.name)
    } else {
        entries
            .iter()
            .find(|entry| item.matches_pattern(&entry.name, package_name))
    };
    found.is_some_and(|entry| item.is_same_type(entry.is_dir))
}
