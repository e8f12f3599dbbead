//! Pkgspec Schemas - package specification loading and validation
//!
//! This crate validates package directories against a declarative
//! specification:
//! - **Spec trees**: folder specs in YAML or JSON, patched per spec version
//! - **Content schemas**: JSON Schema documents validating file contents,
//!   with `relative-path` and `data-stream-name` format predicates
//! - **Structural validation**: required items, name and pattern matching,
//!   size and count limits, beta feature gating
//! - **Structured errors**: coded findings and a configurable filter
//! - **Packages**: folders on disk or zip files with a single top folder
//!
//! ## Quick Start
//!
//! ```no_run
//! use pkgspec_schemas::{Filter, ConfigFilter, Package, Spec};
//!
//! let package = Package::open("packages/nginx")?;
//! let spec = Spec::new("spec", package.spec_version.clone())?;
//! let errors = spec.validate_package(&package);
//!
//! let filter = Filter::new(&ConfigFilter::load(package.fs()).unwrap_or_default())?;
//! match filter.run(errors) {
//!     Ok(result) if result.processed.is_empty() => println!("Valid package!"),
//!     Ok(result) => println!("{}", result.processed),
//!     Err(failure) => println!("{}", failure.unfiltered),
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Spec documents
//!
//! Every spec document has the same envelope:
//!
//! ```yaml
//! spec:
//!   type: folder
//!   contents:
//!     - type: file
//!       name: manifest.yml
//!       required: true
//!       contentMediaType: application/x-yaml
//!       $ref: ./manifest.spec.yml
//! versions:
//!   - before: 3.0.0
//!     patch:
//!       - op: remove
//!         path: /contents/0/required
//! ```
//!
//! Every patch whose `before` version is greater than the target version
//! is applied, in the order they are listed.
//!
//! Copyright (c) 2025 Specado Team
//! Licensed under the Apache-2.0 license

pub mod loader;
pub mod package;
pub mod rules;
pub mod schema;
pub mod spec;
pub mod spectypes;
pub mod validation;
pub mod versioning;

// Re-export commonly used types for convenience
pub use loader::{FolderSpecLoader, LoaderError, LoaderResult};
pub use package::{ArchiveError, EntryMetadata, Package, PackageFs};
pub use rules::{warn_on, RuleEntry, RuleRegistry};
pub use schema::ContentSchemaLoader;
pub use spec::{
    validate_from_path, validate_from_zip, warnings_as_errors_from_env, Spec, ValidateError, WARNINGS_AS_ERRORS_ENV,
};
pub use spectypes::{ContentType, FileSize, ItemSpec, ItemType, Limits};
pub use validation::{
    validate_package_structure, ConfigFilter, Filter, FilterResult, Severity, StructuredError,
    ValidationErrors,
};
pub use versioning::PackageVersion;
