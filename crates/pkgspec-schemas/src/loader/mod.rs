//! Spec tree loading
//!
//! This module provides:
//! - YAML and JSON spec documents, selected by file extension
//! - Version patches resolved before nodes are parsed
//! - Folder and content schema references, with cycle detection
//! - Default values and top-down limit inheritance
//!
//! # Example Usage
//!
//! ```no_run
//! use pkgspec_schemas::loader::FolderSpecLoader;
//! use pkgspec_schemas::versioning::PackageVersion;
//! use std::path::Path;
//!
//! let loader = FolderSpecLoader::new(None, PackageVersion::new(3, 0, 0));
//! let root = loader.load_package_type(Path::new("spec"), "integration")?;
//! println!("{} top-level items", root.contents.len());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! Copyright (c) 2025 Specado Team
//! Licensed under the Apache-2.0 license

pub mod error;
pub mod parser;
pub mod resolver;
pub mod spec_loader;

pub use error::{LoaderError, LoaderResult};
pub use parser::{yaml_to_json, Format, SpecDocument, SpecParser};
pub use resolver::ResolverContext;
pub use spec_loader::{FolderSpecLoader, ROOT_SPEC_FILE_NAME};
