//! Capabilities for validating file contents
//!
//! Copyright (c) 2025 Specado Team
//! Licensed under the Apache-2.0 license

use crate::loader::error::LoaderResult;
use crate::package::PackageFs;
use crate::spectypes::content_type::ContentType;
use crate::spectypes::limits::Limits;
use crate::validation::error::ValidationErrors;
use crate::versioning::PackageVersion;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

/// Compiled expectation for the content of a file
pub trait FileSchema: fmt::Debug + Send + Sync {
    /// Check the file at `path` against the schema.
    ///
    /// `limits` are the resolved limits of the item the file matched.
    fn validate(&self, fsys: &PackageFs, path: &str, limits: &Limits) -> ValidationErrors;
}

/// Options for loading a content schema
#[derive(Debug, Clone)]
pub struct FileSchemaLoadOptions {
    pub content_type: Option<ContentType>,
    pub spec_version: PackageVersion,
}

/// Loads content schemas referenced from spec trees
pub trait FileSchemaLoader: Send + Sync {
    fn load(&self, schema_path: &Path, options: &FileSchemaLoadOptions) -> LoaderResult<Arc<dyn FileSchema>>;
}
