//! Error types for spec loading operations
//!
//! Copyright (c) 2025 Specado Team
//! Licensed under the Apache-2.0 license

use crate::versioning::{PatchError, VersionError};
use std::path::PathBuf;
use thiserror::Error;

/// Result type for loader operations
pub type LoaderResult<T> = Result<T, LoaderError>;

/// Errors that abort loading a spec tree or opening a package
#[derive(Error, Debug)]
pub enum LoaderError {
    /// File I/O errors
    #[error("could not read file '{path}': {source}")]
    IoError {
        path: PathBuf,
        source: std::io::Error,
    },

    /// YAML parsing errors
    #[error("could not parse YAML file '{path}': {source}")]
    YamlParseError {
        path: PathBuf,
        source: serde_yaml::Error,
    },

    /// JSON parsing errors
    #[error("could not parse JSON file '{path}': {source}")]
    JsonParseError {
        path: PathBuf,
        source: serde_json::Error,
    },

    /// Unsupported spec document dialect
    #[error("unsupported file format for '{path}', expected .yml, .yaml or .json")]
    UnsupportedFormat { path: PathBuf },

    /// Reference resolution errors
    #[error("could not resolve reference '{reference}' in '{source_path}': {reason}")]
    ReferenceError {
        reference: String,
        source_path: PathBuf,
        reason: String,
    },

    /// Circular reference detection
    #[error("circular reference detected: {chain}")]
    CircularReference { chain: String },

    /// Invalid version strings in spec documents or manifests
    #[error("invalid version in '{path}': {source}")]
    VersionError {
        path: PathBuf,
        source: VersionError,
    },

    /// Version patches that cannot be applied
    #[error("could not resolve version patches of '{path}': {source}")]
    PatchError { path: PathBuf, source: PatchError },

    /// Spec documents that parse but describe an invalid tree
    #[error("invalid spec '{path}': {reason}")]
    InvalidSpec { path: PathBuf, reason: String },

    /// Content schemas that cannot be compiled
    #[error("could not compile schema '{path}': {reason}")]
    SchemaError { path: PathBuf, reason: String },

    /// No spec tree for the requested package type
    #[error("package type \"{package_type}\" not supported")]
    UnsupportedPackageType { package_type: String },

    /// Package location missing
    #[error("no package found at path [{path}]")]
    PackageNotFound { path: PathBuf },

    /// Package present but unusable
    #[error("invalid package at [{path}]: {reason}")]
    PackageError { path: PathBuf, reason: String },
}

impl LoaderError {
    /// Create an I/O error with path context
    pub fn io_error(path: PathBuf, error: std::io::Error) -> Self {
        Self::IoError {
            path,
            source: error,
        }
    }

    /// Create a YAML parsing error with path context
    pub fn yaml_parse_error(path: PathBuf, error: serde_yaml::Error) -> Self {
        Self::YamlParseError {
            path,
            source: error,
        }
    }

    /// Create a JSON parsing error with path context
    pub fn json_parse_error(path: PathBuf, error: serde_json::Error) -> Self {
        Self::JsonParseError {
            path,
            source: error,
        }
    }

    pub fn unsupported_format(path: PathBuf) -> Self {
        Self::UnsupportedFormat { path }
    }

    pub fn reference_error(reference: String, source_path: PathBuf, reason: String) -> Self {
        Self::ReferenceError {
            reference,
            source_path,
            reason,
        }
    }

    /// Create a circular reference error from the chain of visited documents
    pub fn circular_reference(chain: Vec<PathBuf>) -> Self {
        let chain_str = chain
            .iter()
            .map(|p| p.display().to_string())
            .collect::<Vec<_>>()
            .join(" -> ");
        Self::CircularReference { chain: chain_str }
    }

    pub fn version_error(path: PathBuf, error: VersionError) -> Self {
        Self::VersionError {
            path,
            source: error,
        }
    }

    pub fn patch_error(path: PathBuf, error: PatchError) -> Self {
        Self::PatchError {
            path,
            source: error,
        }
    }

    pub fn invalid_spec<R: Into<String>>(path: PathBuf, reason: R) -> Self {
        Self::InvalidSpec {
            path,
            reason: reason.into(),
        }
    }

    pub fn schema_error<R: Into<String>>(path: PathBuf, reason: R) -> Self {
        Self::SchemaError {
            path,
            reason: reason.into(),
        }
    }

    pub fn package_error<R: Into<String>>(path: PathBuf, reason: R) -> Self {
        Self::PackageError {
            path,
            reason: reason.into(),
        }
    }

    /// Get the path associated with this error, if any
    pub fn path(&self) -> Option<&PathBuf> {
        match self {
            Self::IoError { path, .. }
            | Self::YamlParseError { path, .. }
            | Self::JsonParseError { path, .. }
            | Self::UnsupportedFormat { path }
            | Self::VersionError { path, .. }
            | Self::PatchError { path, .. }
            | Self::InvalidSpec { path, .. }
            | Self::SchemaError { path, .. }
            | Self::PackageNotFound { path }
            | Self::PackageError { path, .. } => Some(path),
            Self::ReferenceError { source_path, .. } => Some(source_path),
            Self::CircularReference { .. } | Self::UnsupportedPackageType { .. } => None,
        }
    }
}
