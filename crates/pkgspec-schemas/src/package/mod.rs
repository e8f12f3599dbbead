//! Packages under validation
//!
//! Copyright (c) 2025 Specado Team
//! Licensed under the Apache-2.0 license

pub mod archive;
pub mod fspath;

pub use archive::{ArchiveError, ArchiveTree};
pub use fspath::{DirEntry, EntryMetadata, PackageFs};

use crate::loader::error::{LoaderError, LoaderResult};
use crate::versioning::PackageVersion;
use serde::Deserialize;
use std::fs::File;
use std::io::{Read, Seek};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// Name of the manifest file at the package root.
pub const MANIFEST_FILE_NAME: &str = "manifest.yml";

#[derive(Debug, Deserialize)]
struct Manifest {
    #[serde(default)]
    name: String,
    #[serde(rename = "type", default)]
    package_type: String,
    #[serde(default)]
    version: Option<serde_yaml::Value>,
    #[serde(default)]
    format_version: Option<serde_yaml::Value>,
}

/// A package, as a folder or a zip file, and the metadata of its manifest
#[derive(Debug, Clone)]
pub struct Package {
    pub name: String,
    pub package_type: String,
    /// Version of the package itself, when declared and well formed.
    pub version: Option<PackageVersion>,
    /// Version of the specification the package is written against.
    pub spec_version: PackageVersion,
    fs: PackageFs,
}

impl Package {
    pub fn new(
        name: impl Into<String>,
        package_type: impl Into<String>,
        version: Option<PackageVersion>,
        spec_version: PackageVersion,
        fs: PackageFs,
    ) -> Self {
        Self {
            name: name.into(),
            package_type: package_type.into(),
            version,
            spec_version,
            fs,
        }
    }

    /// Open the package rooted at `path`
    pub fn open<P: AsRef<Path>>(path: P) -> LoaderResult<Self> {
        let path = path.as_ref();
        let metadata = std::fs::metadata(path).map_err(|_| LoaderError::PackageNotFound {
            path: path.to_path_buf(),
        })?;
        if !metadata.is_dir() {
            return Err(LoaderError::package_error(
                path.to_path_buf(),
                "no package folder found at path",
            ));
        }
        Self::from_fs(PackageFs::new(path))
    }

    /// Open a zipped package. The archive must hold a single folder
    /// with the package in it.
    pub fn open_zip<P: AsRef<Path>>(path: P) -> LoaderResult<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|_| LoaderError::PackageNotFound {
            path: path.to_path_buf(),
        })?;
        Self::from_zip_reader(path, file)
    }

    /// Open a zipped package from any seekable reader. `location` is used
    /// for display paths.
    pub fn from_zip_reader<L: Into<PathBuf>, R: Read + Seek>(location: L, reader: R) -> LoaderResult<Self> {
        let location = location.into();
        let tree = ArchiveTree::from_reader(reader).map_err(|e| {
            LoaderError::package_error(
                location.clone(),
                format!("failed to open zip file ({}): {}", location.display(), e),
            )
        })?;

        let top_level = tree.children("");
        let root = match top_level.as_slice() {
            [entry] if entry.is_dir => entry.name.clone(),
            entries => {
                return Err(LoaderError::package_error(
                    location,
                    format!("a single directory is expected in zip file, {} found", entries.len()),
                ))
            }
        };
        debug!(location = %location.display(), root = %root, "Opened zip package");

        Self::from_fs(PackageFs::archive(Arc::new(tree), root, location))
    }

    /// Build a package from an existing filesystem view
    pub fn from_fs(fs: PackageFs) -> LoaderResult<Self> {
        let manifest_path = PathBuf::from(fs.path(&[MANIFEST_FILE_NAME]));
        if !fs.is_file(MANIFEST_FILE_NAME) {
            return Err(LoaderError::package_error(
                manifest_path,
                format!("no package manifest file found at path [{}]", MANIFEST_FILE_NAME),
            ));
        }

        let data = fs
            .read_to_string(MANIFEST_FILE_NAME)
            .map_err(|e| LoaderError::io_error(manifest_path.clone(), e))?;
        let manifest: Manifest = serde_yaml::from_str(&data)
            .map_err(|e| LoaderError::yaml_parse_error(manifest_path.clone(), e))?;

        if manifest.package_type.is_empty() {
            return Err(LoaderError::package_error(
                manifest_path,
                "package type undefined in the package manifest file",
            ));
        }

        let format_version = manifest
            .format_version
            .as_ref()
            .and_then(scalar_to_string)
            .unwrap_or_default();
        let spec_version = PackageVersion::parse(&format_version)
            .map_err(|e| LoaderError::version_error(manifest_path.clone(), e))?;

        let version = manifest
            .version
            .as_ref()
            .and_then(scalar_to_string)
            .and_then(|v| PackageVersion::parse(&v).ok());

        debug!(
            name = %manifest.name,
            package_type = %manifest.package_type,
            spec_version = %spec_version,
            "Opened package"
        );

        Ok(Self {
            name: manifest.name,
            package_type: manifest.package_type,
            version,
            spec_version,
            fs,
        })
    }

    pub fn fs(&self) -> &PackageFs {
        &self.fs
    }

    /// Display path of names inside the package.
    pub fn path(&self, names: &[&str]) -> String {
        self.fs.path(names)
    }

    /// Whether the package version is a stable release.
    pub fn is_ga(&self) -> bool {
        self.version.as_ref().is_some_and(PackageVersion::is_stable)
    }
}

fn scalar_to_string(value: &serde_yaml::Value) -> Option<String> {
    match value {
        serde_yaml::Value::String(s) => Some(s.clone()),
        serde_yaml::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
