//! Consistency between the manifest version and the changelog
//!
//! Copyright (c) 2025 Specado Team
//! Licensed under the Apache-2.0 license

use crate::package::PackageFs;
use crate::rules::read_manifest_version;
use crate::validation::error::{StructuredError, ValidationErrors};
use crate::versioning::PackageVersion;
use serde::Deserialize;
use std::collections::HashSet;

pub const CHANGELOG_FILE_NAME: &str = "changelog.yml";

/// Changelog entries kept for changes not released yet end with this suffix.
const NEXT_SUFFIX: &str = "-next";

#[derive(Debug, Deserialize)]
struct ChangelogEntry {
    version: String,
}

/// The manifest version must be the latest changelog entry, changelog
/// versions must be unique and the first entry must be the greatest.
pub fn validate_version_integrity(fsys: &PackageFs) -> ValidationErrors {
    match check_version_integrity(fsys) {
        Ok(()) => ValidationErrors::new(),
        Err(message) => StructuredError::unassigned(message).into(),
    }
}

fn check_version_integrity(fsys: &PackageFs) -> Result<(), String> {
    let manifest_version = read_manifest_version(fsys)?;
    let versions = read_changelog_versions(fsys)?;

    ensure_unique_versions(&versions)?;
    ensure_manifest_version_has_entry(&manifest_version, &versions)?;
    ensure_latest_is_greatest(&versions)
}

fn read_changelog_versions(fsys: &PackageFs) -> Result<Vec<String>, String> {
    let data = fsys
        .read_to_string(CHANGELOG_FILE_NAME)
        .map_err(|e| format!("can't locate changelog file: {}", e))?;
    let entries: Vec<ChangelogEntry> =
        serde_yaml::from_str(&data).map_err(|e| format!("can't read changelog entries: {}", e))?;
    Ok(entries.into_iter().map(|entry| entry.version).collect())
}

fn ensure_unique_versions(versions: &[String]) -> Result<(), String> {
    let mut seen = HashSet::new();
    for version in versions {
        if !seen.insert(version.as_str()) {
            return Err(format!(
                "versions in changelog must be unique, found at least two same versions ({})",
                version
            ));
        }
    }
    Ok(())
}

fn ensure_manifest_version_has_entry(manifest_version: &str, versions: &[String]) -> Result<(), String> {
    let Some(first) = versions.first() else {
        return Err("no versions found in changelog".to_string());
    };
    if first == manifest_version {
        return Ok(());
    }
    if first.ends_with(NEXT_SUFFIX) && versions.iter().any(|v| v == manifest_version) {
        return Ok(());
    }
    Err("current manifest version doesn't have changelog entry".to_string())
}

fn ensure_latest_is_greatest(versions: &[String]) -> Result<(), String> {
    let Some((first, rest)) = versions.split_first() else {
        return Err("no versions found in changelog".to_string());
    };
    let latest = parse_version(first)?;
    for version in rest {
        let version = parse_version(version)?;
        if version >= latest {
            return Err(format!(
                "changelog entry {} is greater than or equal to first changelog entry: {}",
                version, latest
            ));
        }
    }
    Ok(())
}

fn parse_version(version: &str) -> Result<PackageVersion, String> {
    PackageVersion::parse(version)
        .map_err(|e| format!("could not read package manifest version [{}]: {}", version, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::package::MANIFEST_FILE_NAME;
    use std::fs;
    use tempfile::TempDir;

    fn package(manifest_version: &str, changelog: &[&str]) -> (TempDir, PackageFs) {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join(MANIFEST_FILE_NAME),
            format!("name: nginx\nversion: \"{}\"\n", manifest_version),
        )
        .unwrap();
        let entries: String = changelog
            .iter()
            .map(|v| format!("- version: \"{}\"\n  changes:\n    - description: change\n", v))
            .collect();
        fs::write(dir.path().join(CHANGELOG_FILE_NAME), entries).unwrap();
        let fsys = PackageFs::new(dir.path());
        (dir, fsys)
    }

    fn message(fsys: &PackageFs) -> Option<String> {
        validate_version_integrity(fsys)
            .errors
            .first()
            .map(|e| e.message.clone())
    }

    #[test]
    fn test_consistent_versions() {
        let (_dir, fsys) = package("1.2.0", &["1.2.0", "1.1.0", "1.0.0"]);
        assert_eq!(message(&fsys), None);
    }

    #[test]
    fn test_next_entry_allows_older_manifest_version() {
        let (_dir, fsys) = package("1.1.0", &["1.2.0-next", "1.1.0"]);
        assert_eq!(message(&fsys), None);

        let (_dir, fsys) = package("1.1.0", &["1.2.0", "1.1.0"]);
        assert_eq!(
            message(&fsys).as_deref(),
            Some("current manifest version doesn't have changelog entry")
        );
    }

    #[test]
    fn test_duplicated_versions() {
        let (_dir, fsys) = package("1.2.0", &["1.2.0", "1.1.0", "1.1.0"]);
        assert_eq!(
            message(&fsys).as_deref(),
            Some("versions in changelog must be unique, found at least two same versions (1.1.0)")
        );
    }

    #[test]
    fn test_first_entry_must_be_greatest() {
        let (_dir, fsys) = package("1.2.0", &["1.2.0", "1.3.0"]);
        assert_eq!(
            message(&fsys).as_deref(),
            Some("changelog entry 1.3.0 is greater than or equal to first changelog entry: 1.2.0")
        );
    }

    #[test]
    fn test_empty_changelog() {
        let (_dir, fsys) = package("1.2.0", &[]);
        fs::write(fsys.local_path(CHANGELOG_FILE_NAME).unwrap(), "[]\n").unwrap();
        assert_eq!(message(&fsys).as_deref(), Some("no versions found in changelog"));
    }

    #[test]
    fn test_missing_changelog() {
        let (_dir, fsys) = package("1.2.0", &["1.2.0"]);
        fs::remove_file(fsys.local_path(CHANGELOG_FILE_NAME).unwrap()).unwrap();
        assert!(message(&fsys).unwrap().starts_with("can't locate changelog file"));
    }
}
