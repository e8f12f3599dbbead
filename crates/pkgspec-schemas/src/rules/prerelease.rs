//! Restrictions on prerelease tags of package versions
//!
//! Copyright (c) 2025 Specado Team
//! Licensed under the Apache-2.0 license

use crate::package::PackageFs;
use crate::rules::read_manifest_version;
use crate::validation::error::{StructuredError, ValidationErrors};
use crate::versioning::PackageVersion;
use regex::Regex;
use std::sync::OnceLock;

/// Prerelease tags allowed as they are.
const LITERAL_PRERELEASES: &[&str] = &["next", "SNAPSHOT"];

/// Prerelease tags allowed with optional numbering.
const NUMBERED_PRERELEASES: &[&str] = &["beta", "rc", "preview"];

/// Numbering after a tag starts with a digit, a dot or a hyphen, and ends
/// with a digit or a letter.
const PRERELEASE_NUMBER_PATTERN: &str = "(([0-9]|[.-][0-9A-Za-z])([0-9A-Za-z-.]*[0-9A-Za-z])?)?";

fn numbered_prerelease_regex() -> Option<&'static Regex> {
    static NUMBERED: OnceLock<Option<Regex>> = OnceLock::new();
    NUMBERED
        .get_or_init(|| {
            let pattern = format!("^({}){}$", NUMBERED_PRERELEASES.join("|"), PRERELEASE_NUMBER_PATTERN);
            Regex::new(&pattern).ok()
        })
        .as_ref()
}

/// Check the prerelease tag of the manifest version.
pub fn validate_prerelease(fsys: &PackageFs) -> ValidationErrors {
    let result = read_manifest_version(fsys).and_then(|version| check_prerelease(&version));
    match result {
        Ok(()) => ValidationErrors::new(),
        Err(message) => StructuredError::unassigned(message).into(),
    }
}

fn check_prerelease(manifest_version: &str) -> Result<(), String> {
    let version = PackageVersion::parse(manifest_version).map_err(|e| e.to_string())?;
    if version.major == 0 && version.is_pre_release() {
        return Err(format!(
            "versions below 1.0.0 are considered technical previews, please remove prerelease tag (version: {})",
            manifest_version
        ));
    }
    check_prerelease_tag(version.pre_release_tag())
}

fn check_prerelease_tag(tag: &str) -> Result<(), String> {
    if tag.is_empty()
        || LITERAL_PRERELEASES.contains(&tag)
        || numbered_prerelease_regex().is_some_and(|re| re.is_match(tag))
    {
        return Ok(());
    }
    Err(format!(
        "prerelease tag ({}) should be one of [{}], or one of [{}] followed by numbers",
        tag,
        LITERAL_PRERELEASES.join(", "),
        NUMBERED_PRERELEASES.join(", ")
    ))
}
