//! Semantic version parsing and precedence
//!
//! Copyright (c) 2025 Specado Team
//! Licensed under the Apache-2.0 license

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Semantic version of a package or of the specification itself
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PackageVersion {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
    pub pre_release: Option<String>,
    pub build_metadata: Option<String>,
}

impl PackageVersion {
    /// Create a new release version
    pub fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            major,
            minor,
            patch,
            pre_release: None,
            build_metadata: None,
        }
    }

    /// Parse a version string
    ///
    /// Accepts an optional `v` prefix, and short `X` or `X.Y` forms whose
    /// missing components are taken as zero.
    pub fn parse(version_str: &str) -> Result<Self, VersionError> {
        let trimmed = version_str.trim();
        let version_str = trimmed.strip_prefix('v').unwrap_or(trimmed);
        if version_str.is_empty() {
            return Err(VersionError::InvalidFormat("empty version".to_string()));
        }

        let (version_part, build_metadata) = match version_str.split_once('+') {
            Some((version, build)) => (version, Some(build.to_string())),
            None => (version_str, None),
        };

        let (version_part, pre_release) = match version_part.split_once('-') {
            Some((version, pre)) => (version, Some(pre.to_string())),
            None => (version_part, None),
        };

        if let Some(pre) = &pre_release {
            if pre.is_empty() || pre.split('.').any(|ident| ident.is_empty() || !is_identifier(ident)) {
                return Err(VersionError::InvalidFormat(format!(
                    "Invalid prerelease: {}",
                    pre
                )));
            }
        }
        if let Some(build) = &build_metadata {
            if build.is_empty() || build.split('.').any(|ident| ident.is_empty() || !is_identifier(ident)) {
                return Err(VersionError::InvalidFormat(format!(
                    "Invalid build metadata: {}",
                    build
                )));
            }
        }

        let parts: Vec<&str> = version_part.split('.').collect();
        if parts.is_empty() || parts.len() > 3 {
            return Err(VersionError::InvalidFormat(format!(
                "Expected format X.Y.Z, got: {}",
                version_str
            )));
        }

        let mut numbers = [0u64; 3];
        for (slot, part) in numbers.iter_mut().zip(parts.iter()) {
            if part.is_empty() || !part.chars().all(|c| c.is_ascii_digit()) {
                return Err(VersionError::InvalidFormat(format!(
                    "Invalid version component '{}' in {}",
                    part, version_str
                )));
            }
            *slot = part.parse().map_err(|_| {
                VersionError::InvalidFormat(format!("Version component too large: {}", part))
            })?;
        }

        Ok(Self {
            major: numbers[0],
            minor: numbers[1],
            patch: numbers[2],
            pre_release,
            build_metadata,
        })
    }

    /// Check if this is a pre-release version
    pub fn is_pre_release(&self) -> bool {
        self.pre_release.is_some()
    }

    /// Prerelease tag, empty when this is a release
    pub fn pre_release_tag(&self) -> &str {
        self.pre_release.as_deref().unwrap_or("")
    }

    /// A stable version has a major component of at least 1 and no prerelease.
    pub fn is_stable(&self) -> bool {
        self.major >= 1 && !self.is_pre_release()
    }

    /// Same version without prerelease or build metadata
    pub fn release(&self) -> Self {
        Self::new(self.major, self.minor, self.patch)
    }
}

fn is_identifier(ident: &str) -> bool {
    ident.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
}

fn compare_pre_release(a: &str, b: &str) -> Ordering {
    let mut left = a.split('.');
    let mut right = b.split('.');
    loop {
        match (left.next(), right.next()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) => {
                let ord = match (x.parse::<u64>(), y.parse::<u64>()) {
                    (Ok(nx), Ok(ny)) => nx.cmp(&ny),
                    (Ok(_), Err(_)) => Ordering::Less,
                    (Err(_), Ok(_)) => Ordering::Greater,
                    (Err(_), Err(_)) => x.cmp(y),
                };
                if ord != Ordering::Equal {
                    return ord;
                }
            }
        }
    }
}

impl fmt::Display for PackageVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)?;
        if let Some(ref pre) = self.pre_release {
            write!(f, "-{}", pre)?;
        }
        if let Some(ref build) = self.build_metadata {
            write!(f, "+{}", build)?;
        }
        Ok(())
    }
}

impl FromStr for PackageVersion {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for PackageVersion {
    type Error = VersionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<PackageVersion> for String {
    fn from(version: PackageVersion) -> Self {
        version.to_string()
    }
}

impl PartialOrd for PackageVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PackageVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        self.major
            .cmp(&other.major)
            .then(self.minor.cmp(&other.minor))
            .then(self.patch.cmp(&other.patch))
            .then_with(|| match (&self.pre_release, &other.pre_release) {
                (None, None) => Ordering::Equal,
                // Pre-release versions have lower precedence
                (None, Some(_)) => Ordering::Greater,
                (Some(_), None) => Ordering::Less,
                (Some(a), Some(b)) => compare_pre_release(a, b),
            })
            .then_with(|| self.build_metadata.cmp(&other.build_metadata))
    }
}

/// Version parsing error
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VersionError {
    #[error("Invalid version format: {0}")]
    InvalidFormat(String),
}
