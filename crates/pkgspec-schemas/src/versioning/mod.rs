//! Version handling for packages and spec documents
//!
//! This module provides:
//! - Semantic version parsing with prerelease precedence
//! - Version-gated JSON patches applied to spec nodes before parsing
//!
//! Copyright (c) 2025 Specado Team
//! Licensed under the Apache-2.0 license

pub mod patch;
pub mod version;

pub use patch::{apply_operations, patch_for_version, resolve_patch, PatchError, VersionPatch};
pub use version::{PackageVersion, VersionError};
