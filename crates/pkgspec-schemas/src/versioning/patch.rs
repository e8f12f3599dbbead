//! Version-gated JSON patches for spec nodes
//!
//! Spec documents carry a list of `{before, patch}` entries. Every entry
//! whose `before` version is greater than the target version contributes
//! its RFC 6902 operations, in declaration order, to one compound patch
//! that is applied to the node before it is parsed.
//!
//! Copyright (c) 2025 Specado Team
//! Licensed under the Apache-2.0 license

use crate::versioning::version::{PackageVersion, VersionError};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::borrow::Cow;
use thiserror::Error;

/// A set of patch operations applied to targets older than `before`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VersionPatch {
    /// First version that already includes this change.
    pub before: String,
    /// RFC 6902 operations.
    #[serde(default)]
    pub patch: Vec<Value>,
}

/// Errors raised while selecting or applying version patches
#[derive(Error, Debug)]
pub enum PatchError {
    #[error("invalid version '{before}' in patch list: {source}")]
    InvalidVersion {
        before: String,
        source: VersionError,
    },

    #[error("failed to decode patch: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("failed to serialize spec for patching: {0}")]
    Serialize(#[source] serde_json::Error),

    #[error("failed to apply patch: {0}")]
    Apply(#[from] json_patch::PatchError),

    #[error("failed to unmarshal resolved spec: {0}")]
    Deserialize(#[source] serde_json::Error),
}

/// Concatenate the operations of every patch that applies to `target`.
///
/// Returns an empty list when no patch applies.
pub fn patch_for_version(
    target: &PackageVersion,
    versions: &[VersionPatch],
) -> Result<Vec<Value>, PatchError> {
    let mut operations = Vec::new();
    for version in versions {
        let before = PackageVersion::parse(&version.before).map_err(|source| {
            PatchError::InvalidVersion {
                before: version.before.clone(),
                source,
            }
        })?;
        if *target < before {
            operations.extend(version.patch.iter().cloned());
        }
    }
    Ok(operations)
}

/// Apply a list of RFC 6902 operations to a JSON document in place.
pub fn apply_operations(document: &mut Value, operations: Vec<Value>) -> Result<(), PatchError> {
    let patch: Vec<json_patch::PatchOperation> =
        serde_json::from_value(Value::Array(operations)).map_err(PatchError::Decode)?;
    json_patch::patch(document, &patch)?;
    Ok(())
}

/// Resolve the version patches of `node` for `target`.
///
/// When no patch applies the node is handed back borrowed, without
/// serializing or copying it.
pub fn resolve_patch<'a, T>(
    node: &'a T,
    target: &PackageVersion,
    versions: &[VersionPatch],
) -> Result<Cow<'a, T>, PatchError>
where
    T: Clone + Serialize + DeserializeOwned,
{
    let operations = patch_for_version(target, versions)?;
    if operations.is_empty() {
        return Ok(Cow::Borrowed(node));
    }

    let mut document = serde_json::to_value(node).map_err(PatchError::Serialize)?;
    apply_operations(&mut document, operations)?;
    let resolved = serde_json::from_value(document).map_err(PatchError::Deserialize)?;
    Ok(Cow::Owned(resolved))
}
