//! Reference resolution helpers
//!
//! This module handles:
//! - Splitting `$ref` values into a document and a JSON pointer
//! - Resolving referenced documents relative to the referring one
//! - Circular reference detection
//!
//! Copyright (c) 2025 Specado Team
//! Licensed under the Apache-2.0 license

use crate::loader::error::{LoaderError, LoaderResult};
use serde_json::Value;
use std::path::{Component, Path, PathBuf};

/// Stack of documents being resolved, for cycle detection
#[derive(Debug, Clone)]
pub struct ResolverContext {
    pub resolution_stack: Vec<PathBuf>,
    /// Maximum reference depth
    pub max_depth: usize,
}

impl Default for ResolverContext {
    fn default() -> Self {
        Self::new()
    }
}

impl ResolverContext {
    pub fn new() -> Self {
        Self {
            resolution_stack: Vec::new(),
            max_depth: 32,
        }
    }

    /// Push a document onto the resolution stack
    pub fn push_path(&mut self, path: PathBuf) -> LoaderResult<()> {
        if self.resolution_stack.contains(&path) {
            let mut chain = self.resolution_stack.clone();
            chain.push(path);
            return Err(LoaderError::circular_reference(chain));
        }

        if self.resolution_stack.len() >= self.max_depth {
            let mut chain = self.resolution_stack.clone();
            chain.push(path);
            return Err(LoaderError::circular_reference(chain));
        }

        self.resolution_stack.push(path);
        Ok(())
    }

    pub fn pop_path(&mut self) -> Option<PathBuf> {
        self.resolution_stack.pop()
    }

    pub fn depth(&self) -> usize {
        self.resolution_stack.len()
    }
}

/// Split a reference into its document part and its JSON pointer.
///
/// `"other.yml#/properties/a"` gives `("other.yml", "/properties/a")`,
/// `"#/definitions/x"` gives `("", "/definitions/x")`.
pub fn split_reference(reference: &str) -> (&str, &str) {
    match reference.split_once('#') {
        Some((file, pointer)) => (file, pointer),
        None => (reference, ""),
    }
}

/// Path of a document referenced from `referrer`, lexically normalised.
pub fn resolve_relative(referrer: &Path, reference: &str) -> PathBuf {
    let base = referrer.parent().unwrap_or_else(|| Path::new(""));
    normalize_path(&base.join(reference))
}

/// Remove `.` components and fold `..` into their parent without touching the filesystem.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !normalized.pop() {
                    normalized.push("..");
                }
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}

/// Follow a JSON pointer inside a document
pub fn apply_json_pointer<'a>(
    document: &'a Value,
    pointer: &str,
    reference: &str,
    source_path: &Path,
) -> LoaderResult<&'a Value> {
    if pointer.is_empty() || pointer == "/" {
        return Ok(document);
    }

    let mut current = document;
    for segment in pointer.split('/').skip(1) {
        let decoded = segment.replace("~1", "/").replace("~0", "~");
        current = match current {
            Value::Object(obj) => obj.get(&decoded).ok_or_else(|| {
                LoaderError::reference_error(
                    reference.to_string(),
                    source_path.to_path_buf(),
                    format!("property '{}' not found", decoded),
                )
            })?,
            Value::Array(arr) => decoded
                .parse::<usize>()
                .ok()
                .and_then(|index| arr.get(index))
                .ok_or_else(|| {
                    LoaderError::reference_error(
                        reference.to_string(),
                        source_path.to_path_buf(),
                        format!("invalid array index '{}'", decoded),
                    )
                })?,
            _ => {
                return Err(LoaderError::reference_error(
                    reference.to_string(),
                    source_path.to_path_buf(),
                    format!("cannot access property '{}' on a scalar", decoded),
                ))
            }
        };
    }
    Ok(current)
}
