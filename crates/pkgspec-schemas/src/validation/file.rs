//! Checks applied to every file matched by a file item
//!
//! Copyright (c) 2025 Specado Team
//! Licensed under the Apache-2.0 license

use crate::package::PackageFs;
use crate::spectypes::content_type::{ContentType, YAML_MEDIA_TYPE};
use crate::spectypes::filesize::FileSize;
use crate::spectypes::item::ItemSpec;
use crate::validation::error::{StructuredError, ValidationErrors};
use std::io::{BufRead, BufReader, Read};

const DOCUMENT_DASHES: &[u8] = b"---";

const SUPPORTED_MEDIA_TYPES: &[&str] = &[
    YAML_MEDIA_TYPE,
    "application/json",
    "text/csv",
    "text/markdown",
    "text/plain",
];

/// Validate a single file against its item.
///
/// Size and media type checks run first and stop at the first failure;
/// the content schema, if any, runs only when they pass.
pub fn validate_file(item: &ItemSpec, fsys: &PackageFs, path: &str) -> ValidationErrors {
    if let Err(message) = validate_max_size(fsys, path, item.limits.size_limit) {
        return StructuredError::unassigned(message).into();
    }

    if let Some(content_type) = &item.content_media_type {
        if let Err(message) = validate_content_type(fsys, path, content_type) {
            return StructuredError::unassigned(message).into();
        }
        if let Err(message) =
            validate_content_type_size(fsys, path, content_type, item.limits.configuration_size_limit)
        {
            return StructuredError::unassigned(message).into();
        }
    }

    match &item.schema {
        Some(schema) => schema.validate(fsys, path, &item.limits),
        None => ValidationErrors::new(),
    }
}

fn file_size(fsys: &PackageFs, path: &str) -> Result<FileSize, String> {
    fsys.metadata(path)
        .map(|metadata| FileSize::bytes(metadata.size()))
        .map_err(|e| e.to_string())
}

fn validate_max_size(fsys: &PackageFs, path: &str, limit: FileSize) -> Result<(), String> {
    if limit.is_zero() {
        return Ok(());
    }
    let size = file_size(fsys, path)?;
    if size > limit {
        return Err(format!("file size ({}) is bigger than expected ({})", size, limit));
    }
    Ok(())
}

fn validate_content_type(fsys: &PackageFs, path: &str, content_type: &ContentType) -> Result<(), String> {
    if !SUPPORTED_MEDIA_TYPES.contains(&content_type.media_type.as_str()) {
        return Err(format!("unsupported media type ({})", content_type));
    }
    if content_type.is_yaml() && content_type.requires_document_dashes() {
        validate_document_dashes(fsys, path)?;
    }
    Ok(())
}

/// The first line must be `---`, with either line ending.
fn validate_document_dashes(fsys: &PackageFs, path: &str) -> Result<(), String> {
    let file = fsys.open(path).map_err(|e| e.to_string())?;
    let mut first_line = Vec::new();
    BufReader::new(file.take(DOCUMENT_DASHES.len() as u64 + 2))
        .read_until(b'\n', &mut first_line)
        .map_err(|e| e.to_string())?;

    let line = first_line.strip_suffix(b"\n").unwrap_or(&first_line);
    let line = line.strip_suffix(b"\r").unwrap_or(line);
    if line != DOCUMENT_DASHES {
        return Err("document dashes are required (start the document with '---')".to_string());
    }
    Ok(())
}

fn validate_content_type_size(
    fsys: &PackageFs,
    path: &str,
    content_type: &ContentType,
    configuration_limit: FileSize,
) -> Result<(), String> {
    let size = file_size(fsys, path)?;
    if size.is_zero() {
        return Err("file is empty, but media type is defined".to_string());
    }

    let limit = if content_type.is_yaml() {
        configuration_limit
    } else {
        FileSize::default()
    };
    if !limit.is_zero() && size > limit {
        return Err(format!("file size ({}) is bigger than expected ({})", size, limit));
    }
    Ok(())
}
