//! Structured validation errors
//!
//! Copyright (c) 2025 Specado Team
//! Licensed under the Apache-2.0 license

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Code of errors that have not been triaged. They can never be excluded.
pub const UNASSIGNED_CODE: &str = "";
pub const CODE_KIBANA_DASHBOARD_WITH_QUERY_BUT_NO_FILTER: &str = "SVR00001";
pub const CODE_KIBANA_DASHBOARD_WITHOUT_FILTER: &str = "SVR00002";
pub const CODE_KIBANA_DANGLING_OBJECT_IDS: &str = "SVR00003";
pub const CODE_KIBANA_LEGACY_VISUALIZATIONS: &str = "SVR00004";
pub const CODE_PRERELEASE_FEATURE_ON_GA_PACKAGE: &str = "PSR00001";
pub const CODE_NON_GA_SPEC_ON_GA_PACKAGE: &str = "PSR00002";

/// How serious a finding is
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[default]
    Critical,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Critical => write!(f, "critical"),
            Severity::Warning => write!(f, "warning"),
        }
    }
}

/// A single validation finding
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub struct StructuredError {
    /// Human-readable description
    pub message: String,
    /// Stable identifier of the check, empty when unassigned
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub code: String,
    #[serde(default)]
    pub severity: Severity,
    /// Display path of the file the finding refers to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
}

impl fmt::Display for StructuredError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.code.is_empty() {
            write!(f, "{}", self.message)
        } else {
            write!(f, "{} ({})", self.message, self.code)
        }
    }
}

impl StructuredError {
    /// Create an error carrying the given code
    pub fn new<M, C>(message: M, code: C) -> Self
    where
        M: Into<String>,
        C: Into<String>,
    {
        Self {
            message: message.into(),
            code: code.into(),
            severity: Severity::Critical,
            file: None,
        }
    }

    /// Create an error without an assigned code
    pub fn unassigned<M: Into<String>>(message: M) -> Self {
        Self::new(message, UNASSIGNED_CODE)
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    pub fn with_file<F: Into<String>>(mut self, file: F) -> Self {
        self.file = Some(file.into());
        self
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn is_unassigned(&self) -> bool {
        self.code == UNASSIGNED_CODE
    }
}

/// Ordered collection of validation findings
#[derive(Debug, Clone, Default, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValidationErrors {
    pub errors: Vec<StructuredError>,
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.errors.is_empty() {
            return write!(f, "found 0 validation errors");
        }

        let word = if self.errors.len() == 1 { "error" } else { "errors" };
        writeln!(f, "found {} validation {}:", self.errors.len(), word)?;
        for (idx, error) in self.errors.iter().enumerate() {
            writeln!(f, "{:4}. {}", idx + 1, error)?;
        }
        Ok(())
    }
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, error: StructuredError) {
        self.errors.push(error);
    }

    /// Move every error of `more` to the end of this collection.
    pub fn append(&mut self, more: ValidationErrors) {
        self.errors.extend(more.errors);
    }

    /// Split the collection in two: the errors for which `keep` returns
    /// true, and the rest. Relative order is preserved on both sides.
    pub fn collect<F>(self, mut keep: F) -> (ValidationErrors, ValidationErrors)
    where
        F: FnMut(&StructuredError) -> bool,
    {
        let (kept, removed): (Vec<_>, Vec<_>) = self.errors.into_iter().partition(|e| keep(e));
        (Self { errors: kept }, Self { errors: removed })
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, StructuredError> {
        self.errors.iter()
    }

    /// Ok if there are no errors, the collection itself otherwise
    pub fn into_result(self) -> Result<(), Self> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl From<StructuredError> for ValidationErrors {
    fn from(error: StructuredError) -> Self {
        Self { errors: vec![error] }
    }
}

impl From<Vec<StructuredError>> for ValidationErrors {
    fn from(errors: Vec<StructuredError>) -> Self {
        Self { errors }
    }
}

impl FromIterator<StructuredError> for ValidationErrors {
    fn from_iter<I: IntoIterator<Item = StructuredError>>(iter: I) -> Self {
        Self {
            errors: iter.into_iter().collect(),
        }
    }
}

impl Extend<StructuredError> for ValidationErrors {
    fn extend<I: IntoIterator<Item = StructuredError>>(&mut self, iter: I) {
        self.errors.extend(iter);
    }
}

impl IntoIterator for ValidationErrors {
    type Item = StructuredError;
    type IntoIter = std::vec::IntoIter<StructuredError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.into_iter()
    }
}

impl<'a> IntoIterator for &'a ValidationErrors {
    type Item = &'a StructuredError;
    type IntoIter = std::slice::Iter<'a, StructuredError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.iter()
    }
}
