//! Post-processing of validation errors
//!
//! A [`Filter`] runs a chain of [`Processor`]s over the errors found in a
//! package. Each processor may remove errors; removed errors are kept
//! apart so callers can still report them.
//!
//! Copyright (c) 2025 Specado Team
//! Licensed under the Apache-2.0 license

use crate::package::PackageFs;
use crate::validation::error::{StructuredError, ValidationErrors, UNASSIGNED_CODE};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Name of the filter configuration file at the package root.
pub const CONFIG_FILE_NAME: &str = "validation.yml";

#[derive(Debug, Error)]
pub enum FilterError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_yaml::Error,
    },

    #[error("invalid exclude pattern '{pattern}': {source}")]
    Pattern {
        pattern: String,
        source: regex::Error,
    },

    #[error("processor {name} failed: {reason}")]
    Processor { name: String, reason: String },
}

/// Outcome of a single processor
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessResult {
    pub processed: ValidationErrors,
    pub removed: ValidationErrors,
}

/// A named step of the filter chain
pub trait Processor: Send + Sync {
    fn name(&self) -> &str;

    fn process(&self, errors: ValidationErrors) -> Result<ProcessResult, FilterError>;
}

/// Removes the errors with a given code
#[derive(Debug, Clone)]
pub struct ExcludeCheck {
    code: String,
}

impl ExcludeCheck {
    pub fn new<C: Into<String>>(code: C) -> Self {
        Self { code: code.into() }
    }
}

impl Processor for ExcludeCheck {
    fn name(&self) -> &str {
        "exclude-checks"
    }

    fn process(&self, errors: ValidationErrors) -> Result<ProcessResult, FilterError> {
        if self.code == UNASSIGNED_CODE {
            return Ok(ProcessResult {
                processed: errors,
                removed: ValidationErrors::new(),
            });
        }

        let (processed, removed) = errors.collect(|e| e.is_unassigned() || e.code() != self.code);
        Ok(ProcessResult { processed, removed })
    }
}

/// Removes the errors whose message matches a regular expression
///
/// Unassigned errors are protected the same way as with [`ExcludeCheck`].
#[derive(Debug, Clone)]
pub struct ExcludePattern {
    pattern: Regex,
}

impl ExcludePattern {
    pub fn new(pattern: &str) -> Result<Self, FilterError> {
        let pattern = Regex::new(pattern).map_err(|source| FilterError::Pattern {
            pattern: pattern.to_string(),
            source,
        })?;
        Ok(Self { pattern })
    }
}

impl Processor for ExcludePattern {
    fn name(&self) -> &str {
        "exclude-patterns"
    }

    fn process(&self, errors: ValidationErrors) -> Result<ProcessResult, FilterError> {
        let (processed, removed) =
            errors.collect(|e: &StructuredError| e.is_unassigned() || !self.pattern.is_match(&e.message));
        Ok(ProcessResult { processed, removed })
    }
}

/// Errors left after filtering, and the ones filtered out
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FilterResult {
    pub processed: ValidationErrors,
    pub removed: ValidationErrors,
}

/// A processor failed; carries the errors as they were before filtering
#[derive(Debug, Error)]
#[error("{source}")]
pub struct FilterFailure {
    pub unfiltered: ValidationErrors,
    pub source: FilterError,
}

/// Chain of processors applied in order
#[derive(Default)]
pub struct Filter {
    processors: Vec<Box<dyn Processor>>,
}

impl std::fmt::Debug for Filter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.processors.iter().map(|p| p.name()).collect();
        f.debug_struct("Filter").field("processors", &names).finish()
    }
}

impl Filter {
    /// Build the processor chain described by a filter configuration
    pub fn new(config: &ConfigFilter) -> Result<Self, FilterError> {
        let mut processors: Vec<Box<dyn Processor>> = Vec::new();
        for code in &config.errors.exclude_checks {
            processors.push(Box::new(ExcludeCheck::new(code.clone())));
        }
        for pattern in &config.errors.exclude_patterns {
            processors.push(Box::new(ExcludePattern::new(pattern)?));
        }
        Ok(Self { processors })
    }

    pub fn add_processors<I>(&mut self, processors: I)
    where
        I: IntoIterator<Item = Box<dyn Processor>>,
    {
        self.processors.extend(processors);
    }

    pub fn len(&self) -> usize {
        self.processors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.processors.is_empty()
    }

    pub fn run(&self, errors: ValidationErrors) -> Result<FilterResult, FilterFailure> {
        let mut current = errors.clone();
        let mut removed = ValidationErrors::new();

        for processor in &self.processors {
            match processor.process(current) {
                Ok(result) => {
                    debug!(
                        processor = processor.name(),
                        removed = result.removed.len(),
                        "Applied error processor"
                    );
                    current = result.processed;
                    removed.append(result.removed);
                }
                Err(source) => {
                    return Err(FilterFailure {
                        unfiltered: errors,
                        source,
                    })
                }
            }
        }

        Ok(FilterResult {
            processed: current,
            removed,
        })
    }
}

/// Contents of a filter configuration file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigFilter {
    #[serde(default)]
    pub errors: ProcessorsConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessorsConfig {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exclude_checks: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exclude_patterns: Vec<String>,
}

impl ConfigFilter {
    /// Read `validation.yml` from the root of a package
    pub fn load(package: &PackageFs) -> Result<Self, FilterError> {
        Self::load_named(package, CONFIG_FILE_NAME)
    }

    /// Read a filter configuration stored inside a package
    pub fn load_named(package: &PackageFs, name: &str) -> Result<Self, FilterError> {
        let path = PathBuf::from(package.path(&[name]));
        match package.read_to_string(name) {
            Ok(data) => Self::parse(&data, path),
            Err(source) => Err(FilterError::Read { path, source }),
        }
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, FilterError> {
        let path = path.as_ref();
        let data = fs::read_to_string(path).map_err(|source| FilterError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&data, path.to_path_buf())
    }

    fn parse(data: &str, path: PathBuf) -> Result<Self, FilterError> {
        serde_yaml::from_str(data).map_err(|source| FilterError::Parse { path, source })
    }
}
