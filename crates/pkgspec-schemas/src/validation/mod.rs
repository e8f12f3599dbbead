//! Validation of packages against resolved spec trees
//!
//! This module provides:
//! - **Structured errors**: findings with a code, a severity and a file
//! - **Per-file checks**: size limits, media types and content schemas
//! - **Structural validation**: the walk of a package directory
//! - **Filtering**: configurable removal of findings by code or message
//!
//! Copyright (c) 2025 Specado Team
//! Licensed under the Apache-2.0 license

pub mod error;
pub mod file;
pub mod filter;
pub mod folder;

pub use error::{
    Severity, StructuredError, ValidationErrors, CODE_KIBANA_DANGLING_OBJECT_IDS,
    CODE_KIBANA_DASHBOARD_WITHOUT_FILTER, CODE_KIBANA_DASHBOARD_WITH_QUERY_BUT_NO_FILTER,
    CODE_KIBANA_LEGACY_VISUALIZATIONS, CODE_NON_GA_SPEC_ON_GA_PACKAGE,
    CODE_PRERELEASE_FEATURE_ON_GA_PACKAGE, UNASSIGNED_CODE,
};
pub use file::validate_file;
pub use filter::{
    ConfigFilter, ExcludeCheck, ExcludePattern, Filter, FilterError, FilterFailure, FilterResult,
    ProcessResult, Processor, ProcessorsConfig, CONFIG_FILE_NAME,
};
pub use folder::{validate_package_structure, FolderValidator};
