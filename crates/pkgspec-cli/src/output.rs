//! Output formatting and writing utilities
//!
//! This module provides utilities for formatting and writing output
//! in various formats (JSON, YAML, human-readable) with specialized
//! support for validation reports, spec trees and progress indicators.

use crate::cli::OutputFormat;
use crate::error::Result;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use pkgspec_schemas::{ItemSpec, Severity, ValidationErrors};
use serde::Serialize;
use std::io::{self, IsTerminal, Write};
use std::time::Duration;
use tracing::trace;

/// Outcome of validating one package, as reported to the user
#[derive(Debug, Clone, Serialize)]
pub struct ValidationReport {
    pub package: String,
    pub valid: bool,
    pub errors: ValidationErrors,
    /// Errors removed by the filter, when requested
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filtered: Option<ValidationErrors>,
}

/// Trait for formatting output with specialized support for common types
pub trait OutputFormatter {
    /// Format a serializable value
    fn format<T: Serialize>(&self, value: &T) -> Result<String>;

    /// Format the report of a package validation
    fn format_validation_report(&self, report: &ValidationReport) -> Result<String>;

    /// Format a resolved spec tree
    fn format_spec_tree(&self, root: &ItemSpec) -> Result<String>;
}

impl OutputFormatter for OutputFormat {
    fn format<T: Serialize>(&self, value: &T) -> Result<String> {
        match self {
            OutputFormat::Json => Ok(serde_json::to_string(value)?),
            OutputFormat::JsonPretty => Ok(serde_json::to_string_pretty(value)?),
            OutputFormat::Yaml => Ok(serde_yaml::to_string(value)?),
            // Structured data has no better human rendering than YAML
            OutputFormat::Human => Ok(serde_yaml::to_string(value)?),
        }
    }

    fn format_validation_report(&self, report: &ValidationReport) -> Result<String> {
        match self {
            OutputFormat::Human => Ok(format_validation_report_human(report)),
            _ => self.format(report),
        }
    }

    fn format_spec_tree(&self, root: &ItemSpec) -> Result<String> {
        match self {
            OutputFormat::Human => Ok(format_spec_tree_human(root)),
            _ => self.format(root),
        }
    }
}

/// Output writer that handles different output formats and colors
pub struct OutputWriter {
    format: OutputFormat,
    use_color: bool,
    show_progress: bool,
    quiet: bool,
    writer: Box<dyn Write>,
}

impl OutputWriter {
    /// Create a new output writer
    pub fn new(format: OutputFormat, use_color: bool, quiet: bool) -> Self {
        Self {
            format,
            use_color,
            show_progress: !quiet && format == OutputFormat::Human && io::stderr().is_terminal(),
            quiet,
            writer: Box::new(io::stdout()),
        }
    }

    /// Create an output writer with a custom writer
    pub fn with_writer(
        format: OutputFormat,
        use_color: bool,
        quiet: bool,
        writer: Box<dyn Write>,
    ) -> Self {
        Self {
            format,
            use_color,
            show_progress: false, // No progress bars with custom writers
            quiet,
            writer,
        }
    }

    /// Write raw output
    pub fn write(&mut self, content: &str) -> Result<()> {
        write!(self.writer, "{}", content)?;
        self.writer.flush()?;
        Ok(())
    }

    /// Write a line of output
    pub fn writeln(&mut self, content: &str) -> Result<()> {
        writeln!(self.writer, "{}", content)?;
        self.writer.flush()?;
        Ok(())
    }

    /// Write an info message
    pub fn info(&mut self, message: &str) -> Result<()> {
        if self.quiet || self.format != OutputFormat::Human {
            return Ok(());
        }

        if self.use_color {
            self.writeln(&format!("{} {}", "ℹ".blue(), message))
        } else {
            self.writeln(&format!("INFO: {}", message))
        }
    }

    /// Write a success message
    pub fn success(&mut self, message: &str) -> Result<()> {
        if self.quiet || self.format != OutputFormat::Human {
            return Ok(());
        }

        if self.use_color {
            self.writeln(&message.green().to_string())
        } else {
            self.writeln(message)
        }
    }

    /// Write an error message
    pub fn error(&mut self, message: &str) -> Result<()> {
        if self.format != OutputFormat::Human {
            return Ok(());
        }

        if self.use_color {
            self.writeln(&message.red().to_string())
        } else {
            self.writeln(&format!("ERROR: {}", message))
        }
    }

    /// Write a validation report with specialized formatting
    pub fn validation_report(&mut self, report: &ValidationReport) -> Result<()> {
        if self.format == OutputFormat::Human {
            if report.valid {
                self.success(&format!("✓ Package {} is valid", report.package))?;
            } else {
                self.error(&format!("✗ Package {} is invalid", report.package))?;
            }
            if self.quiet && report.valid {
                return Ok(());
            }
        }

        let formatted = self.format.format_validation_report(report)?;
        self.write_formatted(&formatted)
    }

    /// Write a resolved spec tree
    pub fn spec_tree(&mut self, root: &ItemSpec) -> Result<()> {
        let formatted = self.format.format_spec_tree(root)?;
        self.write_formatted(&formatted)
    }

    /// Create a spinner for indeterminate progress
    pub fn spinner(&self, message: &str) -> Option<ProgressBar> {
        if !self.show_progress {
            return None;
        }

        let pb = ProgressBar::new_spinner();
        pb.set_style(default_spinner_style());
        pb.set_message(message.to_string());
        pb.enable_steady_tick(Duration::from_millis(100));
        Some(pb)
    }

    fn write_formatted(&mut self, formatted: &str) -> Result<()> {
        trace!(bytes = formatted.len(), "Writing formatted output");
        if formatted.is_empty() {
            return Ok(());
        }
        if formatted.ends_with('\n') {
            self.write(formatted)
        } else {
            self.writeln(formatted)
        }
    }
}

/// Helper function to create a spinner style
pub fn default_spinner_style() -> ProgressStyle {
    ProgressStyle::default_spinner()
        .template("{spinner:.green} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
}

/// Format a validation report for human reading
fn format_validation_report_human(report: &ValidationReport) -> String {
    let mut output = String::new();

    if !report.errors.is_empty() {
        output.push_str(&format_errors_human(&report.errors));
    }

    if let Some(filtered) = &report.filtered {
        if !filtered.is_empty() {
            output.push_str(&format!("\nFiltered out {} error(s):\n", filtered.len()));
            output.push_str(&format_errors_human(filtered));
        }
    }

    output
}

fn format_errors_human(errors: &ValidationErrors) -> String {
    let mut output = String::new();
    let word = if errors.len() == 1 { "error" } else { "errors" };
    output.push_str(&format!("found {} validation {}:\n", errors.len(), word));

    for (i, error) in errors.iter().enumerate() {
        let marker = match error.severity {
            Severity::Critical => "",
            Severity::Warning => "[warning] ",
        };
        output.push_str(&format!("{:4}. {}{}\n", i + 1, marker, error));
    }

    output
}

/// Format a spec tree as an indented outline
fn format_spec_tree_human(root: &ItemSpec) -> String {
    let mut output = String::new();
    write_item_human(&mut output, root, 0);
    output
}

fn write_item_human(output: &mut String, item: &ItemSpec, depth: usize) {
    let label = if !item.name.is_empty() {
        item.name.clone()
    } else if !item.pattern.is_empty() {
        format!("/{}/", item.pattern)
    } else {
        ".".to_string()
    };

    let mut notes = vec![item.item_type.to_string()];
    if item.required {
        notes.push("required".to_string());
    }
    if !item.release.is_empty() {
        notes.push(item.release.clone());
    }
    if item.development_folder {
        notes.push("development".to_string());
    }
    if !item.limits.size_limit.is_zero() {
        notes.push(format!("size <= {}", item.limits.size_limit));
    }
    if item.schema.is_some() {
        notes.push("schema".to_string());
    }

    output.push_str(&format!("{}{} ({})\n", "  ".repeat(depth), label, notes.join(", ")));
    for child in &item.contents {
        write_item_human(output, child, depth + 1);
    }
}

#[cfg(test)]
mod tests {
    include!("output/tests.rs");
}
