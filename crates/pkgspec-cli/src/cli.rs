//! Command-line interface argument parsing and definitions
//!
//! This module defines the CLI structure using clap's derive API,
//! providing a type-safe and well-documented command interface.

use clap::{Parser, Subcommand, ValueEnum};
use std::io::IsTerminal;
use std::path::PathBuf;

/// pkgspec - validate packages against a versioned package specification
///
/// Checks that a package folder matches the files, folders, size limits
/// and content schemas declared by the specification of its type.
#[derive(Parser, Debug)]
#[command(
    name = "pkgspec",
    version,
    author,
    about,
    long_about = None,
    propagate_version = true,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Enable verbose output (can be used multiple times for increased verbosity)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all non-essential output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Path to configuration file
    #[arg(short, long, global = true, env = "PKGSPEC_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output format for results [default: human]
    #[arg(short, long, value_enum, global = true)]
    pub output: Option<OutputFormat>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// The subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Validate a package folder against the specification
    Validate(ValidateArgs),

    /// Print the resolved spec tree of a package type
    Spec(SpecArgs),

    /// Generate shell completions for the specified shell
    Completions(CompletionsArgs),
}

/// Arguments for the validate command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to the package folder or zip file
    #[arg(value_name = "PACKAGE")]
    pub package: PathBuf,

    /// Root of the specification tree
    #[arg(long, env = "PKGSPEC_SPEC_DIR")]
    pub spec_dir: Option<PathBuf>,

    /// Filter configuration to use instead of the package's own
    #[arg(long, value_name = "FILE", conflicts_with = "no_filter")]
    pub filter: Option<PathBuf>,

    /// Report every error, without filtering
    #[arg(long)]
    pub no_filter: bool,

    /// Also report the errors removed by the filter
    #[arg(long)]
    pub show_filtered: bool,

    /// Report warnings as errors, as PACKAGE_SPEC_WARNINGS_AS_ERRORS does
    #[arg(long)]
    pub warnings_as_errors: bool,
}

/// Arguments for the spec command
#[derive(Parser, Debug)]
pub struct SpecArgs {
    /// Package type, e.g. integration or input
    #[arg(value_name = "TYPE")]
    pub package_type: String,

    /// Root of the specification tree
    #[arg(long, env = "PKGSPEC_SPEC_DIR")]
    pub spec_dir: Option<PathBuf>,

    /// Spec version to resolve patches for
    #[arg(long, value_name = "VERSION", default_value = "3.0.0")]
    pub spec_version: String,
}

/// Arguments for generating shell completions
#[derive(Parser, Debug)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}

/// Output format options
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable formatted output
    Human,
    /// JSON output
    Json,
    /// YAML output
    Yaml,
    /// Pretty-printed JSON output
    JsonPretty,
}

/// Supported shells for completion generation
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}

impl Cli {
    /// Parse command-line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Get the effective verbosity level (considering quiet flag)
    pub fn verbosity_level(&self) -> u8 {
        if self.quiet {
            0
        } else {
            self.verbose
        }
    }

    /// Output format from the command line, then the configuration file
    pub fn output_format(&self, configured: &str) -> OutputFormat {
        self.output
            .or_else(|| OutputFormat::from_str(configured, true).ok())
            .unwrap_or(OutputFormat::Human)
    }

    /// Check if colored output should be used
    pub fn use_color(&self) -> bool {
        !self.no_color && std::io::stdout().is_terminal()
    }
}

impl Shell {
    /// Convert to clap_complete shell type
    pub fn to_clap_shell(self) -> clap_complete::Shell {
        match self {
            Shell::Bash => clap_complete::Shell::Bash,
            Shell::Zsh => clap_complete::Shell::Zsh,
            Shell::Fish => clap_complete::Shell::Fish,
            Shell::PowerShell => clap_complete::Shell::PowerShell,
            Shell::Elvish => clap_complete::Shell::Elvish,
        }
    }
}
