//! Command handlers for CLI subcommands
//!
//! This module contains the implementation logic for each CLI subcommand.

mod completions;
mod spec;
mod validate;

pub use completions::handle_completions;
pub use spec::handle_spec;
pub use validate::handle_validate;

use crate::config::Config;
use std::path::{Path, PathBuf};

/// Root of the specification tree: command line first, then configuration
fn resolve_spec_dir(arg: Option<&Path>, config: &Config) -> PathBuf {
    arg.map(Path::to_path_buf)
        .unwrap_or_else(|| config.paths.spec_dir.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_spec_dir() {
        let mut config = Config::default();
        config.paths.spec_dir = PathBuf::from("/opt/spec");

        assert_eq!(resolve_spec_dir(None, &config), PathBuf::from("/opt/spec"));
        assert_eq!(
            resolve_spec_dir(Some(Path::new("local/spec")), &config),
            PathBuf::from("local/spec")
        );
    }
}
