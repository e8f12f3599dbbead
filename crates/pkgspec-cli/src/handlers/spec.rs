//! Spec tree command handler

use super::resolve_spec_dir;
use crate::cli::SpecArgs;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::logging::timing::Timer;
use crate::output::OutputWriter;
use pkgspec_schemas::{PackageVersion, Spec};
use tracing::{info, instrument};

/// Handle the spec command
#[instrument(skip(config, output), fields(package_type = %args.package_type))]
pub fn handle_spec(args: SpecArgs, config: &Config, output: &mut OutputWriter) -> Result<()> {
    let _timer = Timer::with_details("spec_command", &args.package_type);

    let version = PackageVersion::parse(&args.spec_version)
        .map_err(|e| Error::invalid_args(format!("invalid spec version '{}': {}", args.spec_version, e)))?;
    let spec_dir = resolve_spec_dir(args.spec_dir.as_deref(), config);

    let spec = Spec::new(&spec_dir, version)?;
    let root = spec.load_root_spec(&args.package_type)?;
    info!(spec_version = %spec.spec_version(), "Loaded spec tree");

    output.spec_tree(&root)
}
