//! Validation command handler

use super::resolve_spec_dir;
use crate::cli::ValidateArgs;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::logging::timing::Timer;
use crate::output::{OutputWriter, ValidationReport};
use pkgspec_schemas::{ConfigFilter, Filter, Package, Spec, ValidationErrors};
use std::path::Path;
use tracing::{debug, info, instrument, warn};

/// Handle the validate command
#[instrument(skip(config, output), fields(package = %args.package.display()))]
pub fn handle_validate(args: ValidateArgs, config: &Config, output: &mut OutputWriter) -> Result<()> {
    let _timer = Timer::with_details("validate_command", &format!("package: {}", args.package.display()));
    let spec_dir = resolve_spec_dir(args.spec_dir.as_deref(), config);
    output.info(&format!("Validating package: {}", args.package.display()))?;

    let spinner = output.spinner("Validating package");
    let package = open_package(&args.package)?;
    let errors = {
        let _validation_timer = Timer::new("package_validation");
        let mut spec = Spec::new(&spec_dir, package.spec_version.clone())?;
        if args.warnings_as_errors {
            spec = spec.with_warnings_as_errors(true);
        }
        spec.validate_package(&package)
    };
    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }
    info!(errors = errors.len(), "Package validated");

    let (processed, removed) = apply_filter(&args, config, &package, errors)?;

    let show_filtered = args.show_filtered || config.validation.show_filtered;
    let report = ValidationReport {
        package: args.package.display().to_string(),
        valid: processed.is_empty(),
        errors: processed,
        filtered: show_filtered.then_some(removed),
    };
    output.validation_report(&report)?;

    if report.valid {
        Ok(())
    } else {
        Err(Error::ValidationFailed {
            count: report.errors.len(),
        })
    }
}

/// Open a package folder, or a zipped package when given a file.
fn open_package(path: &Path) -> Result<Package> {
    if path.is_file() {
        debug!(path = %path.display(), "Opening zipped package");
        return Ok(Package::open_zip(path)?);
    }
    Ok(Package::open(path)?)
}

/// Run the filter configuration that applies to this package.
///
/// An explicit `--filter` file must exist; the package's own
/// configuration is optional.
fn apply_filter(
    args: &ValidateArgs,
    config: &Config,
    package: &Package,
    errors: ValidationErrors,
) -> Result<(ValidationErrors, ValidationErrors)> {
    if args.no_filter || !config.validation.apply_filter {
        debug!("Filtering disabled");
        return Ok((errors, ValidationErrors::new()));
    }

    let filter_config = match &args.filter {
        Some(path) => ConfigFilter::from_file(path)?,
        None => {
            let name = config.validation.filter_config_name.as_str();
            if !package.fs().is_file(name) {
                debug!(path = %package.path(&[name]), "No filter configuration in package");
                return Ok((errors, ValidationErrors::new()));
            }
            ConfigFilter::load_named(package.fs(), name)?
        }
    };

    let filter = Filter::new(&filter_config)?;
    match filter.run(errors) {
        Ok(result) => {
            debug!(removed = result.removed.len(), "Filter applied");
            Ok((result.processed, result.removed))
        }
        Err(failure) => {
            warn!(
                error = %failure.source,
                unfiltered = failure.unfiltered.len(),
                "Filter failed"
            );
            Err(failure.source.into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::OutputFormat;
    use std::fs;
    use std::io::Write;
    use std::path::PathBuf;
    use tempfile::TempDir;
    use zip::write::SimpleFileOptions;

    const ROOT_SPEC: &str = r#"
spec:
  type: folder
  contents:
    - type: file
      name: manifest.yml
      required: true
    - type: file
      name: changelog.yml
    - type: file
      name: validation.yml
    - type: folder
      name: agent
      release: beta
      additionalContents: true
    - type: folder
      name: docs
      required: true
      contents:
        - type: file
          pattern: '^.+\.md$'
"#;

    fn fixtures() -> (TempDir, PathBuf, PathBuf) {
        let dir = TempDir::new().unwrap();
        let spec_dir = dir.path().join("spec");
        fs::create_dir_all(spec_dir.join("integration")).unwrap();
        fs::write(spec_dir.join("integration/spec.yml"), ROOT_SPEC).unwrap();

        let package = dir.path().join("nginx");
        fs::create_dir_all(package.join("docs")).unwrap();
        fs::write(
            package.join("manifest.yml"),
            "name: nginx\ntype: integration\nversion: 1.0.0\nformat_version: 3.0.0\n",
        )
        .unwrap();
        fs::write(package.join("changelog.yml"), "- version: 1.0.0\n").unwrap();
        fs::write(package.join("docs/README.md"), "# nginx\n").unwrap();
        (dir, spec_dir, package)
    }

    fn args(package: &Path, spec_dir: &Path) -> ValidateArgs {
        ValidateArgs {
            package: package.to_path_buf(),
            spec_dir: Some(spec_dir.to_path_buf()),
            filter: None,
            no_filter: false,
            show_filtered: false,
            warnings_as_errors: false,
        }
    }

    fn output() -> OutputWriter {
        OutputWriter::with_writer(OutputFormat::Json, false, false, Box::new(std::io::sink()))
    }

    #[test]
    fn test_valid_package() {
        let (_dir, spec_dir, package) = fixtures();
        handle_validate(args(&package, &spec_dir), &Config::default(), &mut output()).unwrap();
    }

    #[test]
    fn test_invalid_package_exit_code() {
        let (_dir, spec_dir, package) = fixtures();
        fs::remove_file(package.join("docs/README.md")).unwrap();
        fs::write(package.join("docs/notes.txt"), "notes").unwrap();

        let err = handle_validate(args(&package, &spec_dir), &Config::default(), &mut output()).unwrap_err();
        assert!(matches!(err, Error::ValidationFailed { count: 1 }));
        assert_eq!(err.exit_code(), 7);
    }

    #[test]
    fn test_missing_package() {
        let (dir, spec_dir, _) = fixtures();
        let err = handle_validate(args(&dir.path().join("missing"), &spec_dir), &Config::default(), &mut output())
            .unwrap_err();
        assert_eq!(err.exit_code(), 3);
    }

    #[test]
    fn test_package_filter_configuration() {
        let (_dir, spec_dir, package) = fixtures();
        fs::create_dir(package.join("agent")).unwrap();
        let config = Config::default();

        fs::write(package.join("validation.yml"), "errors:\n  exclude_checks:\n    - SVR00001\n").unwrap();
        let err = handle_validate(args(&package, &spec_dir), &config, &mut output()).unwrap_err();
        assert!(matches!(err, Error::ValidationFailed { count: 1 }));

        fs::write(package.join("validation.yml"), "errors:\n  exclude_checks:\n    - PSR00001\n").unwrap();
        handle_validate(args(&package, &spec_dir), &config, &mut output()).unwrap();

        let mut unfiltered = args(&package, &spec_dir);
        unfiltered.no_filter = true;
        assert!(handle_validate(unfiltered, &config, &mut output()).is_err());

        let mut disabled = Config::default();
        disabled.validation.apply_filter = false;
        assert!(handle_validate(args(&package, &spec_dir), &disabled, &mut output()).is_err());
    }

    #[test]
    fn test_unassigned_errors_survive_filtering() {
        let (_dir, spec_dir, package) = fixtures();
        fs::write(package.join("docs/notes.txt"), "notes").unwrap();
        fs::write(
            package.join("validation.yml"),
            "errors:\n  exclude_patterns:\n    - 'notes'\n",
        )
        .unwrap();

        let err = handle_validate(args(&package, &spec_dir), &Config::default(), &mut output()).unwrap_err();
        assert!(matches!(err, Error::ValidationFailed { count: 1 }));
    }

    #[test]
    fn test_explicit_filter_must_exist() {
        let (dir, spec_dir, package) = fixtures();
        let mut with_filter = args(&package, &spec_dir);
        with_filter.filter = Some(dir.path().join("missing.yml"));

        let err = handle_validate(with_filter, &Config::default(), &mut output()).unwrap_err();
        assert_eq!(err.exit_code(), 5);
    }

    fn zip_package(source: &Path, target: &Path) {
        let mut writer = zip::ZipWriter::new(fs::File::create(target).unwrap());
        let mut pending = vec![PathBuf::new()];
        while let Some(relative) = pending.pop() {
            for entry in fs::read_dir(source.join(&relative)).unwrap() {
                let entry = entry.unwrap();
                let name = relative.join(entry.file_name());
                let zip_name = format!("nginx/{}", name.to_string_lossy().replace('\\', "/"));
                if entry.file_type().unwrap().is_dir() {
                    pending.push(name);
                } else {
                    writer.start_file(zip_name, SimpleFileOptions::default()).unwrap();
                    writer.write_all(&fs::read(entry.path()).unwrap()).unwrap();
                }
            }
        }
        writer.finish().unwrap();
    }

    #[test]
    fn test_zipped_package() {
        let (dir, spec_dir, package) = fixtures();
        fs::write(
            package.join("validation.yml"),
            "errors:\n  exclude_checks:\n    - PSR00001\n",
        )
        .unwrap();
        let zipped = dir.path().join("nginx-1.0.0.zip");
        zip_package(&package, &zipped);

        handle_validate(args(&zipped, &spec_dir), &Config::default(), &mut output()).unwrap();

        fs::write(package.join("docs/notes.txt"), "notes").unwrap();
        zip_package(&package, &zipped);
        let err = handle_validate(args(&zipped, &spec_dir), &Config::default(), &mut output()).unwrap_err();
        assert!(matches!(err, Error::ValidationFailed { count: 1 }));
    }

    #[test]
    fn test_warnings_as_errors_flag() {
        let (_dir, spec_dir, package) = fixtures();
        fs::write(
            package.join("manifest.yml"),
            "name: nginx\ntype: integration\nversion: 1.0.0-beta1\nformat_version: 3.0.0\n",
        )
        .unwrap();
        fs::write(package.join("changelog.yml"), "- version: 1.0.0-beta1\n").unwrap();
        fs::create_dir(package.join("agent")).unwrap();

        let mut strict = args(&package, &spec_dir);
        strict.no_filter = true;
        strict.warnings_as_errors = true;
        let err = handle_validate(strict, &Config::default(), &mut output()).unwrap_err();
        assert!(matches!(err, Error::ValidationFailed { count: 1 }));
    }
}
