//! End-to-end tests for package validation
//!
//! These tests build specification directories and packages on disk and
//! run them through the loader, the structural validator, the semantic
//! rules and the filter.

use pkgspec_schemas::validation::CODE_PRERELEASE_FEATURE_ON_GA_PACKAGE;
use pkgspec_schemas::{
    validate_package_structure, ConfigFilter, FileSize, Filter, FolderSpecLoader, ItemSpec, Package,
    PackageFs, PackageVersion, Spec, StructuredError, ValidationErrors,
};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const ROOT_SPEC: &str = r#"
spec:
  type: folder
  totalSizeLimit: 50MB
  sizeLimit: 3MB
  configurationSizeLimit: 5MB
  relativePathSizeLimit: 3MB
  contents:
    - description: The main package manifest file
      type: file
      contentMediaType: "application/x-yaml"
      name: "manifest.yml"
      required: true
      $ref: "./manifest.spec.yml"
    - type: file
      name: changelog.yml
      contentMediaType: "application/x-yaml"
      required: true
    - type: folder
      name: docs
      required: true
      $ref: "./docs/spec.yml"
    - type: folder
      name: img
      additionalContents: true
    - type: folder
      name: _dev
      developmentFolder: true
      contents:
        - type: file
          pattern: '^.+\.yml$'
    - type: folder
      name: agent
      release: beta
      additionalContents: true
    - type: file
      name: validation.yml
versions:
  - before: 3.0.0
    patch:
      - op: remove
        path: /contents/5
"#;

const MANIFEST_SPEC: &str = r#"
spec:
  type: object
  required: [format_version, name, type, version, icons]
  properties:
    format_version:
      type: string
    name:
      type: string
      pattern: "^[a-z0-9_]+$"
    type:
      type: string
      enum: [integration]
    version:
      type: string
    icons:
      type: array
      items:
        type: object
        required: [src]
        properties:
          src:
            type: string
            format: relative-path
"#;

const DOCS_SPEC: &str = r#"
spec:
  additionalContents: false
  contents:
    - type: file
      pattern: '^.+\.md$'
      contentMediaType: "text/markdown"
      forbiddenPatterns: ['^_']
      required: true
"#;

fn write_files(root: &Path, files: &[(&str, &[u8])]) {
    for (name, content) in files {
        let path = root.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }
}

fn spec_dir() -> TempDir {
    let dir = TempDir::new().unwrap();
    write_files(
        dir.path(),
        &[
            ("integration/spec.yml", ROOT_SPEC.as_bytes()),
            ("integration/manifest.spec.yml", MANIFEST_SPEC.as_bytes()),
            ("integration/docs/spec.yml", DOCS_SPEC.as_bytes()),
        ],
    );
    dir
}

fn manifest(version: &str, format_version: &str, icon: &str) -> String {
    format!(
        "format_version: {}\nname: nginx\ntitle: Nginx\nversion: {}\ntype: integration\nicons:\n  - src: {}\n",
        format_version, version, icon
    )
}

fn valid_package(version: &str, format_version: &str) -> TempDir {
    let dir = TempDir::new().unwrap();
    write_files(
        dir.path(),
        &[
            ("manifest.yml", manifest(version, format_version, "img/icon.svg").as_bytes()),
            (
                "changelog.yml",
                format!("- version: \"{}\"\n  changes:\n    - description: initial\n", version).as_bytes(),
            ),
            ("docs/README.md", b"# Nginx\n"),
            ("img/icon.svg", b"<svg/>"),
            ("_dev/build.yml", &[b'#'; 4096]),
        ],
    );
    dir
}

fn validate(spec_dir: &Path, package_dir: &Path) -> ValidationErrors {
    let package = Package::open(package_dir).unwrap();
    Spec::new(spec_dir, package.spec_version.clone())
        .unwrap()
        .validate_package(&package)
}

fn messages(errors: &ValidationErrors) -> Vec<String> {
    errors.iter().map(|e| e.message.clone()).collect()
}

#[cfg(test)]
mod full_packages {
    use super::*;

    #[test]
    fn test_valid_package() {
        let specs = spec_dir();
        let package = valid_package("1.0.0", "3.0.0");

        let errors = validate(specs.path(), package.path());
        assert!(errors.is_empty(), "{}", errors);
    }

    #[test]
    fn test_content_schema_findings_name_the_file() {
        let specs = spec_dir();
        let package = valid_package("1.0.0", "3.0.0");
        write_files(
            package.path(),
            &[("manifest.yml", manifest("1.0.0", "3.0.0", "img/missing.svg").as_bytes())],
        );

        let errors = validate(specs.path(), package.path());
        assert_eq!(
            messages(&errors),
            vec![format!(
                "file \"{}\" is invalid: field icons.0.src: relative path is invalid, target doesn't exist or it exceeds the file size limit",
                package.path().join("manifest.yml").display()
            )]
        );
        assert_eq!(errors.errors[0].file.as_deref(), Some("manifest.yml"));
    }

    #[test]
    fn test_referenced_folder_spec() {
        let specs = spec_dir();
        let package = valid_package("1.0.0", "3.0.0");
        write_files(package.path(), &[("docs/_draft.md", b"draft"), ("docs/notes.txt", b"notes")]);

        let errors = validate(specs.path(), package.path());
        let docs = package.path().join("docs");
        assert_eq!(
            messages(&errors),
            vec![
                format!("item [_draft.md] is not allowed in folder [{}]", docs.display()),
                format!("item [notes.txt] is not allowed in folder [{}]", docs.display()),
            ]
        );
    }

    #[test]
    fn test_beta_folder_depends_on_package_version() {
        let specs = spec_dir();

        let package = valid_package("1.0.0", "3.0.0");
        write_files(package.path(), &[("agent/input.yml.hbs", b"{{x}}")]);
        let errors = validate(specs.path(), package.path());
        assert_eq!(errors.len(), 1);
        assert!(errors.errors[0].is_unassigned());
        assert!(errors.errors[0]
            .message
            .ends_with("defines beta features which can't be enabled for packages with a stable semantic version"));

        let package = valid_package("1.0.0-beta1", "3.0.0");
        write_files(package.path(), &[("agent/input.yml.hbs", b"{{x}}")]);
        let errors = validate(specs.path(), package.path());
        assert!(errors.is_empty(), "{}", errors);
    }

    #[test]
    fn test_version_patches_follow_format_version() {
        let specs = spec_dir();
        let package = valid_package("0.9.0", "2.3.0");
        write_files(package.path(), &[("agent/input.yml.hbs", b"{{x}}")]);

        let errors = validate(specs.path(), package.path());
        assert_eq!(
            messages(&errors),
            vec![format!(
                "item [agent] is not allowed in folder [{}]",
                package.path().display()
            )]
        );
    }

    #[test]
    fn test_development_folder_is_not_accounted() {
        let specs = spec_dir();
        let package = valid_package("1.0.0", "3.0.0");
        let mut root = FolderSpecLoader::new(None, PackageVersion::new(3, 0, 0))
            .load_package_type(specs.path(), "integration")
            .unwrap();
        root.limits.total_size_limit = FileSize::kilobytes(1);

        let pkg = Package::open(package.path()).unwrap();
        let errors = validate_package_structure(&pkg, &root);
        assert!(errors.is_empty(), "{}", errors);
    }

    #[test]
    fn test_filter_from_package_config() {
        let specs = spec_dir();
        let config: &[u8] = b"errors:\n  exclude_checks:\n    - PSR00001\n";

        // Beta features on a stable package can't be filtered out.
        let package = valid_package("1.0.0", "3.0.0");
        write_files(
            package.path(),
            &[("agent/input.yml.hbs", b"{{x}}"), ("validation.yml", config)],
        );
        let pkg = Package::open(package.path()).unwrap();
        let errors = Spec::new(specs.path(), pkg.spec_version.clone())
            .unwrap()
            .validate_package(&pkg);
        assert_eq!(errors.len(), 1);

        let filter = Filter::new(&ConfigFilter::load(pkg.fs()).unwrap()).unwrap();
        let result = filter.run(errors).unwrap();
        assert_eq!(result.processed.len(), 1);
        assert!(result.removed.is_empty());

        // Escalated warnings on a prerelease package carry a code.
        let package = valid_package("1.0.0-beta1", "3.0.0");
        write_files(
            package.path(),
            &[("agent/input.yml.hbs", b"{{x}}"), ("validation.yml", config)],
        );
        let pkg = Package::open(package.path()).unwrap();
        let spec = Spec::new(specs.path(), pkg.spec_version.clone()).unwrap();
        assert!(spec.clone().with_warnings_as_errors(false).validate_package(&pkg).is_empty());

        let errors = spec.with_warnings_as_errors(true).validate_package(&pkg);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors.errors[0].code(), CODE_PRERELEASE_FEATURE_ON_GA_PACKAGE);

        let filter = Filter::new(&ConfigFilter::load(pkg.fs()).unwrap()).unwrap();
        let result = filter.run(errors).unwrap();
        assert!(result.processed.is_empty());
        assert_eq!(result.removed.len(), 1);
    }
}

#[cfg(test)]
mod scenarios {
    use super::*;
    use pkgspec_schemas::ItemType;

    fn package_in(dir: &Path, version: Option<&str>) -> Package {
        Package::new(
            "nginx",
            "integration",
            version.map(|v| PackageVersion::parse(v).unwrap()),
            PackageVersion::new(3, 0, 0),
            PackageFs::new(dir),
        )
    }

    fn folder(contents: Vec<ItemSpec>) -> ItemSpec {
        ItemSpec {
            contents,
            ..ItemSpec::folder("")
        }
    }

    #[test]
    fn test_missing_required_file() {
        let dir = TempDir::new().unwrap();
        let mut manifest = ItemSpec::file("manifest.yml");
        manifest.required = true;

        let errors = validate_package_structure(&package_in(dir.path(), None), &folder(vec![manifest]));
        assert_eq!(errors.len(), 1);
        assert!(errors.errors[0].message.contains("[manifest.yml]"));
        assert!(errors.errors[0].message.starts_with("expecting to find"));
    }

    #[test]
    fn test_size_ceiling() {
        let dir = TempDir::new().unwrap();
        write_files(dir.path(), &[("readme.txt", &[b'r'; 2048])]);
        let specs = TempDir::new().unwrap();
        let spec_file = specs.path().join("spec.yml");
        fs::write(
            &spec_file,
            "spec:\n  type: folder\n  contents:\n    - type: file\n      name: readme.txt\n      sizeLimit: 1KB\n",
        )
        .unwrap();

        let root = FolderSpecLoader::new(None, PackageVersion::new(3, 0, 0))
            .load(&spec_file)
            .unwrap();
        let errors = validate_package_structure(&package_in(dir.path(), None), &root);
        assert_eq!(errors.len(), 1);
        assert!(errors.errors[0]
            .message
            .ends_with("file size (2KB) is bigger than expected (1KB)"));
    }

    #[test]
    fn test_beta_on_stable() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("agent")).unwrap();
        let mut agent = ItemSpec::folder("agent");
        agent.release = "beta".to_string();
        let spec = folder(vec![agent]);

        let errors = validate_package_structure(&package_in(dir.path(), Some("2.0.0")), &spec);
        assert_eq!(errors.len(), 1);
        assert!(errors.errors[0].is_unassigned());
        assert!(validate_package_structure(&package_in(dir.path(), Some("0.9.0")), &spec).is_empty());
        assert!(validate_package_structure(&package_in(dir.path(), Some("2.0.0-beta1")), &spec).is_empty());
    }

    #[test]
    fn test_forbidden_pattern() {
        let dir = TempDir::new().unwrap();
        write_files(dir.path(), &[("_private.yml", b"a: 1")]);
        let yml = ItemSpec {
            item_type: ItemType::File,
            pattern: r".*\.yml".to_string(),
            forbidden_patterns: vec!["^_.*".to_string()],
            ..Default::default()
        };

        let errors = validate_package_structure(&package_in(dir.path(), None), &folder(vec![yml]));
        assert_eq!(errors.len(), 1);
        assert!(errors.errors[0]
            .message
            .starts_with("item [_private.yml] is not allowed in folder"));
    }

    #[test]
    fn test_exclude_checks_filter() {
        let errors: ValidationErrors = vec![
            StructuredError::new("first", "A"),
            StructuredError::new("second", "B"),
            StructuredError::unassigned("third"),
        ]
        .into();
        let config: ConfigFilter = serde_yaml::from_str("errors:\n  exclude_checks: [A]\n").unwrap();

        let result = Filter::new(&config).unwrap().run(errors).unwrap();
        let processed: Vec<_> = result.processed.iter().map(|e| e.code()).collect();
        let removed: Vec<_> = result.removed.iter().map(|e| e.code()).collect();
        assert_eq!(processed, vec!["B", ""]);
        assert_eq!(removed, vec!["A"]);
    }

    #[test]
    fn test_name_precedence_over_pattern() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("docs")).unwrap();
        let any_file = ItemSpec {
            item_type: ItemType::File,
            pattern: ".*".to_string(),
            ..Default::default()
        };
        let docs = ItemSpec::folder("docs");

        let errors = validate_package_structure(&package_in(dir.path(), None), &folder(vec![any_file, docs]));
        assert!(errors.is_empty(), "{}", errors);
    }
}
