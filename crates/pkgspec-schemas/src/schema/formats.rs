//! Format predicates consulting the package filesystem
//!
//! Predicates are built for one validated file and handed to the schema
//! engine for that evaluation only.
//!
//! Copyright (c) 2025 Specado Team
//! Licensed under the Apache-2.0 license

use crate::package::PackageFs;
use crate::spectypes::filesize::FileSize;

/// Values naming an existing file relative to the validated one.
pub const RELATIVE_PATH_FORMAT: &str = "relative-path";

/// Values naming an existing data stream of the package.
pub const DATA_STREAM_NAME_FORMAT: &str = "data-stream-name";

const DATA_STREAM_FOLDER: &str = "data_stream";

/// Predicate accepting paths, relative to `current_dir`, of entries that
/// exist and do not exceed `size_limit` (zero means unlimited).
pub fn relative_path_checker(
    fsys: PackageFs,
    current_dir: String,
    size_limit: FileSize,
) -> impl Fn(&str) -> bool + Send + Sync + 'static {
    move |value: &str| {
        let Some(target) = join_within(&current_dir, value) else {
            return false;
        };
        match fsys.metadata(&target) {
            Ok(metadata) => size_limit.is_zero() || FileSize::bytes(metadata.size()) <= size_limit,
            Err(_) => false,
        }
    }
}

/// Predicate accepting names of folders under `data_stream/` next to the validated file.
pub fn data_stream_name_checker(
    fsys: PackageFs,
    current_dir: String,
) -> impl Fn(&str) -> bool + Send + Sync + 'static {
    let data_streams = join_within(&current_dir, DATA_STREAM_FOLDER).unwrap_or_default();
    relative_path_checker(fsys, data_streams, FileSize::default())
}

/// Join `name` to `base`, both package-relative. `None` when the result
/// leaves the package.
fn join_within(base: &str, name: &str) -> Option<String> {
    let mut segments: Vec<&str> = Vec::new();
    for segment in base.split('/').chain(name.split('/')) {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop()?;
            }
            other => segments.push(other),
        }
    }
    if segments.is_empty() {
        Some(".".to_string())
    } else {
        Some(segments.join("/"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn package() -> (TempDir, PackageFs) {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("img")).unwrap();
        fs::create_dir_all(dir.path().join("data_stream/access")).unwrap();
        fs::write(dir.path().join("img/logo.svg"), vec![b'x'; 2048]).unwrap();
        let fsys = PackageFs::new(dir.path());
        (dir, fsys)
    }

    #[test]
    fn test_join_within() {
        assert_eq!(join_within(".", "img/logo.svg").as_deref(), Some("img/logo.svg"));
        assert_eq!(join_within("docs", "../img/a.png").as_deref(), Some("img/a.png"));
        assert_eq!(join_within("docs", "../../etc/passwd"), None);
        assert_eq!(join_within("docs", ".."), Some(".".to_string()));
    }

    #[test]
    fn test_relative_path_checker() {
        let (_dir, fsys) = package();

        let unlimited = relative_path_checker(fsys.clone(), ".".to_string(), FileSize::default());
        assert!(unlimited("img/logo.svg"));
        assert!(!unlimited("img/missing.svg"));
        assert!(!unlimited("../outside"));

        let limited = relative_path_checker(fsys, ".".to_string(), FileSize::kilobytes(1));
        assert!(!limited("img/logo.svg"));
    }

    #[test]
    fn test_data_stream_name_checker() {
        let (_dir, fsys) = package();
        let checker = data_stream_name_checker(fsys, ".".to_string());
        assert!(checker("access"));
        assert!(!checker("errors"));
    }
}
