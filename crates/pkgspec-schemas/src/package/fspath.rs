//! Read-only filesystem view rooted at a package
//!
//! Names passed to [`PackageFs`] are slash-separated and relative to the
//! package root; `.` names the root itself.
//!
//! Copyright (c) 2025 Specado Team
//! Licensed under the Apache-2.0 license

use super::archive::ArchiveTree;
use std::fs;
use std::io::{self, Cursor, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// An entry of a listed directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub name: String,
    pub is_dir: bool,
}

/// Size and kind of a package entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryMetadata {
    size: u64,
    is_dir: bool,
}

impl EntryMetadata {
    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn is_dir(&self) -> bool {
        self.is_dir
    }

    pub fn is_file(&self) -> bool {
        !self.is_dir
    }
}

#[derive(Debug, Clone)]
enum Source {
    Dir(PathBuf),
    Archive { tree: Arc<ArchiveTree>, prefix: String },
}

/// Filesystem access relative to a package root, either a folder on disk
/// or a folder inside a zip archive
#[derive(Debug, Clone)]
pub struct PackageFs {
    source: Source,
    location: PathBuf,
}

impl PackageFs {
    /// View rooted at `root`, displayed with the same path.
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        let root = root.into();
        Self {
            location: root.clone(),
            source: Source::Dir(root),
        }
    }

    /// View rooted at `root` whose display paths start at `location`.
    pub fn with_location<P: Into<PathBuf>, L: Into<PathBuf>>(root: P, location: L) -> Self {
        Self {
            source: Source::Dir(root.into()),
            location: location.into(),
        }
    }

    /// View of the folder `prefix` of an archive, displayed under `location`.
    pub fn archive<S: Into<String>, L: Into<PathBuf>>(tree: Arc<ArchiveTree>, prefix: S, location: L) -> Self {
        Self {
            source: Source::Archive {
                tree,
                prefix: prefix.into(),
            },
            location: location.into(),
        }
    }

    /// Path on disk of a package-relative name, `None` for archives.
    pub fn local_path(&self, name: &str) -> Option<PathBuf> {
        match &self.source {
            Source::Dir(root) => Some(join_slash(root, name)),
            Source::Archive { .. } => None,
        }
    }

    /// Display path of the given package-relative names, for messages.
    pub fn path(&self, names: &[&str]) -> String {
        let mut path = self.location.clone();
        for name in names {
            path = join_slash(&path, name);
        }
        path.display().to_string()
    }

    /// Entries of a directory, sorted by name.
    pub fn read_dir(&self, name: &str) -> io::Result<Vec<DirEntry>> {
        match &self.source {
            Source::Dir(root) => {
                let mut entries = Vec::new();
                for entry in fs::read_dir(join_slash(root, name))? {
                    let entry = entry?;
                    entries.push(DirEntry {
                        name: entry.file_name().to_string_lossy().into_owned(),
                        is_dir: entry.file_type()?.is_dir(),
                    });
                }
                entries.sort_by(|a, b| a.name.cmp(&b.name));
                Ok(entries)
            }
            Source::Archive { tree, prefix } => {
                let key = archive_key(prefix, name);
                if !tree.is_dir(&key) {
                    return Err(not_found(name));
                }
                Ok(tree.children(&key))
            }
        }
    }

    /// Streaming access to a file.
    pub fn open(&self, name: &str) -> io::Result<Box<dyn Read + '_>> {
        match &self.source {
            Source::Dir(root) => Ok(Box::new(fs::File::open(join_slash(root, name))?)),
            Source::Archive { tree, prefix } => tree
                .file(&archive_key(prefix, name))
                .map(|data| Box::new(Cursor::new(data)) as Box<dyn Read + '_>)
                .ok_or_else(|| not_found(name)),
        }
    }

    pub fn read(&self, name: &str) -> io::Result<Vec<u8>> {
        match &self.source {
            Source::Dir(root) => fs::read(join_slash(root, name)),
            Source::Archive { tree, prefix } => tree
                .file(&archive_key(prefix, name))
                .map(<[u8]>::to_vec)
                .ok_or_else(|| not_found(name)),
        }
    }

    pub fn read_to_string(&self, name: &str) -> io::Result<String> {
        match &self.source {
            Source::Dir(root) => fs::read_to_string(join_slash(root, name)),
            Source::Archive { .. } => String::from_utf8(self.read(name)?)
                .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e)),
        }
    }

    pub fn metadata(&self, name: &str) -> io::Result<EntryMetadata> {
        match &self.source {
            Source::Dir(root) => {
                let metadata = fs::metadata(join_slash(root, name))?;
                Ok(EntryMetadata {
                    size: metadata.len(),
                    is_dir: metadata.is_dir(),
                })
            }
            Source::Archive { tree, prefix } => {
                let key = archive_key(prefix, name);
                if let Some(data) = tree.file(&key) {
                    Ok(EntryMetadata {
                        size: data.len() as u64,
                        is_dir: false,
                    })
                } else if tree.is_dir(&key) {
                    Ok(EntryMetadata { size: 0, is_dir: true })
                } else {
                    Err(not_found(name))
                }
            }
        }
    }

    pub fn exists(&self, name: &str) -> bool {
        self.metadata(name).is_ok()
    }

    pub fn is_file(&self, name: &str) -> bool {
        self.metadata(name).is_ok_and(|m| m.is_file())
    }
}

fn archive_key(prefix: &str, name: &str) -> String {
    let segments: Vec<&str> = name
        .split('/')
        .filter(|s| !s.is_empty() && *s != ".")
        .collect();
    join(prefix, &segments.join("/"))
}

fn not_found(name: &str) -> io::Error {
    io::Error::new(
        io::ErrorKind::NotFound,
        format!("{}: no such file or directory", name),
    )
}

/// Join two slash-separated package-relative names.
pub fn join(base: &str, name: &str) -> String {
    if base.is_empty() || base == "." {
        name.to_string()
    } else if name.is_empty() || name == "." {
        base.to_string()
    } else {
        format!("{}/{}", base.trim_end_matches('/'), name)
    }
}

/// Parent of a slash-separated name, `.` for top-level names.
pub fn parent(name: &str) -> &str {
    match name.rfind('/') {
        Some(idx) => &name[..idx],
        None => ".",
    }
}

fn join_slash(base: &Path, name: &str) -> PathBuf {
    let mut path = base.to_path_buf();
    for component in name.split('/') {
        if component.is_empty() || component == "." {
            continue;
        }
        path.push(component);
    }
    path
}
