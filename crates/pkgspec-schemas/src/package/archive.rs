//! Zipped packages, held in memory
//!
//! Copyright (c) 2025 Specado Team
//! Licensed under the Apache-2.0 license

use super::fspath::DirEntry;
use std::collections::{BTreeMap, BTreeSet};
use std::io::{self, Read, Seek};
use thiserror::Error;
use tracing::debug;
use zip::result::ZipError;
use zip::ZipArchive;

/// Errors reading a zip archive
#[derive(Error, Debug)]
pub enum ArchiveError {
    #[error(transparent)]
    Zip(#[from] ZipError),

    #[error("failed to read entry {name}: {source}")]
    Entry { name: String, source: io::Error },
}

/// Files and folders of a zip archive, keyed by slash-separated names.
/// The empty name is the archive root.
#[derive(Debug, Default)]
pub struct ArchiveTree {
    files: BTreeMap<String, Vec<u8>>,
    dirs: BTreeSet<String>,
}

impl ArchiveTree {
    pub fn from_reader<R: Read + Seek>(reader: R) -> Result<Self, ArchiveError> {
        let mut archive = ZipArchive::new(reader)?;
        let mut tree = Self::default();

        for index in 0..archive.len() {
            let mut entry = archive.by_index(index)?;
            let Some(name) = entry_name(entry.name()) else {
                debug!(name = entry.name(), "Skipping zip entry outside of the archive root");
                continue;
            };
            if entry.is_dir() {
                tree.add_dir(&name);
                continue;
            }

            let mut data = Vec::with_capacity(entry.size() as usize);
            entry
                .read_to_end(&mut data)
                .map_err(|source| ArchiveError::Entry {
                    name: name.clone(),
                    source,
                })?;
            if let Some(idx) = name.rfind('/') {
                tree.add_dir(&name[..idx]);
            }
            tree.files.insert(name, data);
        }

        debug!(
            files = tree.files.len(),
            dirs = tree.dirs.len(),
            "Read zip archive"
        );
        Ok(tree)
    }

    pub fn file(&self, name: &str) -> Option<&[u8]> {
        self.files.get(name).map(Vec::as_slice)
    }

    pub fn is_dir(&self, name: &str) -> bool {
        name.is_empty() || self.dirs.contains(name)
    }

    /// Direct children of a folder, sorted by name.
    pub fn children(&self, dir: &str) -> Vec<DirEntry> {
        let prefix = if dir.is_empty() {
            String::new()
        } else {
            format!("{}/", dir)
        };
        let direct_child = |name: &str| -> Option<String> {
            let rest = name.strip_prefix(prefix.as_str())?;
            (!rest.is_empty() && !rest.contains('/')).then(|| rest.to_string())
        };

        let mut entries: Vec<DirEntry> = self
            .dirs
            .iter()
            .filter_map(|d| direct_child(d).map(|name| DirEntry { name, is_dir: true }))
            .chain(
                self.files
                    .keys()
                    .filter_map(|f| direct_child(f).map(|name| DirEntry { name, is_dir: false })),
            )
            .collect();
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        entries
    }

    fn add_dir(&mut self, name: &str) {
        let mut current = name;
        while self.dirs.insert(current.to_string()) {
            match current.rfind('/') {
                Some(idx) => current = &current[..idx],
                None => break,
            }
        }
    }
}

/// Normalized name of a zip entry, `None` for the root itself and for
/// names escaping it.
fn entry_name(raw: &str) -> Option<String> {
    let mut segments = Vec::new();
    for segment in raw.split(['/', '\\']) {
        match segment {
            "" | "." => {}
            ".." => return None,
            s => segments.push(s),
        }
    }
    (!segments.is_empty()).then(|| segments.join("/"))
}
