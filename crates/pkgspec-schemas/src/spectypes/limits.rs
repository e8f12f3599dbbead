//! Size and count ceilings of spec nodes
//!
//! Copyright (c) 2025 Specado Team
//! Licensed under the Apache-2.0 license

use crate::spectypes::filesize::FileSize;
use serde::{Deserialize, Serialize};

/// Ceilings declared on a spec node. Zero means unset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Limits {
    /// Maximum number of entries directly inside a folder.
    #[serde(skip_serializing_if = "is_zero_count")]
    pub total_contents_limit: usize,

    /// Maximum accumulated size of the files inside a folder.
    #[serde(skip_serializing_if = "FileSize::is_zero")]
    pub total_size_limit: FileSize,

    /// Maximum size of an individual file.
    #[serde(skip_serializing_if = "FileSize::is_zero")]
    pub size_limit: FileSize,

    /// Maximum size of a configuration (YAML) file.
    #[serde(skip_serializing_if = "FileSize::is_zero")]
    pub configuration_size_limit: FileSize,

    /// Maximum size of files referenced through relative paths.
    #[serde(skip_serializing_if = "FileSize::is_zero")]
    pub relative_path_size_limit: FileSize,

    /// Maximum number of fields per data stream, set on the root spec.
    #[serde(skip_serializing_if = "is_zero_count")]
    pub fields_per_data_stream_limit: usize,
}

fn is_zero_count(count: &usize) -> bool {
    *count == 0
}

impl Limits {
    /// Fill every unset field with the value of `parent`.
    ///
    /// A field explicitly set to zero cannot be told apart from an unset
    /// one, so it inherits as well.
    pub fn inherit_from(&mut self, parent: &Limits) {
        if self.total_contents_limit == 0 {
            self.total_contents_limit = parent.total_contents_limit;
        }
        if self.total_size_limit.is_zero() {
            self.total_size_limit = parent.total_size_limit;
        }
        if self.size_limit.is_zero() {
            self.size_limit = parent.size_limit;
        }
        if self.configuration_size_limit.is_zero() {
            self.configuration_size_limit = parent.configuration_size_limit;
        }
        if self.relative_path_size_limit.is_zero() {
            self.relative_path_size_limit = parent.relative_path_size_limit;
        }
        if self.fields_per_data_stream_limit == 0 {
            self.fields_per_data_stream_limit = parent.fields_per_data_stream_limit;
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Limits::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inherit_only_unset_fields() {
        let parent = Limits {
            total_contents_limit: 10,
            size_limit: FileSize::kilobytes(5),
            relative_path_size_limit: FileSize::megabytes(1),
            ..Default::default()
        };
        let mut child = Limits {
            size_limit: FileSize::kilobytes(1),
            ..Default::default()
        };

        child.inherit_from(&parent);

        assert_eq!(child.total_contents_limit, 10);
        assert_eq!(child.size_limit, FileSize::kilobytes(1));
        assert_eq!(child.relative_path_size_limit, FileSize::megabytes(1));
        assert!(child.total_size_limit.is_zero());
    }

    #[test]
    fn test_deserialize_camel_case() {
        let limits: Limits = serde_yaml::from_str(
            "totalContentsLimit: 3\nsizeLimit: 2MB\nconfigurationSizeLimit: 1024\n",
        )
        .unwrap();
        assert_eq!(limits.total_contents_limit, 3);
        assert_eq!(limits.size_limit, FileSize::megabytes(2));
        assert_eq!(limits.configuration_size_limit, FileSize::kilobytes(1));
        assert!(!limits.is_empty());
        assert!(Limits::default().is_empty());
    }
}
