//! Byte counts with B/KB/MB notation
//!
//! Copyright (c) 2025 Specado Team
//! Licensed under the Apache-2.0 license

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

const BYTE: u64 = 1;
const KILO_BYTE: u64 = 1024 * BYTE;
const MEGA_BYTE: u64 = 1024 * KILO_BYTE;

/// Size of a file or a group of files, in bytes
///
/// Serialized using the largest unit that divides the value evenly, so
/// `2048` is written as `2KB`. Zero is used by limits to mean "unlimited".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FileSize(pub u64);

impl FileSize {
    pub const fn bytes(bytes: u64) -> Self {
        Self(bytes)
    }

    pub const fn kilobytes(kilobytes: u64) -> Self {
        Self(kilobytes * KILO_BYTE)
    }

    pub const fn megabytes(megabytes: u64) -> Self {
        Self(megabytes * MEGA_BYTE)
    }

    pub fn as_u64(self) -> u64 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

/// Error returned for malformed size strings
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid format for file size ({0})")]
pub struct FileSizeError(pub String);

impl FromStr for FileSize {
    type Err = FileSizeError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let (quantity, unit) = if let Some(q) = text.strip_suffix("MB") {
            (q, MEGA_BYTE)
        } else if let Some(q) = text.strip_suffix("KB") {
            (q, KILO_BYTE)
        } else if let Some(q) = text.strip_suffix('B') {
            (q, BYTE)
        } else {
            (text, BYTE)
        };

        if quantity.is_empty() || !quantity.bytes().all(|b| b.is_ascii_digit()) {
            return Err(FileSizeError(text.to_string()));
        }

        // File sizes are reported as signed 64-bit values by the OS.
        let q: u64 = quantity
            .parse()
            .ok()
            .filter(|q| *q <= i64::MAX as u64)
            .ok_or_else(|| FileSizeError(text.to_string()))?;

        q.checked_mul(unit)
            .map(FileSize)
            .ok_or_else(|| FileSizeError(text.to_string()))
    }
}

impl fmt::Display for FileSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let size = self.0;
        if size >= MEGA_BYTE && size % MEGA_BYTE == 0 {
            write!(f, "{}MB", size / MEGA_BYTE)
        } else if size >= KILO_BYTE && size % KILO_BYTE == 0 {
            write!(f, "{}KB", size / KILO_BYTE)
        } else {
            write!(f, "{}B", size)
        }
    }
}

impl From<u64> for FileSize {
    fn from(bytes: u64) -> Self {
        Self(bytes)
    }
}

impl Serialize for FileSize {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

struct FileSizeVisitor;

impl<'de> Visitor<'de> for FileSizeVisitor {
    type Value = FileSize;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a byte count or a size string such as 5MB")
    }

    fn visit_u64<E: de::Error>(self, value: u64) -> Result<FileSize, E> {
        Ok(FileSize(value))
    }

    fn visit_i64<E: de::Error>(self, value: i64) -> Result<FileSize, E> {
        u64::try_from(value)
            .map(FileSize)
            .map_err(|_| E::custom(format!("invalid format for file size ({})", value)))
    }

    fn visit_str<E: de::Error>(self, value: &str) -> Result<FileSize, E> {
        value.parse().map_err(E::custom)
    }
}

impl<'de> Deserialize<'de> for FileSize {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(FileSizeVisitor)
    }
}
