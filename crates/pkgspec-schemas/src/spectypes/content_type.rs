//! Media types with parameters
//!
//! Copyright (c) 2025 Specado Team
//! Licensed under the Apache-2.0 license

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// YAML media type, the only one with content-specific checks.
pub const YAML_MEDIA_TYPE: &str = "application/x-yaml";

/// A media type such as `application/x-yaml; require-document-dashes=true`
///
/// Media type and parameter names are case-insensitive and stored in
/// lower case. Parameters are kept sorted so that the serialized form is
/// stable regardless of the order they were written in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ContentType {
    pub media_type: String,
    pub params: BTreeMap<String, String>,
}

/// Error returned for malformed media types
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid media type ({input}): {reason}")]
pub struct ContentTypeError {
    pub input: String,
    pub reason: String,
}

impl ContentType {
    pub fn new(media_type: impl Into<String>) -> Self {
        Self {
            media_type: media_type.into().to_ascii_lowercase(),
            params: BTreeMap::new(),
        }
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params
            .insert(key.into().to_ascii_lowercase(), value.into());
        self
    }

    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    pub fn is_yaml(&self) -> bool {
        self.media_type == YAML_MEDIA_TYPE
    }

    /// Whether YAML documents must begin with a `---` marker.
    pub fn requires_document_dashes(&self) -> bool {
        self.param("require-document-dashes") == Some("true")
    }
}

fn is_token_char(c: char) -> bool {
    c.is_ascii() && !c.is_ascii_control() && c != ' ' && !"()<>@,;:\\\"/[]?=".contains(c)
}

fn is_token(s: &str) -> bool {
    !s.is_empty() && s.chars().all(is_token_char)
}

fn parse_param_value(raw: &str) -> Option<String> {
    if let Some(quoted) = raw.strip_prefix('"') {
        let inner = quoted.strip_suffix('"')?;
        let mut value = String::with_capacity(inner.len());
        let mut chars = inner.chars();
        while let Some(c) = chars.next() {
            match c {
                '\\' => value.push(chars.next()?),
                '"' => return None,
                _ => value.push(c),
            }
        }
        Some(value)
    } else if is_token(raw) {
        Some(raw.to_string())
    } else {
        None
    }
}

impl FromStr for ContentType {
    type Err = ContentTypeError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let error = |reason: &str| ContentTypeError {
            input: text.to_string(),
            reason: reason.to_string(),
        };

        let mut parts = text.split(';');
        let media_type = parts.next().unwrap_or_default().trim().to_ascii_lowercase();
        let (main, sub) = media_type
            .split_once('/')
            .ok_or_else(|| error("expected type/subtype"))?;
        if !is_token(main) || !is_token(sub) {
            return Err(error("invalid token in media type"));
        }

        let mut params = BTreeMap::new();
        for part in parts {
            let part = part.trim();
            if part.is_empty() {
                continue;
            }
            let (key, raw_value) = part
                .split_once('=')
                .ok_or_else(|| error("parameter without value"))?;
            let key = key.trim().to_ascii_lowercase();
            if !is_token(&key) {
                return Err(error("invalid parameter name"));
            }
            let value = parse_param_value(raw_value.trim())
                .ok_or_else(|| error("invalid parameter value"))?;
            if params.insert(key, value).is_some() {
                return Err(error("duplicate parameter name"));
            }
        }

        Ok(Self { media_type, params })
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.media_type)?;
        for (key, value) in &self.params {
            if is_token(value) {
                write!(f, "; {}={}", key, value)?;
            } else {
                let escaped = value.replace('\\', "\\\\").replace('"', "\\\"");
                write!(f, "; {}=\"{}\"", key, escaped)?;
            }
        }
        Ok(())
    }
}

impl TryFrom<String> for ContentType {
    type Error = ContentTypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ContentType> for String {
    fn from(content_type: ContentType) -> Self {
        content_type.to_string()
    }
}
