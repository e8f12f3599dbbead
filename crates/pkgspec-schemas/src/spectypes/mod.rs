//! Value types of the spec tree
//!
//! Copyright (c) 2025 Specado Team
//! Licensed under the Apache-2.0 license

pub mod content_type;
pub mod filesize;
pub mod item;
pub mod limits;
pub mod schema;

pub use content_type::{ContentType, ContentTypeError, YAML_MEDIA_TYPE};
pub use filesize::{FileSize, FileSizeError};
pub use item::{ItemSpec, ItemType, PACKAGE_NAME_PLACEHOLDER, VISIBILITY_PRIVATE, VISIBILITY_PUBLIC};
pub use limits::Limits;
pub use schema::{FileSchema, FileSchemaLoadOptions, FileSchemaLoader};
