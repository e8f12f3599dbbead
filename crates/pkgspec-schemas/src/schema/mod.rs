//! Content schemas for package files
//!
//! Copyright (c) 2025 Specado Team
//! Licensed under the Apache-2.0 license

pub mod bundle;
pub mod content;
pub mod formats;
pub mod normalize;

pub use bundle::{bundle_schema, load_schema_document};
pub use content::{ContentSchema, ContentSchemaLoader};
pub use formats::{data_stream_name_checker, relative_path_checker, DATA_STREAM_NAME_FORMAT, RELATIVE_PATH_FORMAT};
pub use normalize::{expand_dotted_keys, json_content, yaml_content, NormalizeError};
