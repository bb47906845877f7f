//! Errors raised while reading configuration data and schema bindings.
use std::path::PathBuf;

use thiserror::Error;

use crate::error::BoxError;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to serialize config value for '{key}': {source}")]
    Value {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to serialize to {format}: {source}")]
    Serialization {
        format: String,
        #[source]
        source: BoxError,
    },

    #[error("Failed to deserialize from {format}: {source}")]
    Deserialization {
        format: String,
        #[source]
        source: BoxError,
    },

    #[error("Unknown or unsupported config format for path: {}", .path.display())]
    UnsupportedFormat { path: PathBuf },

    #[error("Failed to read config file '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Config section '{section}' is not a table")]
    SectionNotTable { section: String },

    #[error("Config field '{field}' of schema '{schema}' is not set")]
    MissingField { schema: String, field: String },

    #[error("Config field '{field}' of schema '{schema}' has an unexpected type: {source}")]
    FieldType {
        schema: String,
        field: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Config schema '{schema}' does not match {type_name}: {message}")]
    SchemaMismatch {
        schema: String,
        type_name: String,
        message: String,
    },
}
