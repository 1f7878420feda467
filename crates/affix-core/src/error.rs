//! Configuration error types
//!
//! Every problem detected while building definitions, resolving backends or
//! processors by name, or parsing geometry strings surfaces as a `ConfigError`.
//! These are fatal: they are reported immediately and never retried.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Unknown storage backend: {name}")]
    UnknownStorageBackend { name: String },

    #[error("Unknown processor '{name}' in style '{style}'")]
    UnknownProcessor { name: String, style: String },

    #[error("Unknown style: {name}")]
    UnknownStyle { name: String },

    #[error("Invalid geometry: {input:?}")]
    InvalidGeometry { input: String },

    #[error("Crop geometry {geometry} needs both a width and a height")]
    IncompleteCropGeometry { geometry: String },

    #[error("Invalid options: {0}")]
    InvalidOptions(#[from] serde_json::Error),

    #[error("Invalid storage option {option}: {reason}")]
    InvalidStorageOption { option: String, reason: String },

    #[error("Invalid value for {key}: {value:?}")]
    InvalidEnv { key: String, value: String },
}

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;
