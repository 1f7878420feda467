//! Affix Core Library
//!
//! This crate provides the pieces shared by every affix component: attachment
//! definitions and their layered style configuration, the path/URL template
//! interpolator, geometry math for thumbnails, the byte-source abstraction handed
//! between processors and storage backends, and the runtime configuration.

pub mod config;
pub mod constants;
pub mod definition;
pub mod error;
pub mod file_source;
pub mod geometry;
pub mod interpolation;
pub mod metadata;
pub mod storage_types;
pub mod style;

// Re-export commonly used types
pub use config::RuntimeConfig;
pub use definition::{AttachmentDefinition, DefinitionBuilder, DefinitionOptions};
pub use error::{ConfigError, ConfigResult};
pub use file_source::{FileSource, LocalFile, Upload};
pub use geometry::{Geometry, Transformation};
pub use interpolation::{id_partition, interpolate, pluralize, underscore, TokenValues};
pub use metadata::AttachmentMetadata;
pub use storage_types::{Credentials, StorageBackend, StorageConfig};
pub use style::{StyleEntry, StyleOptions, StyleSpec};
