//! Storage abstraction trait
//!
//! This module defines the Storage trait that all storage backends must implement.

use crate::StorageBackend;
use affix_core::{ConfigError, FileSource};
use async_trait::async_trait;
use std::path::PathBuf;
use thiserror::Error;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Write failed for {path}: {source}")]
    WriteFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Delete failed for {path}: {source}")]
    DeleteFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Read failed for {path}: {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Invalid storage path: {0}")]
    InvalidPath(String),

    #[error("{backend} backend error for {path}: {source}")]
    Backend {
        backend: StorageBackend,
        path: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Could not load credentials from {}: {reason}", path.display())]
    Credentials { path: PathBuf, reason: String },

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Storage abstraction trait
///
/// Both backends (filesystem, object store) implement this trait so attachments
/// can commit their styles without knowing where the bytes end up.
///
/// Deleting a path that does not exist is never an error.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Persist `data` at `path`, replacing anything already there.
    ///
    /// `content_type` is the attachment's current content type; backends that
    /// keep object metadata record it.
    async fn write(
        &self,
        path: &str,
        data: FileSource,
        content_type: Option<&str>,
    ) -> StorageResult<()>;

    /// Remove the file at `path` if present.
    async fn delete(&self, path: &str) -> StorageResult<()>;

    /// Check if a file exists
    async fn exists(&self, path: &str) -> StorageResult<bool>;

    /// Open the stored file as a byte source, or `None` if nothing is stored there.
    async fn to_readable_file(&self, path: &str) -> StorageResult<Option<FileSource>>;

    /// Move a stored file. Implemented as write-then-delete; equal paths are a no-op.
    async fn rename(&self, from: &str, to: &str, content_type: Option<&str>) -> StorageResult<()> {
        if from == to {
            return Ok(());
        }

        let source = self
            .to_readable_file(from)
            .await?
            .ok_or_else(|| StorageError::NotFound(from.to_string()))?;

        self.write(to, source, content_type).await?;
        self.delete(from).await?;

        tracing::info!(
            backend = %self.backend_type(),
            from = %from,
            to = %to,
            "Storage rename successful"
        );

        Ok(())
    }

    /// Get the storage backend type
    fn backend_type(&self) -> StorageBackend;
}
