use affix_core::ConfigError;
use affix_processing::ProcessingError;
use affix_storage::StorageError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AttachmentError {
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigError),

    #[error("Processing style {style} of {attachment} failed: {source}")]
    Processing {
        attachment: String,
        style: String,
        #[source]
        source: ProcessingError,
    },

    #[error("Storage {operation} of {path} for {attachment} failed: {source}")]
    Storage {
        attachment: String,
        style: Option<String>,
        operation: &'static str,
        path: String,
        #[source]
        source: StorageError,
    },

    #[error("Could not read upload for {attachment}: {source}")]
    Io {
        attachment: String,
        #[source]
        source: std::io::Error,
    },
}

impl AttachmentError {
    pub(crate) fn processing(attachment: &str, style: &str, source: ProcessingError) -> Self {
        match source {
            ProcessingError::ProcessorNotFound { name } => {
                AttachmentError::Configuration(ConfigError::UnknownProcessor {
                    name,
                    style: style.to_string(),
                })
            }
            source => AttachmentError::Processing {
                attachment: attachment.to_string(),
                style: style.to_string(),
                source,
            },
        }
    }

    pub fn is_configuration(&self) -> bool {
        match self {
            AttachmentError::Configuration(_) => true,
            AttachmentError::Processing { source, .. } => source.is_configuration(),
            AttachmentError::Storage { source, .. } => matches!(source, StorageError::Config(_)),
            AttachmentError::Io { .. } => false,
        }
    }
}

pub type AttachmentResult<T> = Result<T, AttachmentError>;
