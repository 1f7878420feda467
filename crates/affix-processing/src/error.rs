use crate::command::CommandError;
use affix_core::ConfigError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProcessingError {
    #[error("Processor not found: {name}")]
    ProcessorNotFound { name: String },

    #[error(transparent)]
    Command(#[from] CommandError),

    #[error("Processor {processor} requires a geometry")]
    MissingGeometry { processor: String },

    #[error(transparent)]
    Geometry(#[from] ConfigError),

    #[error("Could not read image dimensions from {output:?}")]
    UnreadableDimensions { output: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ProcessingError {
    /// Configuration errors are never absorbed, even for non-strict styles.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            ProcessingError::ProcessorNotFound { .. } | ProcessingError::MissingGeometry { .. }
        )
    }
}

pub type ProcessingResult<T> = Result<T, ProcessingError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_errors() {
        let missing = ProcessingError::ProcessorNotFound {
            name: "watermark".to_string(),
        };
        assert!(missing.is_configuration());

        let failed = ProcessingError::Command(CommandError::NotFound {
            command: "convert".to_string(),
        });
        assert!(!failed.is_configuration());
    }
}
