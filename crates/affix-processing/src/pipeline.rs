//! Processing pipeline for one style

use std::sync::Arc;

use affix_core::FileSource;

use crate::error::ProcessingResult;
use crate::registry::ProcessorRegistry;
use crate::traits::ProcessingContext;

/// Runs a style's processors in order over a single input.
#[derive(Clone)]
pub struct ProcessorPipeline {
    registry: Arc<ProcessorRegistry>,
}

impl ProcessorPipeline {
    pub fn new(registry: Arc<ProcessorRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &ProcessorRegistry {
        &self.registry
    }

    /// Feed `input` through every processor of the context's style. An empty
    /// processor list returns the input unchanged.
    pub async fn process(
        &self,
        input: FileSource,
        context: &ProcessingContext<'_>,
    ) -> ProcessingResult<FileSource> {
        let mut current = input;

        for name in &context.style.processors {
            let processor = self.registry.get(name)?;

            tracing::debug!(
                attachment = %context.attachment,
                style = %context.style.name,
                processor = %name,
                "Running processor"
            );

            current = processor.process(current, context).await?;
        }

        Ok(current)
    }

    /// Like [`process`](Self::process), but a non-strict style absorbs runtime
    /// failures and falls back to the unprocessed input. Configuration errors
    /// always propagate.
    pub async fn process_style(
        &self,
        input: &FileSource,
        context: &ProcessingContext<'_>,
    ) -> ProcessingResult<FileSource> {
        match self.process(input.clone(), context).await {
            Ok(output) => Ok(output),
            Err(error) if !context.style.strict && !error.is_configuration() => {
                tracing::warn!(
                    attachment = %context.attachment,
                    style = %context.style.name,
                    error = %error,
                    "Processing failed, storing the unprocessed file"
                );
                Ok(input.clone())
            }
            Err(error) => Err(error),
        }
    }
}
