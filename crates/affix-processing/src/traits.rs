//! Processor trait
//!
//! A processor takes the current byte source of one style and returns the next
//! one. Processors are chained in the order a style lists them.

use crate::error::ProcessingResult;
use affix_core::{FileSource, StyleSpec};
use async_trait::async_trait;

/// What a processor knows about the attachment it works for.
#[derive(Debug, Clone, Copy)]
pub struct ProcessingContext<'a> {
    /// Attachment name, e.g. `avatar`.
    pub attachment: &'a str,
    pub style: &'a StyleSpec,
    /// Original file name of the upload, if known.
    pub file_name: Option<&'a str>,
}

impl<'a> ProcessingContext<'a> {
    pub fn new(attachment: &'a str, style: &'a StyleSpec) -> Self {
        Self {
            attachment,
            style,
            file_name: None,
        }
    }

    pub fn with_file_name(mut self, file_name: Option<&'a str>) -> Self {
        self.file_name = file_name;
        self
    }

    /// Extension of the upload's file name, without the dot.
    pub fn file_extension(&self) -> Option<&'a str> {
        self.file_name
            .and_then(|name| std::path::Path::new(name).extension())
            .and_then(|ext| ext.to_str())
    }
}

#[async_trait]
pub trait Processor: Send + Sync {
    /// Registry name
    fn name(&self) -> &str;

    async fn process(
        &self,
        input: FileSource,
        context: &ProcessingContext<'_>,
    ) -> ProcessingResult<FileSource>;
}

/// Passes its input through unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct Identity;

#[async_trait]
impl Processor for Identity {
    fn name(&self) -> &str {
        "identity"
    }

    async fn process(
        &self,
        input: FileSource,
        _context: &ProcessingContext<'_>,
    ) -> ProcessingResult<FileSource> {
        Ok(input)
    }
}
