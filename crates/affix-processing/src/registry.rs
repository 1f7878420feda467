//! Processor registry
//!
//! Styles name their processors; the registry maps those names to
//! implementations. Unknown names are reported when an attachment is set up,
//! not when the first file is processed.

use std::collections::HashMap;
use std::sync::Arc;

use affix_core::{AttachmentDefinition, ConfigError, ConfigResult, RuntimeConfig};

use crate::command::CommandRunner;
use crate::error::{ProcessingError, ProcessingResult};
use crate::thumbnail::Thumbnail;
use crate::traits::{Identity, Processor};

#[derive(Clone, Default)]
pub struct ProcessorRegistry {
    processors: HashMap<String, Arc<dyn Processor>>,
}

impl ProcessorRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with `thumbnail` and `identity` (also reachable as `null`).
    pub fn with_builtins(runner: Arc<CommandRunner>, config: &RuntimeConfig) -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(Thumbnail::from_config(runner, config)));

        let identity: Arc<dyn Processor> = Arc::new(Identity);
        registry.register_as("null", identity.clone());
        registry.register(identity);

        registry
    }

    /// Register a processor under its own name
    pub fn register(&mut self, processor: Arc<dyn Processor>) {
        let name = processor.name().to_string();
        self.register_as(name, processor);
    }

    /// Register a processor under an explicit name, replacing any previous one.
    pub fn register_as(&mut self, name: impl Into<String>, processor: Arc<dyn Processor>) {
        self.processors.insert(name.into(), processor);
    }

    pub fn get(&self, name: &str) -> ProcessingResult<Arc<dyn Processor>> {
        self.processors
            .get(name)
            .cloned()
            .ok_or_else(|| ProcessingError::ProcessorNotFound {
                name: name.to_string(),
            })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.processors.contains_key(name)
    }

    /// Registered processor names, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.processors.keys().cloned().collect();
        names.sort();
        names
    }

    /// Check that every processor named by any style of `definition` is registered.
    pub fn validate(&self, definition: &AttachmentDefinition) -> ConfigResult<()> {
        for style in definition.styles() {
            if let Some(name) = style.processors.iter().find(|p| !self.contains(p)) {
                return Err(ConfigError::UnknownProcessor {
                    name: name.clone(),
                    style: style.name.clone(),
                });
            }
        }
        Ok(())
    }
}
