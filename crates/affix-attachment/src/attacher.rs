//! Attacher: a definition bound to its storage backend and processors
//!
//! One `Attacher` exists per attachment definition and is shared (behind an
//! `Arc`) by every [`Attachment`] instance created from it.

use std::collections::BTreeMap;
use std::sync::Arc;

use affix_core::{
    id_partition, pluralize, underscore, AttachmentDefinition, AttachmentMetadata, RuntimeConfig,
    TokenValues,
};
use affix_processing::{CommandRunner, ProcessorPipeline, ProcessorRegistry};
use affix_storage::{Storage, StorageError, StorageRegistry};

use crate::attachment::Attachment;
use crate::error::{AttachmentError, AttachmentResult};
use crate::record::Record;

pub struct Attacher {
    definition: AttachmentDefinition,
    storage: Arc<dyn Storage>,
    pipeline: ProcessorPipeline,
    config: RuntimeConfig,
}

impl Attacher {
    /// Bind `definition` to the built-in storage backends and processors.
    pub fn new(definition: AttachmentDefinition, config: RuntimeConfig) -> AttachmentResult<Self> {
        let storage = StorageRegistry::with_builtins()
            .create(definition.storage(), &config)
            .map_err(|source| match source {
                StorageError::Config(error) => AttachmentError::Configuration(error),
                source => AttachmentError::Storage {
                    attachment: definition.name().to_string(),
                    style: None,
                    operation: "connect",
                    path: String::new(),
                    source,
                },
            })?;

        let runner = Arc::new(CommandRunner::from_config(&config));
        let processors = ProcessorRegistry::with_builtins(runner, &config);

        Self::with_parts(definition, storage, processors, config)
    }

    /// Bind `definition` to an explicit backend and processor registry.
    ///
    /// Fails if any style names a processor the registry does not know.
    pub fn with_parts(
        definition: AttachmentDefinition,
        storage: Arc<dyn Storage>,
        processors: ProcessorRegistry,
        config: RuntimeConfig,
    ) -> AttachmentResult<Self> {
        processors.validate(&definition)?;

        tracing::debug!(
            attachment = %definition.name(),
            backend = %storage.backend_type(),
            styles = ?definition.style_names().collect::<Vec<_>>(),
            "Attacher configured"
        );

        Ok(Self {
            definition,
            storage,
            pipeline: ProcessorPipeline::new(Arc::new(processors)),
            config,
        })
    }

    pub fn name(&self) -> &str {
        self.definition.name()
    }

    pub fn definition(&self) -> &AttachmentDefinition {
        &self.definition
    }

    pub fn storage(&self) -> &Arc<dyn Storage> {
        &self.storage
    }

    pub fn pipeline(&self) -> &ProcessorPipeline {
        &self.pipeline
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// Attachment state for `record`, with the paths currently on storage
    /// snapshotted from its metadata.
    pub fn attachment(self: &Arc<Self>, record: &dyn Record) -> Attachment {
        Attachment::new(Arc::clone(self), record)
    }

    /// Token table for one style of `record`.
    pub fn token_values(
        &self,
        record: &dyn Record,
        metadata: &AttachmentMetadata,
        style: &str,
    ) -> TokenValues {
        let mut values = TokenValues::new();

        for token in self.definition.record_tokens() {
            values.insert_opt(token.as_str(), record.attribute(token));
        }

        let class = underscore(record.class_name());
        values.insert("class", pluralize(&class));
        values.insert("class_singular", class);
        values.insert("attachment", pluralize(self.name()));
        values.insert("attachment_singular", self.name());

        if let Some(id) = record.id() {
            values.insert("id", id.to_string());
            values.insert("id_partition", id_partition(id));
        }

        values.insert("style", style);
        values.insert_opt("filename", metadata.file_name.as_deref());
        values.insert_opt("basename", metadata.basename());

        let format = self
            .definition
            .style(style)
            .and_then(|spec| spec.format.as_deref());
        values.insert_opt("extension", format.or_else(|| metadata.extension()));

        values.insert("environment", self.config.environment.as_str());
        values.insert_opt("timestamp", metadata.timestamp().map(|t| t.to_string()));

        let storage = self.definition.storage();
        values.insert_opt("bucket", storage.bucket.as_deref());
        values.insert_opt("protocol", storage.protocol.as_deref());
        values.insert_opt("host_alias", storage.host_alias.as_deref());

        values
    }

    /// Storage path of `style`, computed from `metadata` whether or not a file
    /// is present.
    pub(crate) fn interpolate_path(
        &self,
        record: &dyn Record,
        metadata: &AttachmentMetadata,
        style: &str,
    ) -> String {
        self.token_values(record, metadata, style)
            .interpolate(self.definition.path_template())
    }

    /// Path of every style, or nothing when no file is present.
    pub(crate) fn existing_paths(&self, record: &dyn Record) -> BTreeMap<String, String> {
        let metadata = record.attachment_metadata(self.name());
        if !metadata.is_present() {
            return BTreeMap::new();
        }

        self.definition
            .style_names()
            .map(|style| {
                (
                    style.to_string(),
                    self.interpolate_path(record, &metadata, style),
                )
            })
            .collect()
    }
}
