//! Shared fixtures for attachment lifecycle tests

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use affix_attachment::{Attacher, Record};
use affix_core::{AttachmentDefinition, AttachmentMetadata, FileSource, RuntimeConfig, Upload};
use affix_processing::{
    Identity, ProcessingContext, ProcessingResult, Processor, ProcessorRegistry,
};
use affix_storage::{Storage, StorageBackend, StorageError, StorageResult};
use async_trait::async_trait;
use bytes::Bytes;

/// One call received by [`MockStorage`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageCall {
    Write(String),
    Delete(String),
    Rename(String, String),
}

/// In-memory storage recording every call
#[derive(Default)]
pub struct MockStorage {
    files: Arc<Mutex<HashMap<String, Bytes>>>,
    calls: Arc<Mutex<Vec<StorageCall>>>,
}

impl MockStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<StorageCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn writes(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                StorageCall::Write(path) => Some(path),
                _ => None,
            })
            .collect()
    }

    pub fn deletes(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                StorageCall::Delete(path) => Some(path),
                _ => None,
            })
            .collect()
    }

    pub fn renames(&self) -> Vec<(String, String)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                StorageCall::Rename(from, to) => Some((from, to)),
                _ => None,
            })
            .collect()
    }

    pub fn reset_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    pub fn has_file(&self, path: &str) -> bool {
        self.files.lock().unwrap().contains_key(path)
    }

    pub fn get_file(&self, path: &str) -> Option<Bytes> {
        self.files.lock().unwrap().get(path).cloned()
    }

    fn record(&self, call: StorageCall) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl Storage for MockStorage {
    async fn write(
        &self,
        path: &str,
        data: FileSource,
        _content_type: Option<&str>,
    ) -> StorageResult<()> {
        let bytes = data.read().await.map_err(|source| StorageError::ReadFailed {
            path: path.to_string(),
            source,
        })?;
        self.files.lock().unwrap().insert(path.to_string(), bytes);
        self.record(StorageCall::Write(path.to_string()));
        Ok(())
    }

    async fn delete(&self, path: &str) -> StorageResult<()> {
        self.files.lock().unwrap().remove(path);
        self.record(StorageCall::Delete(path.to_string()));
        Ok(())
    }

    async fn exists(&self, path: &str) -> StorageResult<bool> {
        Ok(self.has_file(path))
    }

    async fn to_readable_file(&self, path: &str) -> StorageResult<Option<FileSource>> {
        Ok(self.get_file(path).map(FileSource::Memory))
    }

    async fn rename(&self, from: &str, to: &str, _content_type: Option<&str>) -> StorageResult<()> {
        let mut files = self.files.lock().unwrap();
        let data = files
            .remove(from)
            .ok_or_else(|| StorageError::NotFound(from.to_string()))?;
        files.insert(to.to_string(), data);
        drop(files);
        self.record(StorageCall::Rename(from.to_string(), to.to_string()));
        Ok(())
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Filesystem
    }
}

/// Wraps [`MockStorage`] and fails selected operations on demand.
#[derive(Default)]
pub struct FlakyStorage {
    pub inner: MockStorage,
    /// Writes to paths containing this fragment fail
    failing_writes: Mutex<Option<String>>,
    failing_renames: AtomicBool,
}

impl FlakyStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_writes_matching(&self, fragment: Option<&str>) {
        *self.failing_writes.lock().unwrap() = fragment.map(str::to_string);
    }

    pub fn fail_renames(&self, fail: bool) {
        self.failing_renames.store(fail, Ordering::SeqCst);
    }

    fn failure(path: &str, message: &str) -> StorageError {
        StorageError::WriteFailed {
            path: path.to_string(),
            source: std::io::Error::other(message.to_string()),
        }
    }
}

#[async_trait]
impl Storage for FlakyStorage {
    async fn write(
        &self,
        path: &str,
        data: FileSource,
        content_type: Option<&str>,
    ) -> StorageResult<()> {
        let failing = self.failing_writes.lock().unwrap().clone();
        if failing.is_some_and(|fragment| path.contains(&fragment)) {
            return Err(Self::failure(path, "disk full"));
        }
        self.inner.write(path, data, content_type).await
    }

    async fn delete(&self, path: &str) -> StorageResult<()> {
        self.inner.delete(path).await
    }

    async fn exists(&self, path: &str) -> StorageResult<bool> {
        self.inner.exists(path).await
    }

    async fn to_readable_file(&self, path: &str) -> StorageResult<Option<FileSource>> {
        self.inner.to_readable_file(path).await
    }

    async fn rename(&self, from: &str, to: &str, content_type: Option<&str>) -> StorageResult<()> {
        if self.failing_renames.load(Ordering::SeqCst) {
            return Err(Self::failure(to, "read-only bucket"));
        }
        self.inner.rename(from, to, content_type).await
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Filesystem
    }
}

/// Host record with a single `avatar` attachment
#[derive(Debug, Clone, Default)]
pub struct Dummy {
    pub id: Option<u64>,
    pub name: String,
    pub avatar: AttachmentMetadata,
}

impl Dummy {
    pub fn new(id: u64, name: &str) -> Self {
        Self {
            id: Some(id),
            name: name.to_string(),
            avatar: AttachmentMetadata::default(),
        }
    }
}

impl Record for Dummy {
    fn class_name(&self) -> &str {
        "Dummy"
    }

    fn id(&self) -> Option<u64> {
        self.id
    }

    fn attribute(&self, name: &str) -> Option<String> {
        match name {
            "name" => Some(self.name.clone()),
            _ => None,
        }
    }

    fn attachment_metadata(&self, _attachment: &str) -> AttachmentMetadata {
        self.avatar.clone()
    }

    fn set_attachment_metadata(&mut self, _attachment: &str, metadata: AttachmentMetadata) {
        self.avatar = metadata;
    }
}

/// Stand-in for the thumbnail processor: tags the data with the style geometry.
pub struct FakeThumbnail;

#[async_trait]
impl Processor for FakeThumbnail {
    fn name(&self) -> &str {
        "thumbnail"
    }

    async fn process(
        &self,
        input: FileSource,
        context: &ProcessingContext<'_>,
    ) -> ProcessingResult<FileSource> {
        let mut data = input.read().await?.to_vec();
        data.extend_from_slice(b"@");
        data.extend_from_slice(context.style.geometry.as_deref().unwrap_or("").as_bytes());
        Ok(FileSource::Memory(Bytes::from(data)))
    }
}

/// Always fails, as a missing conversion tool would.
pub struct BrokenThumbnail;

#[async_trait]
impl Processor for BrokenThumbnail {
    fn name(&self) -> &str {
        "thumbnail"
    }

    async fn process(
        &self,
        _input: FileSource,
        _context: &ProcessingContext<'_>,
    ) -> ProcessingResult<FileSource> {
        Err(affix_processing::CommandError::NotFound {
            command: "convert".to_string(),
        }
        .into())
    }
}

pub fn fake_registry() -> ProcessorRegistry {
    let mut registry = ProcessorRegistry::new();
    registry.register(Arc::new(FakeThumbnail));
    registry.register(Arc::new(Identity));
    registry
}

/// Styles `original` (unprocessed) and `small` (16x16), path keyed on `:name`.
pub fn dummy_definition() -> AttachmentDefinition {
    AttachmentDefinition::builder("avatar")
        .path("/:class/:attachment/:name/:style/:filename")
        .url("/system/:class/:attachment/:id/:style/:filename")
        .record_token("name")
        .style("small", "16x16")
        .build()
        .unwrap()
}

pub fn attacher_with(
    definition: AttachmentDefinition,
    storage: Arc<dyn Storage>,
    registry: ProcessorRegistry,
) -> Arc<Attacher> {
    Arc::new(
        Attacher::with_parts(
            definition,
            storage,
            registry,
            RuntimeConfig::default().with_environment("test"),
        )
        .unwrap(),
    )
}

pub fn setup() -> (Arc<MockStorage>, Arc<Attacher>) {
    let storage = Arc::new(MockStorage::new());
    let attacher = attacher_with(dummy_definition(), storage.clone(), fake_registry());
    (storage, attacher)
}

pub fn flaky_setup() -> (Arc<FlakyStorage>, Arc<Attacher>) {
    let storage = Arc::new(FlakyStorage::new());
    let attacher = attacher_with(dummy_definition(), storage.clone(), fake_registry());
    (storage, attacher)
}

pub fn image_upload() -> Upload {
    Upload::from_bytes("image.jpg", Bytes::from_static(b"jpeg data")).with_content_type("image/jpeg")
}
