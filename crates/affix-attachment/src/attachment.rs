//! Attachment lifecycle
//!
//! An attachment is either `Persisted` (storage matches the record) or `Staged`
//! with pending writes and deletes. `assign` and `clear` only stage changes;
//! `commit` applies them in a fixed order:
//!
//! 1. rename every style whose path moved because a templated record field changed
//! 2. write staged styles to their freshly computed paths
//! 3. delete queued stale paths
//! 4. snapshot the paths now on storage for the next cycle
//!
//! A failing step aborts the rest of the commit. Steps already applied stay
//! applied, and the ones that did not run stay staged for the next `commit`.

use std::collections::BTreeMap;
use std::sync::Arc;

use affix_core::{AttachmentMetadata, FileSource, Upload};
use affix_processing::ProcessingContext;
use chrono::Utc;

use crate::attacher::Attacher;
use crate::error::{AttachmentError, AttachmentResult};
use crate::record::Record;

/// Storage operations performed by one commit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommitReport {
    /// `(from, to)` pairs
    pub renamed: Vec<(String, String)>,
    pub written: Vec<String>,
    pub deleted: Vec<String>,
}

impl CommitReport {
    pub fn is_empty(&self) -> bool {
        self.renamed.is_empty() && self.written.is_empty() && self.deleted.is_empty()
    }
}

#[derive(Debug, Default)]
struct PendingChanges {
    /// Processed output per style
    to_write: BTreeMap<String, FileSource>,
    to_delete: Vec<String>,
    /// The stored file was replaced or removed; old paths are deleted, not renamed.
    replaced: bool,
    /// Paths written by an earlier, interrupted commit of this cycle
    written: Vec<String>,
}

impl PendingChanges {
    fn queue_delete(&mut self, path: &str) {
        if !self.to_delete.iter().any(|queued| queued == path) {
            self.to_delete.push(path.to_string());
        }
    }

    fn has_work(&self) -> bool {
        self.replaced || !self.to_write.is_empty() || !self.to_delete.is_empty()
    }
}

#[derive(Debug)]
enum AttachmentState {
    Persisted,
    Staged(PendingChanges),
}

pub struct Attachment {
    attacher: Arc<Attacher>,
    existing_paths: BTreeMap<String, String>,
    state: AttachmentState,
}

impl Attachment {
    pub(crate) fn new(attacher: Arc<Attacher>, record: &dyn Record) -> Self {
        let existing_paths = attacher.existing_paths(record);
        Self {
            attacher,
            existing_paths,
            state: AttachmentState::Persisted,
        }
    }

    pub fn name(&self) -> &str {
        self.attacher.name()
    }

    pub fn attacher(&self) -> &Arc<Attacher> {
        &self.attacher
    }

    /// Whether changes are staged and waiting for [`commit`](Self::commit).
    pub fn is_dirty(&self) -> bool {
        matches!(self.state, AttachmentState::Staged(_))
    }

    /// Paths of every style as of the last commit (or construction).
    pub fn existing_paths(&self) -> &BTreeMap<String, String> {
        &self.existing_paths
    }

    /// Styles with staged output
    pub fn pending_writes(&self) -> Vec<&str> {
        match &self.state {
            AttachmentState::Staged(pending) => {
                pending.to_write.keys().map(String::as_str).collect()
            }
            AttachmentState::Persisted => Vec::new(),
        }
    }

    /// Paths queued for deletion
    pub fn pending_deletes(&self) -> &[String] {
        match &self.state {
            AttachmentState::Staged(pending) => &pending.to_delete,
            AttachmentState::Persisted => &[],
        }
    }

    pub fn metadata(&self, record: &dyn Record) -> AttachmentMetadata {
        record.attachment_metadata(self.name())
    }

    pub fn is_present(&self, record: &dyn Record) -> bool {
        self.metadata(record).is_present()
    }

    /// Move to the staged state (if not already there) and update the pending changes.
    fn stage(&mut self, update: impl FnOnce(&mut PendingChanges)) {
        let mut pending = match std::mem::replace(&mut self.state, AttachmentState::Persisted) {
            AttachmentState::Staged(pending) => pending,
            AttachmentState::Persisted => PendingChanges::default(),
        };
        update(&mut pending);
        self.state = AttachmentState::Staged(pending);
    }

    /// Stage `upload` as the new file, or behave like [`clear`](Self::clear) for `None`.
    ///
    /// Every style is processed here; nothing is written until `commit`. A strict
    /// style's processing failure leaves the record and the staged state unchanged.
    pub async fn assign(
        &mut self,
        record: &mut dyn Record,
        upload: Option<Upload>,
    ) -> AttachmentResult<()> {
        let Some(upload) = upload else {
            self.clear(record);
            return Ok(());
        };

        let name = self.name().to_string();
        let byte_size = upload
            .size()
            .await
            .map_err(|source| AttachmentError::Io {
                attachment: name.clone(),
                source,
            })?;

        let mut to_write = BTreeMap::new();
        for style in self.attacher.definition().styles() {
            let context = ProcessingContext::new(&name, style)
                .with_file_name(Some(upload.file_name.as_str()));
            let output = self
                .attacher
                .pipeline()
                .process_style(&upload.source, &context)
                .await
                .map_err(|source| AttachmentError::processing(&name, &style.name, source))?;
            to_write.insert(style.name.clone(), output);
        }

        self.clear(record);

        let metadata = AttachmentMetadata {
            content_type: Some(upload.content_type_or_default().to_string()),
            file_name: Some(upload.file_name),
            byte_size: Some(byte_size),
            updated_at: Some(Utc::now()),
        };

        tracing::debug!(
            attachment = %name,
            file_name = ?metadata.file_name,
            size_bytes = byte_size,
            styles = to_write.len(),
            "Attachment assigned"
        );

        record.set_attachment_metadata(&name, metadata);

        self.stage(|pending| {
            pending.to_write = to_write;
            pending.replaced = true;
        });

        Ok(())
    }

    /// Stage removal of the stored file: queue deletion of every style's
    /// existing path and reset the record's metadata.
    pub fn clear(&mut self, record: &mut dyn Record) {
        let name = self.name().to_string();
        let was_present = record.attachment_metadata(&name).is_present();
        let existing: Vec<String> = self.existing_paths.values().cloned().collect();

        self.stage(|pending| {
            if was_present {
                for path in &existing {
                    pending.queue_delete(path);
                }
            }
            for path in std::mem::take(&mut pending.written) {
                pending.queue_delete(&path);
            }
            pending.to_write.clear();
            pending.replaced = true;
        });

        record.set_attachment_metadata(&name, AttachmentMetadata::default());
    }

    /// Apply staged changes to storage. Call after the host record was saved.
    ///
    /// On failure the steps that did not complete remain staged, so calling
    /// `commit` again finishes the original change.
    pub async fn commit(&mut self, record: &dyn Record) -> AttachmentResult<CommitReport> {
        let mut pending = match std::mem::replace(&mut self.state, AttachmentState::Persisted) {
            AttachmentState::Staged(pending) => pending,
            AttachmentState::Persisted => PendingChanges::default(),
        };

        let start = std::time::Instant::now();
        let mut report = CommitReport::default();

        if let Err(err) = self.apply(record, &mut pending, &mut report).await {
            if pending.has_work() {
                self.state = AttachmentState::Staged(pending);
            }
            return Err(err);
        }

        self.existing_paths = self.attacher.existing_paths(record);

        if !report.is_empty() {
            tracing::info!(
                attachment = %self.name(),
                backend = %self.attacher.storage().backend_type(),
                renamed = report.renamed.len(),
                written = report.written.len(),
                deleted = report.deleted.len(),
                duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                "Attachment committed"
            );
        }

        Ok(report)
    }

    /// Run the commit steps, dropping each from `pending` once it succeeded.
    async fn apply(
        &mut self,
        record: &dyn Record,
        pending: &mut PendingChanges,
        report: &mut CommitReport,
    ) -> AttachmentResult<()> {
        let metadata = self.metadata(record);
        let content_type = metadata.content_type.as_deref();

        if !pending.replaced && metadata.is_present() {
            self.flush_renames(record, &metadata, report).await?;
        }

        let styles: Vec<String> = pending.to_write.keys().cloned().collect();
        for style in styles {
            let Some(source) = pending.to_write.get(&style).cloned() else {
                continue;
            };
            let path = self.attacher.interpolate_path(record, &metadata, &style);
            self.attacher
                .storage()
                .write(&path, source, content_type)
                .await
                .map_err(|source| self.storage_error(Some(&style), "write", &path, source))?;
            pending.to_write.remove(&style);
            pending.written.push(path.clone());
            report.written.push(path);
        }

        while let Some(path) = pending.to_delete.first().cloned() {
            if !pending.written.contains(&path) {
                self.attacher
                    .storage()
                    .delete(&path)
                    .await
                    .map_err(|source| self.storage_error(None, "delete", &path, source))?;
                report.deleted.push(path);
            }
            pending.to_delete.remove(0);
        }

        Ok(())
    }

    async fn flush_renames(
        &mut self,
        record: &dyn Record,
        metadata: &AttachmentMetadata,
        report: &mut CommitReport,
    ) -> AttachmentResult<()> {
        let content_type = metadata.content_type.as_deref();
        let styles: Vec<(String, String)> = self
            .existing_paths
            .iter()
            .map(|(style, path)| (style.clone(), path.clone()))
            .collect();

        for (style, old_path) in styles {
            let new_path = self.attacher.interpolate_path(record, metadata, &style);
            if new_path == old_path {
                continue;
            }

            self.attacher
                .storage()
                .rename(&old_path, &new_path, content_type)
                .await
                .map_err(|source| self.storage_error(Some(&style), "rename", &old_path, source))?;

            self.existing_paths.insert(style, new_path.clone());
            report.renamed.push((old_path, new_path));
        }

        Ok(())
    }

    /// Clear and commit in one step, removing every stored style.
    pub async fn destroy(&mut self, record: &mut dyn Record) -> AttachmentResult<CommitReport> {
        self.clear(record);
        self.commit(record).await
    }

    /// Storage path of `style` (the default style when `None`), or `None`
    /// when no file is attached.
    pub fn path(&self, record: &dyn Record, style: Option<&str>) -> Option<String> {
        let metadata = self.metadata(record);
        if !metadata.is_present() {
            return None;
        }
        let style = style.unwrap_or_else(|| self.attacher.definition().default_style());
        Some(self.attacher.interpolate_path(record, &metadata, style))
    }

    /// Public URL of `style`. Without a file this is the default URL. With
    /// `include_timestamp` the upload time is appended as a cache buster.
    pub fn url(&self, record: &dyn Record, style: Option<&str>, include_timestamp: bool) -> String {
        let definition = self.attacher.definition();
        let style = style.unwrap_or_else(|| definition.default_style());
        let metadata = self.metadata(record);
        let values = self.attacher.token_values(record, &metadata, style);

        if !metadata.is_present() {
            return values.interpolate(definition.default_url_template());
        }

        let url = values.interpolate(definition.url_template());
        match metadata.timestamp() {
            Some(timestamp) if include_timestamp => {
                let separator = if url.contains('?') { '&' } else { '?' };
                format!("{}{}{}", url, separator, timestamp)
            }
            _ => url,
        }
    }

    fn storage_error(
        &self,
        style: Option<&str>,
        operation: &'static str,
        path: &str,
        source: affix_storage::StorageError,
    ) -> AttachmentError {
        tracing::error!(
            attachment = %self.name(),
            style = ?style,
            operation = operation,
            path = %path,
            error = %source,
            "Storage operation failed"
        );
        AttachmentError::Storage {
            attachment: self.name().to_string(),
            style: style.map(str::to_string),
            operation,
            path: path.to_string(),
            source,
        }
    }
}
