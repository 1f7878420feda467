//! Host record boundary
//!
//! The host data model is external. Per attachment it keeps the four
//! [`AttachmentMetadata`] fields and exposes any attributes that path templates
//! reference.

use std::collections::BTreeMap;

use affix_core::AttachmentMetadata;

pub trait Record: Send + Sync {
    /// Type name of the record, e.g. `User`. Interpolated as `:class`.
    fn class_name(&self) -> &str;

    /// Primary key, once the record has one.
    fn id(&self) -> Option<u64>;

    /// Value of a template-visible attribute.
    fn attribute(&self, name: &str) -> Option<String>;

    fn attachment_metadata(&self, attachment: &str) -> AttachmentMetadata;

    fn set_attachment_metadata(&mut self, attachment: &str, metadata: AttachmentMetadata);
}

/// A record held entirely in memory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlainRecord {
    pub class_name: String,
    pub id: Option<u64>,
    pub attributes: BTreeMap<String, String>,
    pub attachments: BTreeMap<String, AttachmentMetadata>,
}

impl PlainRecord {
    pub fn new(class_name: impl Into<String>) -> Self {
        Self {
            class_name: class_name.into(),
            ..Self::default()
        }
    }

    pub fn with_id(mut self, id: u64) -> Self {
        self.id = Some(id);
        self
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attribute(name, value);
        self
    }

    pub fn with_attachment(mut self, name: impl Into<String>, metadata: AttachmentMetadata) -> Self {
        self.attachments.insert(name.into(), metadata);
        self
    }

    pub fn set_attribute(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.attributes.insert(name.into(), value.into());
    }
}

impl Record for PlainRecord {
    fn class_name(&self) -> &str {
        &self.class_name
    }

    fn id(&self) -> Option<u64> {
        self.id
    }

    fn attribute(&self, name: &str) -> Option<String> {
        self.attributes.get(name).cloned()
    }

    fn attachment_metadata(&self, attachment: &str) -> AttachmentMetadata {
        self.attachments.get(attachment).cloned().unwrap_or_default()
    }

    fn set_attachment_metadata(&mut self, attachment: &str, metadata: AttachmentMetadata) {
        self.attachments.insert(attachment.to_string(), metadata);
    }
}
