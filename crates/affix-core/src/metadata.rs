//! Attachment metadata mirrored on the host record

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The four fields a host record keeps per attachment.
///
/// An attachment is present exactly when `file_name` is set. Validation
/// collaborators read these fields; only the attachment lifecycle writes them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentMetadata {
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub byte_size: Option<u64>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl AttachmentMetadata {
    pub fn is_present(&self) -> bool {
        self.file_name.is_some()
    }

    /// File name without its last extension.
    pub fn basename(&self) -> Option<&str> {
        self.file_name.as_deref().map(|name| match name.rfind('.') {
            Some(idx) if idx > 0 => &name[..idx],
            _ => name,
        })
    }

    /// Last extension of the file name, without the dot.
    pub fn extension(&self) -> Option<&str> {
        self.file_name
            .as_deref()
            .and_then(|name| match name.rfind('.') {
                Some(idx) if idx > 0 && idx + 1 < name.len() => Some(&name[idx + 1..]),
                _ => None,
            })
    }

    pub fn timestamp(&self) -> Option<i64> {
        self.updated_at.map(|t| t.timestamp())
    }
}
