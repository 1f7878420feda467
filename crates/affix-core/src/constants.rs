//! Default values shared across crates.

pub const DEFAULT_ENVIRONMENT: &str = "development";
pub const DEFAULT_STYLE: &str = "original";
pub const DEFAULT_PATH: &str = "system/:class/:attachment/:id_partition/:style/:filename";
pub const DEFAULT_URL: &str = "/system/:class/:attachment/:id_partition/:style/:filename";
pub const DEFAULT_MISSING_URL: &str = "/system/:class/:attachment/default/:style.png";
pub const DEFAULT_PROCESSOR: &str = "thumbnail";
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";
pub const CONVERT_COMMAND: &str = "convert";
pub const IDENTIFY_COMMAND: &str = "identify";

/// Permission bits applied to files written by the filesystem backend.
pub const FILE_PERMISSIONS: u32 = 0o644;
pub const DEFAULT_FILE_NAME: &str = "upload";
