//! Affix Storage Library
//!
//! This crate provides the `Storage` trait attachments persist their styles
//! through, with a local filesystem implementation and a bucket-keyed remote
//! object-store implementation.
//!
//! # Paths
//!
//! Paths are the output of an attachment's path template and are used verbatim
//! as keys. The filesystem backend resolves them below its root directory (a
//! leading `/` is ignored); the object-store backend uses them as object keys.
//! Paths must not contain `..` segments.

#[cfg(feature = "storage-objectstore")]
pub mod credentials;
pub mod factory;
#[cfg(feature = "storage-filesystem")]
pub mod local;
#[cfg(feature = "storage-objectstore")]
pub mod objectstore;
pub mod traits;

// Re-export commonly used types
pub use affix_core::StorageBackend;
pub use factory::{create_storage, StorageFactory, StorageRegistry};
#[cfg(feature = "storage-filesystem")]
pub use local::FilesystemStorage;
#[cfg(feature = "storage-objectstore")]
pub use objectstore::ObjectStoreStorage;
pub use traits::{Storage, StorageError, StorageResult};
