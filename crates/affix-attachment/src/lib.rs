//! Affix Attachment Library
//!
//! Binds an [`AttachmentDefinition`](affix_core::AttachmentDefinition) to a host
//! record. An [`Attachment`] stages uploads and removals without touching
//! storage; [`Attachment::commit`] is the only operation that performs I/O and
//! is meant to run from the host's save hook.
//!
//! ```ignore
//! let attacher = Arc::new(Attacher::new(definition, RuntimeConfig::from_env()?)?);
//! let mut avatar = attacher.attachment(&user);
//! avatar.assign(&mut user, Some(Upload::from_path("me.png"))).await?;
//! user.save()?;
//! avatar.commit(&user).await?;
//! ```

pub mod attacher;
pub mod attachment;
pub mod error;
pub mod record;

pub use attacher::Attacher;
pub use attachment::{Attachment, CommitReport};
pub use error::{AttachmentError, AttachmentResult};
pub use record::{PlainRecord, Record};
