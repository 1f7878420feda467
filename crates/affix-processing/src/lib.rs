//! Affix Processing Library
//!
//! Turns an uploaded file into the variant stored for one style: the
//! [`CommandRunner`] wrapper around external tools, the [`Processor`] trait and
//! its registry, the built-in thumbnail processor and the per-style pipeline.

pub mod command;
pub mod error;
pub mod identify;
pub mod pipeline;
pub mod registry;
pub mod thumbnail;
pub mod traits;

pub use command::{quote, CommandError, CommandRunner};
pub use error::{ProcessingError, ProcessingResult};
pub use identify::identify;
pub use pipeline::ProcessorPipeline;
pub use registry::ProcessorRegistry;
pub use thumbnail::{convert_arguments, transformation_arguments, Thumbnail};
pub use traits::{Identity, ProcessingContext, Processor};
