//! Thumbnail processor
//!
//! Resizes the input to the style geometry with the external conversion tool.
//! Crop geometries (`#`) scale to cover the target box and then centre-crop; only
//! those need the source dimensions, so the identify probe runs for them alone.

use std::sync::Arc;

use affix_core::file_source::new_temp_path;
use affix_core::{FileSource, Geometry, RuntimeConfig, StyleSpec, Transformation};
use async_trait::async_trait;

use crate::command::{quote, CommandRunner};
use crate::error::{ProcessingError, ProcessingResult};
use crate::identify::identify;
use crate::traits::{ProcessingContext, Processor};

pub const THUMBNAIL: &str = "thumbnail";

/// `-resize "<scale>"`, followed by `-crop "<crop>" +repage` for crop geometries.
pub fn transformation_arguments(transformation: &Transformation) -> String {
    let mut args = format!("-resize {}", quote(&transformation.scale.to_string()));
    if let Some(crop) = &transformation.crop {
        args.push_str(&format!(" -crop {} +repage", quote(&crop.to_string())));
    }
    args
}

/// Conversion arguments with the style's source and destination options around
/// the resize clause.
pub fn convert_arguments(style: &StyleSpec, transformation: &Transformation) -> String {
    let resize = transformation_arguments(transformation);
    let fragments = [
        style.source_options.as_deref(),
        Some(resize.as_str()),
        style.destination_options.as_deref(),
    ];

    fragments
        .into_iter()
        .flatten()
        .map(str::trim)
        .filter(|fragment| !fragment.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

pub struct Thumbnail {
    runner: Arc<CommandRunner>,
    convert_command: String,
    identify_command: String,
}

impl Thumbnail {
    pub fn new(
        runner: Arc<CommandRunner>,
        convert_command: impl Into<String>,
        identify_command: impl Into<String>,
    ) -> Self {
        Self {
            runner,
            convert_command: convert_command.into(),
            identify_command: identify_command.into(),
        }
    }

    pub fn from_config(runner: Arc<CommandRunner>, config: &RuntimeConfig) -> Self {
        Self::new(
            runner,
            config.convert_command.clone(),
            config.identify_command.clone(),
        )
    }

    fn target_geometry(style: &StyleSpec) -> ProcessingResult<Geometry> {
        style
            .parsed_geometry()?
            .ok_or_else(|| ProcessingError::MissingGeometry {
                processor: THUMBNAIL.to_string(),
            })
    }
}

#[async_trait]
impl Processor for Thumbnail {
    fn name(&self) -> &str {
        THUMBNAIL
    }

    async fn process(
        &self,
        input: FileSource,
        context: &ProcessingContext<'_>,
    ) -> ProcessingResult<FileSource> {
        let style = context.style;
        let target = Self::target_geometry(style)?;

        let input_extension = input
            .extension()
            .map(str::to_string)
            .or_else(|| context.file_extension().map(str::to_string));
        let local = input.materialize(input_extension.as_deref()).await?;

        let transformation = if target.is_crop() {
            let source = identify(&self.runner, &self.identify_command, local.path()).await?;
            source.transformation_to(&target, true)?
        } else {
            target.transformation_to(&target, false)?
        };

        let output_extension = style.format.as_deref().or(input_extension.as_deref());
        let output = new_temp_path(output_extension)?;

        let args = format!(
            "{} {} {}",
            quote(&local.path().to_string_lossy()),
            convert_arguments(style, &transformation),
            quote(&output.to_string_lossy())
        );

        tracing::debug!(
            attachment = %context.attachment,
            style = %style.name,
            geometry = %target,
            "Generating thumbnail"
        );

        self.runner.run(&self.convert_command, &args, &[0]).await?;

        Ok(FileSource::temp(output))
    }
}
