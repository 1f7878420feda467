use std::path::Path;

use affix_core::Geometry;

use crate::command::{quote, CommandRunner};
use crate::error::{ProcessingError, ProcessingResult};

/// Probe the pixel dimensions of the first frame of `path`.
pub async fn identify(
    runner: &CommandRunner,
    identify_command: &str,
    path: &Path,
) -> ProcessingResult<Geometry> {
    let args = format!(
        "-format {} {}",
        quote("%wx%h"),
        quote(&format!("{}[0]", path.display()))
    );
    let output = runner.run(identify_command, &args, &[0]).await?;

    Geometry::from_identify_output(output.trim()).map_err(|_| {
        ProcessingError::UnreadableDimensions {
            output: output.trim().to_string(),
        }
    })
}
