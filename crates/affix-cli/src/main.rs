//! Affix CLI: generate thumbnails and manage attachments on the local filesystem.
//!
//! Reads AFFIX_* settings from the environment (or a .env file); files are
//! stored below AFFIX_STORAGE_ROOT.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use affix_attachment::Attacher;
use affix_cli::{build_definition, cli_record, init_tracing, parse_style, DEFAULT_CLI_PATH};
use affix_core::{AttachmentMetadata, FileSource, RuntimeConfig, StyleOptions, StyleSpec, Upload};
use affix_processing::{CommandRunner, ProcessingContext, Processor, Thumbnail};
use anyhow::Context;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "affix", about = "File attachments with styles and pluggable storage")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resize an image to a geometry such as 100x100 or 50x50#
    Thumbnail {
        /// Image to resize
        input: PathBuf,
        /// Target geometry
        #[arg(long)]
        geometry: String,
        /// Output file (defaults to <input>_thumb.<ext>)
        #[arg(long)]
        output: Option<PathBuf>,
        /// Output format, e.g. png
        #[arg(long)]
        format: Option<String>,
    },
    /// Expand a path template
    Interpolate {
        template: String,
        #[arg(long)]
        class: String,
        #[arg(long)]
        attachment: String,
        #[arg(long)]
        id: Option<u64>,
        #[arg(long, default_value = "original")]
        style: String,
        #[arg(long)]
        filename: Option<String>,
    },
    /// Store a file and its styles for a record
    Attach {
        file: PathBuf,
        #[arg(long)]
        class: String,
        #[arg(long)]
        id: u64,
        #[arg(long, default_value = "file")]
        attachment: String,
        /// Style as name=geometry; repeatable
        #[arg(long = "style", value_parser = parse_style)]
        styles: Vec<(String, String)>,
        #[arg(long)]
        format: Option<String>,
        #[arg(long, default_value = DEFAULT_CLI_PATH)]
        path: String,
        #[arg(long)]
        content_type: Option<String>,
    },
    /// Remove a stored file and all of its styles
    Detach {
        #[arg(long)]
        class: String,
        #[arg(long)]
        id: u64,
        #[arg(long)]
        filename: String,
        #[arg(long, default_value = "file")]
        attachment: String,
        /// Style as name=geometry; repeatable
        #[arg(long = "style", value_parser = parse_style)]
        styles: Vec<(String, String)>,
        #[arg(long)]
        format: Option<String>,
        #[arg(long, default_value = DEFAULT_CLI_PATH)]
        path: String,
    },
}

fn print_json(value: &serde_json::Value) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("Serialize output")?;
    println!("{}", out);
    Ok(())
}

fn default_output(input: &Path, format: Option<&str>) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    let extension = format
        .map(str::to_string)
        .or_else(|| input.extension().map(|e| e.to_string_lossy().into_owned()));

    let name = match extension {
        Some(ext) => format!("{}_thumb.{}", stem, ext),
        None => format!("{}_thumb", stem),
    };
    input.with_file_name(name)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    dotenvy::dotenv().ok();

    let config = RuntimeConfig::from_env().context("Invalid AFFIX_* environment")?;
    let cli = Cli::parse();

    match cli.command {
        Commands::Thumbnail {
            input,
            geometry,
            output,
            format,
        } => {
            let mut options = StyleOptions::geometry(geometry);
            if let Some(ref format) = format {
                options = options.with_format(format.as_str());
            }
            let style = StyleSpec::resolve("thumbnail", options, true, &["thumbnail".to_string()]);
            style.parsed_geometry()?;

            let runner = Arc::new(CommandRunner::from_config(&config));
            let thumbnail = Thumbnail::from_config(runner, &config);
            let file_name = input.file_name().map(|n| n.to_string_lossy().into_owned());
            let context = ProcessingContext::new("thumbnail", &style)
                .with_file_name(file_name.as_deref());

            let result = thumbnail
                .process(FileSource::Path(input.clone()), &context)
                .await
                .context("Thumbnail generation failed")?;

            let output = output.unwrap_or_else(|| default_output(&input, format.as_deref()));
            let data = result.read().await?;
            tokio::fs::write(&output, &data)
                .await
                .with_context(|| format!("Failed to write {}", output.display()))?;

            print_json(&serde_json::json!({
                "output": output.display().to_string(),
                "size_bytes": data.len(),
            }))?;
        }
        Commands::Interpolate {
            template,
            class,
            attachment,
            id,
            style,
            filename,
        } => {
            let definition = build_definition(&attachment, &template, &[], None)?;
            let attacher = Attacher::new(definition, config)?;
            let record = cli_record(&class, id, &attachment, None);
            let metadata = AttachmentMetadata {
                file_name: filename,
                ..AttachmentMetadata::default()
            };

            let expanded = attacher
                .token_values(&record, &metadata, &style)
                .interpolate(&template);
            println!("{}", expanded);
        }
        Commands::Attach {
            file,
            class,
            id,
            attachment,
            styles,
            format,
            path,
            content_type,
        } => {
            let definition = build_definition(&attachment, &path, &styles, format.as_deref())?;
            let attacher = Arc::new(Attacher::new(definition, config)?);
            let mut record = cli_record(&class, Some(id), &attachment, None);
            let mut stored = attacher.attachment(&record);

            let mut upload = Upload::from_path(&file);
            if let Some(content_type) = content_type {
                upload = upload.with_content_type(content_type);
            }

            stored.assign(&mut record, Some(upload)).await?;
            let report = stored.commit(&record).await?;

            print_json(&serde_json::json!({
                "written": report.written,
                "deleted": report.deleted,
                "url": stored.url(&record, None, false),
            }))?;
        }
        Commands::Detach {
            class,
            id,
            filename,
            attachment,
            styles,
            format,
            path,
        } => {
            let definition = build_definition(&attachment, &path, &styles, format.as_deref())?;
            let attacher = Arc::new(Attacher::new(definition, config)?);
            let mut record = cli_record(&class, Some(id), &attachment, Some(filename.as_str()));
            let mut stored = attacher.attachment(&record);

            let report = stored.destroy(&mut record).await?;

            print_json(&serde_json::json!({ "deleted": report.deleted }))?;
        }
    }

    Ok(())
}
