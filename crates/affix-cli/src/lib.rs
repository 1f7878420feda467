use affix_core::{
    AttachmentDefinition, AttachmentMetadata, ConfigResult, StorageConfig, StyleOptions,
};
use affix_attachment::PlainRecord;

/// Path template used by `attach` and `detach` when none is given.
pub const DEFAULT_CLI_PATH: &str = ":class/:attachment/:id_partition/:style/:filename";

/// Parse a `name=geometry` style argument.
pub fn parse_style(arg: &str) -> Result<(String, String), String> {
    match arg.split_once('=') {
        Some((name, geometry)) if !name.trim().is_empty() && !geometry.trim().is_empty() => {
            Ok((name.trim().to_string(), geometry.trim().to_string()))
        }
        _ => Err(format!("expected name=geometry, got {:?}", arg)),
    }
}

/// Definition for the filesystem backend with the given styles.
pub fn build_definition(
    attachment: &str,
    path: &str,
    styles: &[(String, String)],
    format: Option<&str>,
) -> ConfigResult<AttachmentDefinition> {
    let mut builder = AttachmentDefinition::builder(attachment)
        .path(path)
        .storage(StorageConfig::filesystem());

    for (name, geometry) in styles {
        let mut options = StyleOptions::geometry(geometry.as_str());
        if let Some(format) = format {
            options = options.with_format(format);
        }
        builder = builder.style(name.as_str(), options);
    }

    builder.build()
}

/// In-memory record standing in for a host row.
pub fn cli_record(class: &str, id: Option<u64>, attachment: &str, file_name: Option<&str>) -> PlainRecord {
    let mut record = PlainRecord::new(class);
    record.id = id;
    if let Some(file_name) = file_name {
        record = record.with_attachment(
            attachment,
            AttachmentMetadata {
                file_name: Some(file_name.to_string()),
                ..AttachmentMetadata::default()
            },
        );
    }
    record
}

/// Initialize tracing for CLI binaries.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();
}
