//! Attachment definitions
//!
//! An [`AttachmentDefinition`] is the immutable, fully resolved configuration of one
//! named attachment on one host record type: templates, styles and storage. It is
//! built once and shared by every attachment instance.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_MISSING_URL, DEFAULT_PATH, DEFAULT_PROCESSOR, DEFAULT_STYLE, DEFAULT_URL,
};
use crate::error::{ConfigError, ConfigResult};
use crate::storage_types::StorageConfig;
use crate::style::{StyleEntry, StyleOptions, StyleSpec};

/// Definition options as written by the user. Unknown keys are rejected.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DefinitionOptions {
    pub path: Option<String>,
    pub url: Option<String>,
    pub default_url: Option<String>,
    pub default_style: Option<String>,
    /// Definition-wide default for each style's `strict` flag.
    pub whiny: Option<bool>,
    /// Processor chain for styles that do not name their own.
    pub default_processors: Option<Vec<String>>,
    pub all_styles: StyleOptions,
    pub styles: BTreeMap<String, StyleEntry>,
    pub storage: StorageConfig,
    /// Record attributes exposed to templates as `:<name>`.
    pub record_tokens: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct AttachmentDefinition {
    name: String,
    path: String,
    url: String,
    default_url: String,
    default_style: String,
    styles: BTreeMap<String, StyleSpec>,
    storage: StorageConfig,
    record_tokens: Vec<String>,
}

impl AttachmentDefinition {
    pub fn new(name: impl Into<String>, options: DefinitionOptions) -> ConfigResult<Self> {
        let name = name.into();
        let default_strict = options.whiny.unwrap_or(true);
        let default_processors = options
            .default_processors
            .unwrap_or_else(|| vec![DEFAULT_PROCESSOR.to_string()]);

        let mut styles = BTreeMap::new();
        for (style_name, entry) in options.styles {
            let merged = options.all_styles.overlay(&entry.into_options());
            let spec = StyleSpec::resolve(&style_name, merged, default_strict, &default_processors);
            styles.insert(style_name, spec);
        }

        if !styles.contains_key(DEFAULT_STYLE) {
            let original = StyleOptions::default().with_processors(Vec::<String>::new());
            let merged = options.all_styles.overlay(&original);
            let spec = StyleSpec::resolve(DEFAULT_STYLE, merged, default_strict, &[]);
            styles.insert(DEFAULT_STYLE.to_string(), spec);
        }

        for spec in styles.values() {
            if let Some(geometry) = spec.parsed_geometry()? {
                if geometry.is_crop() && (geometry.width.is_none() || geometry.height.is_none()) {
                    return Err(ConfigError::IncompleteCropGeometry {
                        geometry: geometry.to_string(),
                    });
                }
            }
        }

        let default_style = options
            .default_style
            .unwrap_or_else(|| DEFAULT_STYLE.to_string());
        if !styles.contains_key(&default_style) {
            return Err(ConfigError::UnknownStyle {
                name: default_style,
            });
        }

        tracing::debug!(
            attachment = %name,
            styles = ?styles.keys().collect::<Vec<_>>(),
            backend = %options.storage.backend,
            "Attachment definition resolved"
        );

        Ok(Self {
            name,
            path: options.path.unwrap_or_else(|| DEFAULT_PATH.to_string()),
            url: options.url.unwrap_or_else(|| DEFAULT_URL.to_string()),
            default_url: options
                .default_url
                .unwrap_or_else(|| DEFAULT_MISSING_URL.to_string()),
            default_style,
            styles,
            storage: options.storage,
            record_tokens: options.record_tokens,
        })
    }

    /// Build a definition from any serde value, e.g. a section of a settings file.
    pub fn from_value(name: impl Into<String>, value: serde_json::Value) -> ConfigResult<Self> {
        let options: DefinitionOptions = serde_json::from_value(value)?;
        Self::new(name, options)
    }

    pub fn builder(name: impl Into<String>) -> DefinitionBuilder {
        DefinitionBuilder {
            name: name.into(),
            options: DefinitionOptions::default(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path_template(&self) -> &str {
        &self.path
    }

    pub fn url_template(&self) -> &str {
        &self.url
    }

    pub fn default_url_template(&self) -> &str {
        &self.default_url
    }

    pub fn default_style(&self) -> &str {
        &self.default_style
    }

    pub fn style(&self, name: &str) -> Option<&StyleSpec> {
        self.styles.get(name)
    }

    pub fn styles(&self) -> impl Iterator<Item = &StyleSpec> {
        self.styles.values()
    }

    pub fn style_names(&self) -> impl Iterator<Item = &str> {
        self.styles.keys().map(String::as_str)
    }

    pub fn storage(&self) -> &StorageConfig {
        &self.storage
    }

    pub fn record_tokens(&self) -> &[String] {
        &self.record_tokens
    }
}

/// Fluent construction of an [`AttachmentDefinition`].
#[derive(Debug, Clone)]
pub struct DefinitionBuilder {
    name: String,
    options: DefinitionOptions,
}

impl DefinitionBuilder {
    pub fn path(mut self, template: impl Into<String>) -> Self {
        self.options.path = Some(template.into());
        self
    }

    pub fn url(mut self, template: impl Into<String>) -> Self {
        self.options.url = Some(template.into());
        self
    }

    pub fn default_url(mut self, template: impl Into<String>) -> Self {
        self.options.default_url = Some(template.into());
        self
    }

    pub fn default_style(mut self, style: impl Into<String>) -> Self {
        self.options.default_style = Some(style.into());
        self
    }

    pub fn whiny(mut self, whiny: bool) -> Self {
        self.options.whiny = Some(whiny);
        self
    }

    pub fn default_processors<I, S>(mut self, processors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options.default_processors = Some(processors.into_iter().map(Into::into).collect());
        self
    }

    pub fn all_styles(mut self, options: StyleOptions) -> Self {
        self.options.all_styles = options;
        self
    }

    pub fn style(mut self, name: impl Into<String>, entry: impl Into<StyleEntry>) -> Self {
        self.options.styles.insert(name.into(), entry.into());
        self
    }

    pub fn storage(mut self, storage: StorageConfig) -> Self {
        self.options.storage = storage;
        self
    }

    pub fn record_token(mut self, token: impl Into<String>) -> Self {
        self.options.record_tokens.push(token.into());
        self
    }

    pub fn build(self) -> ConfigResult<AttachmentDefinition> {
        AttachmentDefinition::new(self.name, self.options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults() {
        let definition = AttachmentDefinition::builder("avatar").build().unwrap();
        assert_eq!(definition.name(), "avatar");
        assert_eq!(
            definition.path_template(),
            "system/:class/:attachment/:id_partition/:style/:filename"
        );
        assert_eq!(
            definition.url_template(),
            "/system/:class/:attachment/:id_partition/:style/:filename"
        );
        assert_eq!(
            definition.default_url_template(),
            "/system/:class/:attachment/default/:style.png"
        );
        assert_eq!(definition.default_style(), "original");
        assert_eq!(definition.style_names().collect::<Vec<_>>(), vec!["original"]);
        assert_eq!(definition.storage().backend, "filesystem");

        let original = definition.style("original").unwrap();
        assert!(original.is_identity());
        assert!(original.strict);
    }

    #[test]
    fn test_layered_style_resolution() {
        let definition = AttachmentDefinition::builder("avatar")
            .whiny(false)
            .all_styles(StyleOptions::default().with_format("png"))
            .style("small", "16x16")
            .style(
                "square",
                StyleOptions::geometry("50x50#")
                    .with_strict(true)
                    .with_format("jpg"),
            )
            .build()
            .unwrap();

        let small = definition.style("small").unwrap();
        assert_eq!(small.geometry.as_deref(), Some("16x16"));
        assert_eq!(small.processors, vec!["thumbnail"]);
        assert_eq!(small.format.as_deref(), Some("png"));
        assert!(!small.strict);

        let square = definition.style("square").unwrap();
        assert_eq!(square.format.as_deref(), Some("jpg"));
        assert!(square.strict);

        let original = definition.style("original").unwrap();
        assert!(original.processors.is_empty());
        assert_eq!(original.format.as_deref(), Some("png"));
        assert!(!original.strict);
    }

    #[test]
    fn test_explicit_original_is_kept() {
        let definition = AttachmentDefinition::builder("avatar")
            .style(
                "original",
                StyleOptions::geometry("1024x1024>").with_processors(["thumbnail"]),
            )
            .build()
            .unwrap();
        let original = definition.style("original").unwrap();
        assert_eq!(original.processors, vec!["thumbnail"]);
        assert_eq!(original.geometry.as_deref(), Some("1024x1024>"));
    }

    #[test]
    fn test_custom_default_processors() {
        let definition = AttachmentDefinition::builder("avatar")
            .default_processors(["identity"])
            .style("copy", StyleOptions::default())
            .build()
            .unwrap();
        assert_eq!(definition.style("copy").unwrap().processors, vec!["identity"]);
    }

    #[test]
    fn test_unknown_default_style_is_rejected() {
        let result = AttachmentDefinition::builder("avatar")
            .default_style("square")
            .build();
        assert!(matches!(result, Err(ConfigError::UnknownStyle { name }) if name == "square"));

        let definition = AttachmentDefinition::builder("avatar")
            .default_style("square")
            .style("square", "10x10#")
            .build()
            .unwrap();
        assert_eq!(definition.default_style(), "square");
    }

    #[test]
    fn test_invalid_geometry_is_rejected_at_build() {
        let result = AttachmentDefinition::builder("avatar")
            .style("broken", "big")
            .build();
        assert!(matches!(result, Err(ConfigError::InvalidGeometry { .. })));
    }

    #[test]
    fn test_incomplete_crop_geometry_is_rejected_at_build() {
        let result = AttachmentDefinition::builder("avatar")
            .style("square", "50x#")
            .build();
        assert!(matches!(
            result,
            Err(ConfigError::IncompleteCropGeometry { .. })
        ));

        let result = AttachmentDefinition::builder("avatar")
            .style("square", "x50#")
            .build();
        assert!(matches!(
            result,
            Err(ConfigError::IncompleteCropGeometry { .. })
        ));

        assert!(AttachmentDefinition::builder("avatar")
            .style("wide", "50x")
            .build()
            .is_ok());
    }

    #[test]
    fn test_from_value() {
        let definition = AttachmentDefinition::from_value(
            "photo",
            json!({
                "path": ":class/:id/:style/:filename",
                "styles": {"thumb": "100x100#", "medium": {"geometry": "300x300>"}},
                "storage": {"backend": "objectstore", "bucket": "photos"},
                "record_tokens": ["name"]
            }),
        )
        .unwrap();
        assert_eq!(
            definition.style_names().collect::<Vec<_>>(),
            vec!["medium", "original", "thumb"]
        );
        assert_eq!(definition.storage().bucket.as_deref(), Some("photos"));
        assert_eq!(definition.record_tokens(), ["name".to_string()]);
    }

    #[test]
    fn test_from_value_rejects_unknown_keys() {
        let result = AttachmentDefinition::from_value("photo", json!({"paht": "typo"}));
        assert!(matches!(result, Err(ConfigError::InvalidOptions(_))));
    }
}
