//! Style configuration
//!
//! Styles are configured in layers: definition-wide defaults, the options shared
//! by every style (`all_styles`), then the style's own options. The layers are
//! merged once, when the definition is built, into a fully resolved [`StyleSpec`].

use serde::{Deserialize, Serialize};

use crate::error::ConfigResult;
use crate::geometry::Geometry;

/// One layer of style options. Unset fields fall through to the layer below.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StyleOptions {
    pub geometry: Option<String>,
    pub format: Option<String>,
    pub processors: Option<Vec<String>>,
    /// Arguments placed before the resize clause of the conversion command.
    pub source_options: Option<String>,
    /// Arguments placed after the resize and crop clauses.
    pub destination_options: Option<String>,
    pub strict: Option<bool>,
}

impl StyleOptions {
    pub fn geometry(geometry: impl Into<String>) -> Self {
        Self {
            geometry: Some(geometry.into()),
            ..Self::default()
        }
    }

    pub fn with_processors<I, S>(mut self, processors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.processors = Some(processors.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = Some(strict);
        self
    }

    pub fn with_source_options(mut self, options: impl Into<String>) -> Self {
        self.source_options = Some(options.into());
        self
    }

    pub fn with_destination_options(mut self, options: impl Into<String>) -> Self {
        self.destination_options = Some(options.into());
        self
    }

    /// Return a copy of `self` with every field set in `upper` taking precedence.
    pub fn overlay(&self, upper: &StyleOptions) -> StyleOptions {
        StyleOptions {
            geometry: upper.geometry.clone().or_else(|| self.geometry.clone()),
            format: upper.format.clone().or_else(|| self.format.clone()),
            processors: upper.processors.clone().or_else(|| self.processors.clone()),
            source_options: upper
                .source_options
                .clone()
                .or_else(|| self.source_options.clone()),
            destination_options: upper
                .destination_options
                .clone()
                .or_else(|| self.destination_options.clone()),
            strict: upper.strict.or(self.strict),
        }
    }
}

/// A style as written in configuration: a bare geometry string or full options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StyleEntry {
    Geometry(String),
    Options(StyleOptions),
}

impl StyleEntry {
    pub fn into_options(self) -> StyleOptions {
        match self {
            StyleEntry::Geometry(geometry) => StyleOptions::geometry(geometry),
            StyleEntry::Options(options) => options,
        }
    }
}

impl From<StyleOptions> for StyleEntry {
    fn from(options: StyleOptions) -> Self {
        StyleEntry::Options(options)
    }
}

impl From<&str> for StyleEntry {
    fn from(geometry: &str) -> Self {
        StyleEntry::Geometry(geometry.to_string())
    }
}

/// A fully resolved style.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StyleSpec {
    pub name: String,
    pub geometry: Option<String>,
    pub format: Option<String>,
    pub processors: Vec<String>,
    pub source_options: Option<String>,
    pub destination_options: Option<String>,
    /// When false a processing failure falls back to the unprocessed input.
    pub strict: bool,
}

impl StyleSpec {
    /// Collapse merged options into a spec, filling what is still unset from the
    /// definition-wide defaults.
    pub fn resolve(
        name: impl Into<String>,
        merged: StyleOptions,
        default_strict: bool,
        default_processors: &[String],
    ) -> Self {
        Self {
            name: name.into(),
            geometry: merged.geometry,
            format: merged.format,
            processors: merged
                .processors
                .unwrap_or_else(|| default_processors.to_vec()),
            source_options: merged.source_options,
            destination_options: merged.destination_options,
            strict: merged.strict.unwrap_or(default_strict),
        }
    }

    pub fn parsed_geometry(&self) -> ConfigResult<Option<Geometry>> {
        self.geometry.as_deref().map(Geometry::parse).transpose()
    }

    pub fn is_identity(&self) -> bool {
        self.processors.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_overlay_prefers_upper_layer() {
        let lower = StyleOptions::geometry("10x10")
            .with_format("png")
            .with_strict(false);
        let upper = StyleOptions::geometry("20x20").with_processors(["identity"]);

        let merged = lower.overlay(&upper);
        assert_eq!(merged.geometry.as_deref(), Some("20x20"));
        assert_eq!(merged.format.as_deref(), Some("png"));
        assert_eq!(merged.strict, Some(false));
        assert_eq!(merged.processors, Some(vec!["identity".to_string()]));
    }

    #[test]
    fn test_resolve_fills_defaults() {
        let spec = StyleSpec::resolve(
            "small",
            StyleOptions::geometry("16x16"),
            true,
            &["thumbnail".to_string()],
        );
        assert_eq!(spec.processors, vec!["thumbnail"]);
        assert!(spec.strict);
        assert!(!spec.is_identity());
        assert_eq!(
            spec.parsed_geometry().unwrap().unwrap().to_string(),
            "16x16"
        );
    }

    #[test]
    fn test_style_entry_accepts_bare_geometry() {
        let entry: StyleEntry = serde_json::from_value(json!("100x100#")).unwrap();
        assert_eq!(entry.into_options().geometry.as_deref(), Some("100x100#"));

        let entry: StyleEntry =
            serde_json::from_value(json!({"geometry": "5x5", "strict": false})).unwrap();
        let options = entry.into_options();
        assert_eq!(options.strict, Some(false));
    }

    #[test]
    fn test_style_options_reject_unknown_keys() {
        let result: Result<StyleEntry, _> =
            serde_json::from_value(json!({"geometry": "5x5", "quality": 90}));
        assert!(result.is_err());
    }
}
