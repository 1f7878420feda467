use std::collections::BTreeMap;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Storage backend types
///
/// The two backend shapes affix ships with. Backends are still looked up by name
/// through the storage registry; this enum is what a constructed backend reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Filesystem,
    ObjectStore,
}

impl StorageBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageBackend::Filesystem => "filesystem",
            StorageBackend::ObjectStore => "objectstore",
        }
    }
}

impl FromStr for StorageBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "filesystem" => Ok(StorageBackend::Filesystem),
            "objectstore" => Ok(StorageBackend::ObjectStore),
            _ => Err(ConfigError::UnknownStorageBackend {
                name: s.to_string(),
            }),
        }
    }
}

impl Display for StorageBackend {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

/// Object-store credentials, given inline or read from a YAML file.
///
/// The file is either a flat mapping of the inline fields or a mapping from
/// environment name to such a mapping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Credentials {
    Inline {
        access_key_id: String,
        secret_access_key: String,
        #[serde(default)]
        session_token: Option<String>,
    },
    File {
        file: PathBuf,
    },
}

/// Storage configuration of one attachment definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Registry key of the backend: `filesystem` or `objectstore`.
    #[serde(default = "default_backend")]
    pub backend: String,
    /// Filesystem: directory that relative paths are resolved against.
    #[serde(default)]
    pub root: Option<PathBuf>,
    #[serde(default)]
    pub bucket: Option<String>,
    #[serde(default)]
    pub credentials: Option<Credentials>,
    /// Canned ACL applied to written objects, e.g. `public-read`.
    #[serde(default)]
    pub permissions: Option<String>,
    /// Static headers attached to every written object.
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    #[serde(default)]
    pub protocol: Option<String>,
    #[serde(default)]
    pub host_alias: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
    /// Custom endpoint for S3-compatible providers.
    #[serde(default)]
    pub endpoint: Option<String>,
}

fn default_backend() -> String {
    StorageBackend::Filesystem.as_str().to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            root: None,
            bucket: None,
            credentials: None,
            permissions: None,
            headers: BTreeMap::new(),
            protocol: None,
            host_alias: None,
            region: None,
            endpoint: None,
        }
    }
}

impl StorageConfig {
    pub fn filesystem() -> Self {
        Self::default()
    }

    pub fn object_store(bucket: impl Into<String>) -> Self {
        Self {
            backend: StorageBackend::ObjectStore.as_str().to_string(),
            bucket: Some(bucket.into()),
            ..Self::default()
        }
    }

    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = Some(root.into());
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }
}
