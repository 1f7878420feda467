//! Object-store credential resolution
//!
//! Credentials are either given inline or read from a YAML file. The file holds
//! the key pair directly or one key pair per environment name:
//!
//! ```yaml
//! production:
//!   access_key_id: AKIA...
//!   secret_access_key: ...
//! development:
//!   access_key_id: dev
//!   secret_access_key: dev
//! ```

use std::path::Path;

use affix_core::Credentials;
use serde::Deserialize;

use crate::traits::{StorageError, StorageResult};

/// A resolved access key pair.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct KeyPair {
    pub access_key_id: String,
    pub secret_access_key: String,
    #[serde(default)]
    pub session_token: Option<String>,
}

/// Resolve credentials for `environment`, reading the credentials file if needed.
///
/// Runs once when a backend is constructed, so the file is read synchronously.
pub fn resolve_credentials(
    credentials: &Credentials,
    environment: &str,
) -> StorageResult<KeyPair> {
    match credentials {
        Credentials::Inline {
            access_key_id,
            secret_access_key,
            session_token,
        } => Ok(KeyPair {
            access_key_id: access_key_id.clone(),
            secret_access_key: secret_access_key.clone(),
            session_token: session_token.clone(),
        }),
        Credentials::File { file } => {
            let text = std::fs::read_to_string(file).map_err(|e| StorageError::Credentials {
                path: file.clone(),
                reason: e.to_string(),
            })?;
            parse_credentials_file(file, &text, environment)
        }
    }
}

/// Parse a credentials file body, preferring the section named after `environment`.
pub fn parse_credentials_file(
    file: &Path,
    text: &str,
    environment: &str,
) -> StorageResult<KeyPair> {
    let failure = |reason: String| StorageError::Credentials {
        path: file.to_path_buf(),
        reason,
    };

    let document: serde_yaml::Value =
        serde_yaml::from_str(text).map_err(|e| failure(e.to_string()))?;

    let section = match document.get(environment) {
        Some(section) if section.is_mapping() => section.clone(),
        _ => document,
    };

    serde_yaml::from_value(section).map_err(|e| {
        failure(format!(
            "no usable key pair for environment {}: {}",
            environment, e
        ))
    })
}
