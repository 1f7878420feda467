//! Configuration module
//!
//! Process-wide settings read from the environment: the environment name used by
//! interpolation and credential lookup, how external commands are located and
//! whether their stderr is kept, and where the filesystem backend is rooted.

use std::env;
use std::path::PathBuf;

use crate::constants::{CONVERT_COMMAND, DEFAULT_ENVIRONMENT, IDENTIFY_COMMAND};
use crate::error::{ConfigError, ConfigResult};

#[derive(Clone, Debug)]
pub struct RuntimeConfig {
    pub environment: String,
    pub command_path: Option<PathBuf>,
    pub swallow_stderr: bool,
    pub storage_root: PathBuf,
    pub convert_command: String,
    pub identify_command: String,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            environment: DEFAULT_ENVIRONMENT.to_string(),
            command_path: None,
            swallow_stderr: true,
            storage_root: PathBuf::from("."),
            convert_command: CONVERT_COMMAND.to_string(),
            identify_command: IDENTIFY_COMMAND.to_string(),
        }
    }
}

impl RuntimeConfig {
    pub fn from_env() -> ConfigResult<Self> {
        let defaults = Self::default();

        let swallow_stderr = match env::var("AFFIX_SWALLOW_STDERR") {
            Ok(value) => parse_bool("AFFIX_SWALLOW_STDERR", &value)?,
            Err(_) => defaults.swallow_stderr,
        };

        Ok(Self {
            environment: env::var("AFFIX_ENV").unwrap_or(defaults.environment),
            command_path: env::var("AFFIX_COMMAND_PATH")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .map(PathBuf::from),
            swallow_stderr,
            storage_root: env::var("AFFIX_STORAGE_ROOT")
                .map(PathBuf::from)
                .unwrap_or(defaults.storage_root),
            convert_command: env::var("AFFIX_CONVERT_COMMAND")
                .unwrap_or(defaults.convert_command),
            identify_command: env::var("AFFIX_IDENTIFY_COMMAND")
                .unwrap_or(defaults.identify_command),
        })
    }

    pub fn is_production(&self) -> bool {
        let env = self.environment.to_lowercase();
        env == "production" || env == "prod"
    }

    pub fn with_environment(mut self, environment: impl Into<String>) -> Self {
        self.environment = environment.into();
        self
    }

    pub fn with_storage_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.storage_root = root.into();
        self
    }
}

fn parse_bool(key: &str, value: &str) -> ConfigResult<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidEnv {
            key: key.to_string(),
            value: value.to_string(),
        }),
    }
}
