//! Configuration loader and validator for the CMS setup tool.
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::model::ADMIN_CHANNEL_CODE;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parse error: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Root configuration struct mirroring the YAML schema.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Config {
    pub app: App,
    #[serde(default)]
    pub channels: Vec<ChannelConfig>,
}

/// App-level settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct App {
    pub data_dir: String,
    /// Default base directory for `content_file` references.
    #[serde(default)]
    pub content_dir: Option<String>,
}

/// A channel to provision before loading content.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChannelConfig {
    pub code: String,
    pub name: String,
}

impl App {
    /// `data_dir` with a leading `~/` expanded.
    pub fn resolved_data_dir(&self) -> String {
        expand_home(&self.data_dir)
    }

    pub fn resolved_content_dir(&self) -> Option<PathBuf> {
        self.content_dir
            .as_deref()
            .filter(|d| !d.trim().is_empty())
            .map(|d| PathBuf::from(expand_home(d)))
    }
}

impl Config {
    /// Ensure required directories exist (creates `app.data_dir` if missing).
    pub fn ensure_dirs(&self) -> Result<(), std::io::Error> {
        fs::create_dir_all(self.app.resolved_data_dir())
    }

    /// Default database location inside the data directory.
    pub fn database_url(&self) -> String {
        format!("sqlite://{}/cms.db", self.app.resolved_data_dir())
    }
}

fn expand_home(path: &str) -> String {
    match (path.strip_prefix("~/"), std::env::var("HOME")) {
        (Some(rest), Ok(home)) => format!("{}/{}", home.trim_end_matches('/'), rest),
        _ => path.to_string(),
    }
}

/// Load configuration from a YAML file and validate it.
/// - If `path` is None, uses `config.yaml` in the current working directory.
pub fn load(path: Option<&Path>) -> Result<Config, ConfigError> {
    let path = path.unwrap_or_else(|| Path::new("config.yaml"));
    let content = fs::read_to_string(path)?;
    let cfg: Config = serde_yaml::from_str(&content)?;
    validate(&cfg)?;
    Ok(cfg)
}

/// Validate a configuration instance.
fn validate(cfg: &Config) -> Result<(), ConfigError> {
    if cfg.app.data_dir.trim().is_empty() {
        return Err(ConfigError::Invalid("app.data_dir must be non-empty".into()));
    }

    let mut seen = HashSet::new();
    for (i, channel) in cfg.channels.iter().enumerate() {
        let code = channel.code.trim();
        if code.is_empty() {
            return Err(ConfigError::Invalid(format!(
                "channels[{}].code must be non-empty",
                i
            )));
        }
        if code == ADMIN_CHANNEL_CODE {
            return Err(ConfigError::Invalid(format!(
                "channels[{}].code '{}' is reserved",
                i, code
            )));
        }
        if code.parse::<i64>().is_ok() {
            return Err(ConfigError::Invalid(format!(
                "channels[{}].code '{}' must not be numeric",
                i, code
            )));
        }
        if channel.name.trim().is_empty() {
            return Err(ConfigError::Invalid(format!(
                "channels[{}].name must be non-empty",
                i
            )));
        }
        if !seen.insert(code) {
            return Err(ConfigError::Invalid(format!(
                "channels[{}].code '{}' is duplicated",
                i, code
            )));
        }
    }

    Ok(())
}

/// Example configuration, also used by tests.
pub fn example() -> &'static str {
    r#"app:
  data_dir: "./data"
  content_dir: "./cms"

channels:
  - code: "default"
    name: "Default Store View"
  - code: "fr"
    name: "French Store View"
"#
}
