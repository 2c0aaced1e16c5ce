//! Persisted CLI configuration: API key and base URL in a TOML file.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use billingo_core::Credentials;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::CliError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigKey {
    ApiKey,
    BaseUrl,
}

impl fmt::Display for ConfigKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigKey::ApiKey => f.write_str("api_key"),
            ConfigKey::BaseUrl => f.write_str("base_url"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
struct Settings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    base_url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
    settings: Settings,
}

impl ConfigStore {
    /// `<config dir>/billingo/config.toml`, falling back to the working
    /// directory when the platform has no config dir.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("billingo")
            .join("config.toml")
    }

    /// Load from `path`. A missing file is an empty configuration.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, CliError> {
        let path = path.into();
        let settings = match fs::read_to_string(&path) {
            Ok(text) => toml::from_str(&text).map_err(|e| CliError::Config {
                path: path.clone(),
                message: e.message().to_string(),
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Settings::default(),
            Err(e) => {
                return Err(CliError::Config {
                    path,
                    message: e.to_string(),
                })
            }
        };
        Ok(Self { path, settings })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get(&self, key: ConfigKey) -> Option<&str> {
        match key {
            ConfigKey::ApiKey => self.settings.api_key.as_deref(),
            ConfigKey::BaseUrl => self.settings.base_url.as_deref(),
        }
    }

    /// Update one key and write the file immediately.
    pub fn set(&mut self, key: ConfigKey, value: &str) -> Result<(), CliError> {
        let value = Some(value.trim().to_string()).filter(|v| !v.is_empty());
        match key {
            ConfigKey::ApiKey => self.settings.api_key = value,
            ConfigKey::BaseUrl => self.settings.base_url = value,
        }
        self.save()?;
        info!(key = %key, path = %self.path.display(), "config updated");
        Ok(())
    }

    pub fn is_configured(&self) -> bool {
        self.get(ConfigKey::ApiKey).is_some_and(|k| !k.is_empty())
    }

    /// Stored credentials with optional overrides on top (flags or
    /// environment variables). A blank override counts as unset.
    pub fn credentials(&self, api_key: Option<&str>, base_url: Option<&str>) -> Credentials {
        let mut creds = Credentials::anonymous();
        if let Some(key) = non_blank(api_key).or(self.get(ConfigKey::ApiKey)) {
            creds = creds.with_api_key(key);
        }
        if let Some(url) = non_blank(base_url).or(self.get(ConfigKey::BaseUrl)) {
            creds = creds.with_base_url(url);
        }
        creds
    }

    fn save(&self) -> Result<(), CliError> {
        let config_error = |message: String| CliError::Config {
            path: self.path.clone(),
            message,
        };
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| config_error(e.to_string()))?;
            }
        }
        let text = toml::to_string(&self.settings).map_err(|e| config_error(e.to_string()))?;
        fs::write(&self.path, text).map_err(|e| config_error(e.to_string()))
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}
