//! Configuration loading and management
//!
//! A YAML file provides the base configuration; selected environment
//! variables are applied on top. Every key has a default, so an empty file
//! (or no file at all) yields a runnable local-only service.

use crate::core::error::ConfigError;
use crate::storage::remote::{CountStrategy, RemoteOptions};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Environment variable holding the remote store URL
pub const ENV_REMOTE_URL: &str = "SUPABASE_URL";
/// Environment variable holding the remote store API key
pub const ENV_REMOTE_KEY: &str = "SUPABASE_KEY";
pub const ENV_CSV_PATH: &str = "SALES_CSV_PATH";
pub const ENV_BIND_ADDR: &str = "SALES_BIND_ADDR";
/// Comma-separated CORS allow-list
pub const ENV_ALLOWED_ORIGINS: &str = "SALES_ALLOWED_ORIGINS";

/// Complete process configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub server: ServerConfig,
    pub data: DataConfig,
    pub remote: Option<RemoteConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
    pub allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:8000".to_string(),
            allowed_origins: vec!["http://localhost:3000".to_string()],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    pub csv_path: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            csv_path: PathBuf::from("truestate_assignment_dataset.csv"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    pub url: String,
    pub api_key: String,
    pub table: String,
    pub catalog_function: String,
    pub sample_size: usize,
    pub timeout_secs: u64,
    pub unfiltered_count: CountStrategy,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        let options = RemoteOptions::default();
        Self {
            url: String::new(),
            api_key: String::new(),
            table: options.table,
            catalog_function: options.catalog_function,
            sample_size: options.sample_size,
            timeout_secs: 10,
            unfiltered_count: options.unfiltered_count,
        }
    }
}

impl RemoteConfig {
    /// Both URL and key are present
    pub fn is_configured(&self) -> bool {
        !self.url.trim().is_empty() && !self.api_key.trim().is_empty()
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn options(&self) -> RemoteOptions {
        RemoteOptions {
            table: self.table.clone(),
            catalog_function: self.catalog_function.clone(),
            sample_size: self.sample_size,
            unfiltered_count: self.unfiltered_count,
        }
    }
}

impl ServiceConfig {
    pub fn from_yaml_file(path: &str) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Unreadable {
            path: path.to_string(),
            message: e.to_string(),
        })?;
        Self::from_yaml_str(&content)
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        // An empty document deserializes as null
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(yaml).map_err(|e| ConfigError::Parse {
            message: e.to_string(),
        })
    }

    /// Load the optional file, then overlay the process environment
    pub fn load(path: Option<&str>) -> Result<Self> {
        let config = match path {
            Some(path) => Self::from_yaml_file(path)
                .with_context(|| format!("loading configuration from {}", path))?,
            None => Self::default(),
        };
        let config = config.with_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Apply environment overrides read through `lookup`
    ///
    /// Blank values are ignored.
    pub fn with_env<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(path) = get(ENV_CSV_PATH) {
            self.data.csv_path = PathBuf::from(path);
        }
        if let Some(bind) = get(ENV_BIND_ADDR) {
            self.server.bind = bind;
        }
        if let Some(origins) = get(ENV_ALLOWED_ORIGINS) {
            self.server.allowed_origins = origins
                .split(',')
                .map(str::trim)
                .filter(|o| !o.is_empty())
                .map(str::to_string)
                .collect();
        }

        let url = get(ENV_REMOTE_URL);
        let key = get(ENV_REMOTE_KEY);
        if url.is_some() || key.is_some() {
            let remote = self.remote.get_or_insert_with(RemoteConfig::default);
            if let Some(url) = url {
                remote.url = url;
            }
            if let Some(key) = key {
                remote.api_key = key;
            }
        }
        self
    }

    /// The remote section, only when it is usable
    pub fn active_remote(&self) -> Option<&RemoteConfig> {
        self.remote.as_ref().filter(|r| r.is_configured())
    }

    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.server
            .bind
            .parse()
            .map_err(|e: std::net::AddrParseError| ConfigError::InvalidValue {
                key: "server.bind".to_string(),
                message: e.to_string(),
            })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.bind_addr()?;
        if let Some(remote) = self.active_remote() {
            if remote.sample_size == 0 {
                return Err(ConfigError::InvalidValue {
                    key: "remote.sample_size".to_string(),
                    message: "must be at least 1".to_string(),
                });
            }
            if remote.timeout_secs == 0 {
                return Err(ConfigError::InvalidValue {
                    key: "remote.timeout_secs".to_string(),
                    message: "must be at least 1".to_string(),
                });
            }
        }
        Ok(())
    }
}
