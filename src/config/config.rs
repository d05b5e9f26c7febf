//! TOML configuration parsing and management.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::backend::BackendSpec;

/// Default location of the configuration file
pub const DEFAULT_CONFIG_PATH: &str = "config/docproxy.toml";

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProxyConfig {
    /// Proxy identification
    #[serde(default)]
    pub proxy: ProxySection,
    /// Logging preferences
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Backends registered at startup
    #[serde(default)]
    pub backends: Vec<BackendEntry>,
}

/// Proxy identification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxySection {
    /// Name used in log output
    pub name: String,
}

impl Default for ProxySection {
    fn default() -> Self {
        Self {
            name: "docproxy".to_string(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Filter directive for the host's tracing subscriber
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// A named backend description
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendEntry {
    /// Registry name
    pub name: String,
    /// How to construct the backend
    #[serde(flatten)]
    pub spec: BackendSpec,
}

/// Loads and manages TOML configuration.
#[derive(Debug)]
pub struct ConfigurationLoader {
    /// Path the configuration was (or would have been) read from
    pub config_path: PathBuf,
    /// Loaded configuration
    pub config: ProxyConfig,
}

impl ConfigurationLoader {
    /// Initialize configuration loader.
    ///
    /// # Arguments
    /// * `config_path` - Path to TOML config file. If None, uses `config/docproxy.toml`.
    ///
    /// A missing file yields the default configuration.
    pub fn new(config_path: Option<&Path>) -> Result<Self> {
        let config_path = config_path
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));

        let config = if config_path.exists() {
            Self::load_config(&config_path)?
        } else {
            ProxyConfig::default()
        };

        Ok(Self {
            config_path,
            config,
        })
    }

    /// Parse configuration from TOML text.
    pub fn from_toml(content: &str) -> Result<ProxyConfig> {
        toml::from_str(content).context("Failed to parse TOML config")
    }

    fn load_config(path: &Path) -> Result<ProxyConfig> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse TOML config: {}", path.display()))
    }

    /// Get configuration value by dot-notation key.
    pub fn get_string(&self, key: &str) -> Option<String> {
        match key {
            "proxy.name" => Some(self.config.proxy.name.clone()),
            "logging.level" => Some(self.config.logging.level.clone()),
            _ => None,
        }
    }

    /// Names of the configured backends, in file order
    pub fn backend_names(&self) -> Vec<&str> {
        self.config
            .backends
            .iter()
            .map(|entry| entry.name.as_str())
            .collect()
    }
}
