//! Configuration management for Taskline
//!
//! This module handles loading, parsing, and validation of configuration files.

use crate::constants::{
    APP_NAME, CONFIG_FILE_NAME, CONFIG_GENERATED, DEFAULT_API_BASE_URL, DEFAULT_API_TIMEOUT_SECONDS,
    DEFAULT_API_TOKEN_ENV, DEFAULT_DATABASE_FILE, DEFAULT_PROBE_ADDRESS, DEFAULT_PROBE_INTERVAL_SECONDS,
    MAX_API_TIMEOUT_SECONDS, MAX_PROBE_INTERVAL_SECONDS,
};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub api: ApiConfig,
    pub storage: StorageConfig,
    pub sync: SyncConfig,
    pub logging: LoggingConfig,
}

/// Remote API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Backend implementation to use
    pub backend_type: String,
    /// Base URL of the task service REST API
    pub base_url: String,
    /// Environment variable holding the bearer token
    pub api_token_env: String,
    /// Request timeout applied by the HTTP client
    pub timeout_seconds: u64,
}

/// Local cache storage configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct StorageConfig {
    /// SQLite database file; defaults to the platform data directory
    pub database_path: Option<PathBuf>,
    /// Keep the cache in memory only (nothing survives a restart)
    pub in_memory: bool,
}

/// Offline sync configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Drain the action queue automatically when connectivity returns
    pub sync_on_reconnect: bool,
    /// Re-fetch the task snapshot after a drain replayed something
    pub refresh_after_drain: bool,
    /// Address probed to detect connectivity
    pub probe_address: String,
    /// Probe interval in seconds (0 = disabled, connectivity comes from elsewhere)
    pub probe_interval_seconds: u64,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Write logs to a file in the data directory
    pub enabled: bool,
    /// Minimum level: error, warn, info, debug or trace
    pub level: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            backend_type: "http".to_string(),
            base_url: DEFAULT_API_BASE_URL.to_string(),
            api_token_env: DEFAULT_API_TOKEN_ENV.to_string(),
            timeout_seconds: DEFAULT_API_TIMEOUT_SECONDS,
        }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            sync_on_reconnect: true,
            refresh_after_drain: true,
            probe_address: DEFAULT_PROBE_ADDRESS.to_string(),
            probe_interval_seconds: DEFAULT_PROBE_INTERVAL_SECONDS,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            level: "info".to_string(),
        }
    }
}

impl LoggingConfig {
    /// Parse the configured level into a `log` filter
    pub fn level_filter(&self) -> Result<log::LevelFilter> {
        self.level
            .parse::<log::LevelFilter>()
            .map_err(|_| anyhow::anyhow!("Invalid logging level '{}'", self.level))
    }
}

impl StorageConfig {
    /// Resolve the database file path, falling back to the data directory
    pub fn resolve_database_path(&self) -> Result<PathBuf> {
        match &self.database_path {
            Some(path) => Ok(path.clone()),
            None => Ok(Config::get_data_dir()?.join(DEFAULT_DATABASE_FILE)),
        }
    }
}

impl Config {
    /// Load configuration from file or return defaults
    pub fn load() -> Result<Self> {
        let config_path = Self::find_config_file()?;

        if let Some(path) = config_path {
            Self::load_from_file(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;

        config.validate()?;
        Ok(config)
    }

    /// Find configuration file in order of precedence
    fn find_config_file() -> Result<Option<PathBuf>> {
        // 1. Check current directory
        let current_dir_config = PathBuf::from(CONFIG_FILE_NAME);
        if current_dir_config.exists() {
            return Ok(Some(current_dir_config));
        }

        // 2. Check XDG config directory
        if let Some(config_dir) = dirs::config_dir() {
            let xdg_config = config_dir.join(APP_NAME).join("config.toml");
            if xdg_config.exists() {
                return Ok(Some(xdg_config));
            }
        }

        Ok(None)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.api.backend_type.is_empty() {
            anyhow::bail!("api.backend_type cannot be empty");
        }

        if !self.api.base_url.starts_with("http://") && !self.api.base_url.starts_with("https://") {
            anyhow::bail!("api.base_url must start with http:// or https://, got '{}'", self.api.base_url);
        }

        if self.api.api_token_env.is_empty() {
            anyhow::bail!("api.api_token_env cannot be empty");
        }

        if self.api.timeout_seconds == 0 || self.api.timeout_seconds > MAX_API_TIMEOUT_SECONDS {
            anyhow::bail!(
                "api.timeout_seconds must be between 1 and {}, got {}",
                MAX_API_TIMEOUT_SECONDS,
                self.api.timeout_seconds
            );
        }

        if self.sync.probe_interval_seconds > MAX_PROBE_INTERVAL_SECONDS {
            anyhow::bail!(
                "sync.probe_interval_seconds cannot exceed {} (1 hour)",
                MAX_PROBE_INTERVAL_SECONDS
            );
        }

        if self.sync.probe_interval_seconds > 0 {
            self.sync
                .probe_address
                .parse::<SocketAddr>()
                .with_context(|| format!("Invalid sync.probe_address '{}'", self.sync.probe_address))?;
        }

        self.logging.level_filter()?;

        Ok(())
    }

    /// Generate default configuration file
    pub fn generate_default_config<P: AsRef<Path>>(path: P) -> Result<()> {
        let config = Self::default();
        let toml_content = toml::to_string_pretty(&config).context("Failed to serialize default config")?;

        let header = format!(
            "# Taskline Configuration File\n# Generated on {}\n\n",
            chrono::Local::now().format("%Y-%m-%d")
        );

        let full_content = header + &toml_content;

        // Ensure the parent directory exists
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {}", parent.display()))?;
        }

        std::fs::write(&path, full_content)
            .with_context(|| format!("Failed to write config file: {}", path.as_ref().display()))?;

        println!("{}: {}", CONFIG_GENERATED, path.as_ref().display());
        Ok(())
    }

    /// Get the XDG config directory path
    pub fn get_xdg_config_dir() -> Result<PathBuf> {
        dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))
            .map(|dir| dir.join(APP_NAME))
    }

    /// Get the default config file path
    pub fn get_default_config_path() -> Result<PathBuf> {
        Ok(Self::get_xdg_config_dir()?.join("config.toml"))
    }

    /// Get the data directory used for the cache database and log file
    pub fn get_data_dir() -> Result<PathBuf> {
        dirs::data_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine data directory"))
            .map(|dir| dir.join(APP_NAME))
    }
}
