//! # Configuration Module
//!
//! Handles loading and validating configuration from TOML files.

use serde::de::Error;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{FlightLogError, Result};

/// Log levels accepted in `[logging] level`
const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Main configuration structure
#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Input and artifact locations
#[derive(Debug, Deserialize, Clone)]
pub struct DataConfig {
    #[serde(default = "default_log_path")]
    pub log_path: PathBuf,

    #[serde(default = "default_artifact_path")]
    pub artifact_path: PathBuf,
}

/// HTTP server configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_public_dir")]
    pub public_dir: PathBuf,
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Directory for daily-rolling log files; empty disables file logging
    #[serde(default)]
    pub log_dir: String,
}

// Default value functions
fn default_log_path() -> PathBuf { PathBuf::from("flight.log") }
fn default_artifact_path() -> PathBuf { PathBuf::from("cleaned_data.json") }

fn default_host() -> String { "127.0.0.1".to_string() }
fn default_port() -> u16 { 9999 }
fn default_public_dir() -> PathBuf { PathBuf::from("public") }

fn default_log_level() -> String { "info".to_string() }

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            log_path: default_log_path(),
            artifact_path: default_artifact_path(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            public_dir: default_public_dir(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            log_dir: String::new(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the configuration file
    ///
    /// # Returns
    ///
    /// * `Result<Config>` - Loaded and validated configuration
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - File cannot be read
    /// - TOML parsing fails
    /// - Validation fails
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use flightlog_viewer::config::Config;
    ///
    /// let config = Config::load("config/viewer.toml")?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| FlightLogError::from_open(path, e))?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns error if any configuration value is out of valid range
    pub fn validate(&self) -> Result<()> {
        if self.data.artifact_path.as_os_str().is_empty() {
            return Err(FlightLogError::Config(
                toml::de::Error::custom("artifact_path cannot be empty")
            ));
        }

        if self.server.host.is_empty() {
            return Err(FlightLogError::Config(
                toml::de::Error::custom("server host cannot be empty")
            ));
        }

        if self.server.port == 0 {
            return Err(FlightLogError::Config(
                toml::de::Error::custom("port must be between 1 and 65535")
            ));
        }

        if self.server.public_dir.as_os_str().is_empty() {
            return Err(FlightLogError::Config(
                toml::de::Error::custom("public_dir cannot be empty")
            ));
        }

        if !LOG_LEVELS.contains(&self.logging.level.as_str()) {
            return Err(FlightLogError::Config(
                toml::de::Error::custom(format!(
                    "log level must be one of: {}",
                    LOG_LEVELS.join(", ")
                ))
            ));
        }

        Ok(())
    }

    /// `host:port` for the HTTP listener
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
