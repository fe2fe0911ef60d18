//! Configuration loading and validation

use crate::error::{ErrorContext, RosterError, RosterResult};
use crate::logging::LoggingConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Top-level service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RosterConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
}

/// HTTP server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// Enable development mode
    pub dev_mode: bool,
}

/// Persistent storage settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Database URL (SQLite)
    pub url: String,
    /// Maximum attempts for a compare-and-swap permission update
    pub cas_max_retries: u32,
}

impl Default for RosterConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
                dev_mode: false,
            },
            database: DatabaseConfig {
                url: "sqlite::memory:".to_string(),
                cas_max_retries: 8,
            },
            logging: LoggingConfig::default(),
        }
    }
}

impl RosterConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> RosterResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| RosterError::Config {
            message: format!("Failed to read config file: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("config")
                .with_operation("read_file")
                .with_suggestion("Check if the config file exists and is readable"),
        })?;

        let config: RosterConfig = toml::from_str(&content).map_err(|e| RosterError::Config {
            message: format!("Failed to parse config: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("config")
                .with_operation("parse_toml")
                .with_suggestion("Check TOML syntax in config file"),
        })?;

        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> RosterResult<()> {
        let content = toml::to_string_pretty(self).map_err(|e| RosterError::Config {
            message: format!("Failed to serialize config: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("config").with_operation("serialize_toml"),
        })?;

        std::fs::write(path, content).map_err(|e| RosterError::Config {
            message: format!("Failed to write config file: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("config")
                .with_operation("write_file")
                .with_suggestion("Check if the directory exists and is writable"),
        })?;

        Ok(())
    }

    /// Apply environment variable overrides
    pub fn apply_env(&mut self) {
        if let Ok(host) = std::env::var("ROSTER_HOST") {
            self.server.host = host;
        }
        if let Ok(port) = std::env::var("ROSTER_PORT") {
            if let Ok(port) = port.parse() {
                self.server.port = port;
            }
        }
        if let Ok(dev) = std::env::var("ROSTER_DEV_MODE") {
            if let Ok(dev) = dev.parse() {
                self.server.dev_mode = dev;
            }
        }
        if let Ok(url) = std::env::var("DATABASE_URL") {
            self.database.url = url;
        }
        if let Ok(level) = std::env::var("ROSTER_LOG_LEVEL") {
            self.logging.level = level;
        }
    }

    /// Load configuration from environment variables on top of defaults
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env();
        config
    }

    /// Switch to development-friendly logging when dev mode is enabled
    ///
    /// Leaves the log level alone so an explicit level override still wins.
    pub fn apply_dev_mode(&mut self) {
        if self.server.dev_mode {
            self.logging.format = crate::logging::LogFormat::Pretty;
            self.logging.include_location = true;
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> RosterResult<()> {
        if self.server.host.trim().is_empty() {
            return Err(RosterError::Config {
                message: "Server host must not be empty".to_string(),
                source: None,
                context: ErrorContext::new("config")
                    .with_operation("validate")
                    .with_suggestion("Set server.host to a bindable address"),
            });
        }

        if self.database.url.trim().is_empty() {
            return Err(RosterError::Config {
                message: "Database URL must not be empty".to_string(),
                source: None,
                context: ErrorContext::new("config")
                    .with_operation("validate")
                    .with_suggestion("Set database.url, e.g. sqlite:roster.db"),
            });
        }

        if self.database.cas_max_retries == 0 {
            return Err(RosterError::Config {
                message: "database.cas_max_retries must be greater than 0".to_string(),
                source: None,
                context: ErrorContext::new("config")
                    .with_operation("validate")
                    .with_suggestion("Set database.cas_max_retries to a positive value"),
            });
        }

        Ok(())
    }

    /// Get the server bind address
    pub fn address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = RosterConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.address(), "127.0.0.1:8080");
    }

    #[test]
    fn config_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("roster.toml");

        let mut config = RosterConfig::default();
        config.server.port = 9090;
        config.database.url = "sqlite:users.db".to_string();
        config.save_to_file(&path).unwrap();

        let loaded = RosterConfig::from_file(&path).unwrap();
        assert_eq!(loaded.server.port, 9090);
        assert_eq!(loaded.database.url, "sqlite:users.db");
    }

    #[test]
    fn dev_mode_switches_to_pretty_logging() {
        use crate::logging::LogFormat;

        let mut config = RosterConfig::default();
        config.apply_dev_mode();
        assert_eq!(config.logging.format, LogFormat::Compact);

        config.server.dev_mode = true;
        config.apply_dev_mode();
        assert_eq!(config.logging.format, LogFormat::Pretty);
        assert!(config.logging.include_location);
    }

    #[test]
    fn zero_cas_retries_is_rejected() {
        let mut config = RosterConfig::default();
        config.database.cas_max_retries = 0;
        assert!(config.validate().is_err());
    }
}
