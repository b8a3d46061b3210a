//! Application configuration
//!
//! Loaded from a single TOML file. Every section has defaults, so a missing
//! or empty file yields a working configuration.
//!
//! ```toml
//! [server]
//! host = "0.0.0.0"
//! port = 8080
//!
//! [database]
//! url = "sqlite://./parking.db?mode=rwc"   # or "memory"
//!
//! [reservation]
//! default_hold_minutes = 5
//! max_hold_minutes = 30
//!
//! [sweeper]
//! interval_secs = 30
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::application::parking::SweeperConfig;
use crate::domain::HoldPolicy;
use crate::infrastructure::database::DatabaseConfig;
use crate::shared::retry::RetryConfig;

/// `database.url` value selecting the in-memory store.
pub const MEMORY_DATABASE_URL: &str = "memory";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseSection,
    pub logging: LoggingConfig,
    pub reservation: ReservationConfig,
    pub sweeper: SweeperSection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Seconds to wait for in-flight work after a shutdown signal
    pub shutdown_timeout: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            shutdown_timeout: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSection {
    pub url: String,
    pub max_connections: u32,
}

impl Default for DatabaseSection {
    fn default() -> Self {
        let defaults = DatabaseConfig::default();
        Self {
            url: defaults.url,
            max_connections: defaults.max_connections,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `trace`, `debug`, `info`, `warn` or `error`; `RUST_LOG` wins when set
    pub level: String,
    /// `pretty` or `json`
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReservationConfig {
    pub default_hold_minutes: i64,
    pub min_hold_minutes: i64,
    pub max_hold_minutes: i64,
    pub max_allocation_attempts: u32,
}

impl Default for ReservationConfig {
    fn default() -> Self {
        let policy = HoldPolicy::default();
        Self {
            default_hold_minutes: policy.default_minutes,
            min_hold_minutes: policy.min_minutes,
            max_hold_minutes: policy.max_minutes,
            max_allocation_attempts: policy.max_allocation_attempts,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SweeperSection {
    pub enabled: bool,
    pub interval_secs: u64,
    pub retention_minutes: i64,
}

impl Default for SweeperSection {
    fn default() -> Self {
        let defaults = SweeperConfig::default();
        Self {
            enabled: true,
            interval_secs: defaults.interval_secs,
            retention_minutes: defaults.retention_minutes,
        }
    }
}

impl AppConfig {
    /// Load from `path`. A missing file yields the defaults; a present but
    /// unreadable, malformed or inconsistent file is an error.
    /// `DATABASE_URL` overrides `database.url`.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let mut config = if path.exists() {
            let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
                path: path.to_path_buf(),
                source,
            })?;
            Self::from_toml_str(&raw).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?
        } else {
            Self::default()
        };

        if let Ok(url) = std::env::var("DATABASE_URL") {
            if !url.trim().is_empty() {
                config.database.url = url;
            }
        }

        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(raw)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let r = &self.reservation;
        if r.min_hold_minutes < 1 {
            return Err(ConfigError::Invalid(
                "reservation.min_hold_minutes must be at least 1".into(),
            ));
        }
        if r.min_hold_minutes > r.max_hold_minutes {
            return Err(ConfigError::Invalid(format!(
                "reservation.min_hold_minutes ({}) exceeds max_hold_minutes ({})",
                r.min_hold_minutes, r.max_hold_minutes
            )));
        }
        if !(r.min_hold_minutes..=r.max_hold_minutes).contains(&r.default_hold_minutes) {
            return Err(ConfigError::Invalid(format!(
                "reservation.default_hold_minutes ({}) is outside {}..={}",
                r.default_hold_minutes, r.min_hold_minutes, r.max_hold_minutes
            )));
        }
        if r.max_allocation_attempts == 0 {
            return Err(ConfigError::Invalid(
                "reservation.max_allocation_attempts must be at least 1".into(),
            ));
        }
        if self.sweeper.interval_secs == 0 {
            return Err(ConfigError::Invalid(
                "sweeper.interval_secs must be at least 1".into(),
            ));
        }
        if self.sweeper.retention_minutes < 0 {
            return Err(ConfigError::Invalid(
                "sweeper.retention_minutes must not be negative".into(),
            ));
        }
        if self.database.url.trim().is_empty() {
            return Err(ConfigError::Invalid("database.url must not be empty".into()));
        }
        if self.database.max_connections == 0 {
            return Err(ConfigError::Invalid(
                "database.max_connections must be at least 1".into(),
            ));
        }
        match self.logging.format.to_lowercase().as_str() {
            "pretty" | "json" => Ok(()),
            other => Err(ConfigError::Invalid(format!(
                "logging.format must be 'pretty' or 'json', got '{}'",
                other
            ))),
        }
    }

    pub fn uses_memory_store(&self) -> bool {
        self.database.url.trim().eq_ignore_ascii_case(MEMORY_DATABASE_URL)
    }

    pub fn database_config(&self) -> DatabaseConfig {
        DatabaseConfig {
            url: self.database.url.clone(),
            max_connections: self.database.max_connections,
        }
    }

    pub fn hold_policy(&self) -> HoldPolicy {
        HoldPolicy {
            default_minutes: self.reservation.default_hold_minutes,
            min_minutes: self.reservation.min_hold_minutes,
            max_minutes: self.reservation.max_hold_minutes,
            max_allocation_attempts: self.reservation.max_allocation_attempts,
        }
    }

    pub fn sweeper_config(&self) -> SweeperConfig {
        SweeperConfig {
            interval_secs: self.sweeper.interval_secs,
            retention_minutes: self.sweeper.retention_minutes,
            retry: RetryConfig::default(),
        }
    }

    pub fn listen_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

/// `<config_dir>/mall-parking/config.toml`, falling back to the working
/// directory when the platform has no config directory.
pub fn default_config_path() -> PathBuf {
    dirs_next::config_dir()
        .map(|dir| dir.join("mall-parking"))
        .unwrap_or_else(|| PathBuf::from("."))
        .join("config.toml")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_yields_defaults() {
        let config = AppConfig::from_toml_str("").unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.reservation.default_hold_minutes, 5);
        assert_eq!(config.reservation.max_hold_minutes, 30);
        assert_eq!(config.sweeper.interval_secs, 30);
        assert!(config.sweeper.enabled);
        assert!(config.validate().is_ok());
        assert!(!config.uses_memory_store());
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config = AppConfig::from_toml_str(
            r#"
            [server]
            port = 9090

            [reservation]
            default_hold_minutes = 10

            [database]
            url = "memory"
            "#,
        )
        .unwrap();
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.hold_policy().default_minutes, 10);
        assert_eq!(config.hold_policy().max_minutes, 30);
        assert!(config.uses_memory_store());
    }

    #[test]
    fn inverted_hold_range_is_rejected() {
        let config = AppConfig::from_toml_str(
            "[reservation]\nmin_hold_minutes = 20\nmax_hold_minutes = 10\ndefault_hold_minutes = 15",
        )
        .unwrap();
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn default_hold_outside_range_is_rejected() {
        let config = AppConfig::from_toml_str("[reservation]\ndefault_hold_minutes = 45").unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_sweep_interval_is_rejected() {
        let config = AppConfig::from_toml_str("[sweeper]\ninterval_secs = 0").unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn unknown_log_format_is_rejected() {
        let config = AppConfig::from_toml_str("[logging]\nformat = \"xml\"").unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        assert!(AppConfig::from_toml_str("[server\nport = ").is_err());
    }

    #[test]
    fn default_path_ends_in_app_directory() {
        let path = default_config_path();
        assert!(path.ends_with("mall-parking/config.toml"));
    }
}
