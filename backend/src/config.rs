//! Configuration management for the Marine Research Platform
//!
//! Supports hierarchical configuration loading:
//! 1. Default values in code
//! 2. Configuration files (development.toml, production.toml)
//! 3. Environment variable overrides with MRP__ prefix

use config::{ConfigError, Environment, File};
use serde::Deserialize;
use shared::analytics::{NaturalMortalityMethod, DEFAULT_BIN_SIZE, DEFAULT_TEMPERATURE_C};

/// Main application configuration
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct Config {
    /// Current environment (development, production)
    pub environment: String,

    /// Server configuration
    pub server: ServerConfig,

    /// Dataset storage configuration
    pub storage: StorageConfig,

    /// Defaults applied to analytics requests
    pub analytics: AnalyticsConfig,

    /// Log output configuration
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    /// Server port
    pub port: u16,

    /// Server host
    pub host: String,

    /// Request body limit in megabytes, sized for CSV imports
    pub body_limit_mb: usize,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Memory,
    Postgres,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageBackend,

    /// PostgreSQL connection URL, required by the postgres backend
    pub database_url: Option<String>,

    /// Maximum number of connections in the pool
    pub max_connections: u32,

    /// Minimum number of connections in the pool
    pub min_connections: u32,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct AnalyticsConfig {
    /// Length-class width in cm when a request names none
    pub default_bin_size: f64,

    /// Water temperature in °C for Pauly's equation when a request names none
    pub default_temperature: f64,

    /// Estimator used as the operative natural mortality
    pub natural_mortality_method: NaturalMortalityMethod,

    /// Decimal places floats are rounded to in responses
    pub presentation_decimals: u32,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LoggingConfig {
    pub format: LogFormat,
}

impl Config {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let environment =
            std::env::var("MRP__ENVIRONMENT").unwrap_or_else(|_| "development".into());

        let config = config::Config::builder()
            .set_default("environment", environment.clone())?
            // Load environment-specific config file
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            // Override with environment variables (MRP__ prefix)
            .add_source(
                Environment::with_prefix("MRP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: Config = config.try_deserialize()?;
        config.validate().map_err(ConfigError::Message)?;
        Ok(config)
    }

    /// Reject settings the server cannot run with
    pub fn validate(&self) -> Result<(), String> {
        if self.storage.backend == StorageBackend::Postgres
            && self.storage.database_url.as_deref().map_or(true, str::is_empty)
        {
            return Err("storage.database_url is required for the postgres backend".into());
        }
        if !(self.analytics.default_bin_size.is_finite() && self.analytics.default_bin_size > 0.0) {
            return Err("analytics.default_bin_size must be a positive number".into());
        }
        if !self.analytics.default_temperature.is_finite() {
            return Err("analytics.default_temperature must be a finite number".into());
        }
        if self.analytics.presentation_decimals > 12 {
            return Err("analytics.presentation_decimals must be at most 12".into());
        }
        Ok(())
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            environment: "development".to_string(),
            server: ServerConfig::default(),
            storage: StorageConfig::default(),
            analytics: AnalyticsConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            host: "0.0.0.0".to_string(),
            body_limit_mb: 16,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Memory,
            database_url: None,
            max_connections: 10,
            min_connections: 2,
        }
    }
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            default_bin_size: DEFAULT_BIN_SIZE,
            default_temperature: DEFAULT_TEMPERATURE_C,
            natural_mortality_method: NaturalMortalityMethod::Pauly,
            presentation_decimals: 4,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::Pretty,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.analytics.presentation_decimals, 4);
        assert_eq!(config.analytics.default_temperature, 25.0);
        assert_eq!(config.storage.backend, StorageBackend::Memory);
    }

    #[test]
    fn test_postgres_requires_url() {
        let mut config = Config::default();
        config.storage.backend = StorageBackend::Postgres;
        assert!(config.validate().is_err());

        config.storage.database_url = Some("postgres://localhost/mrp".into());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_file_values_override_defaults() {
        let source = r#"
            [analytics]
            natural_mortality_method = "then"
            presentation_decimals = 2

            [logging]
            format = "json"
        "#;
        let config: Config = config::Config::builder()
            .add_source(File::from_str(source, config::FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(
            config.analytics.natural_mortality_method,
            NaturalMortalityMethod::Then
        );
        assert_eq!(config.analytics.presentation_decimals, 2);
        assert_eq!(config.analytics.default_bin_size, 5.0);
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.server.port, 3000);
    }
}
