//! Configuration management for Perseus components

use config::{Config, ConfigError, Environment, File};
use perseus_core::scan::DbSettings;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main configuration structure for Perseus
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerseusConfig {
    /// Observability configuration
    pub observability: ObservabilityConfig,

    /// Data quality dashboard configuration
    pub dqd: DqdConfig,

    /// CDM builder configuration
    pub cdm: CdmConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Logging configuration
    pub logging: LoggingConfig,

    /// Metrics configuration
    pub metrics: MetricsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (json or pretty)
    pub format: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// Install the Prometheus recorder
    pub enabled: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DqdConfig {
    /// Base URL of the dashboard serving finished runs
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CdmConfig {
    /// Vocabulary database handed to every CDM conversion
    pub vocabulary: DbSettings,
}

impl Default for PerseusConfig {
    fn default() -> Self {
        Self {
            observability: ObservabilityConfig {
                logging: LoggingConfig {
                    level: "info".to_string(),
                    format: "pretty".to_string(),
                },
                metrics: MetricsConfig { enabled: false },
            },
            dqd: DqdConfig {
                url: "http://localhost:8001/dqd".to_string(),
            },
            cdm: CdmConfig {
                vocabulary: DbSettings {
                    db_type: "PostgreSQL".to_string(),
                    server: "localhost".to_string(),
                    port: Some(5432),
                    user: "builder".to_string(),
                    password: String::new(),
                    database: "vocabulary".to_string(),
                    schema: "vocabulary".to_string(),
                },
            },
        }
    }
}

impl PerseusConfig {
    /// Load configuration from file and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_file("perseus.toml")
    }

    /// Load configuration from a specific file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let mut builder = Config::builder()
            .add_source(Config::try_from(&PerseusConfig::default())?);

        if path.as_ref().exists() {
            builder = builder.add_source(File::from(path.as_ref()));
        }

        builder
            .add_source(Environment::with_prefix("PERSEUS").separator("__"))
            .build()?
            .try_deserialize()
    }

    /// Load configuration from environment variables only
    pub fn load_from_env() -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(Config::try_from(&PerseusConfig::default())?)
            .add_source(Environment::with_prefix("PERSEUS").separator("__"))
            .build()?
            .try_deserialize()
    }
}
