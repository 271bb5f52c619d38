use sap_api::config::{Config as WorkerConfig, ValidationError};
use serde::Deserialize;
use std::fs::File;
use std::path::Path;

/// Overrides `sap.api_key` so the secret can stay out of the config file.
pub const API_KEY_ENV: &str = "SAP_API_KEY";

#[derive(Deserialize, Debug, PartialEq)]
pub struct MetricsConfig {
    pub statsd_host: String,
    pub statsd_port: u16,
}

#[derive(Deserialize, Debug, PartialEq)]
pub struct LoggingConfig {
    pub sentry_dsn: Option<String>,
}

#[derive(Deserialize, Debug, PartialEq)]
pub struct CommonConfig {
    pub metrics: Option<MetricsConfig>,
    pub logging: Option<LoggingConfig>,
}

#[derive(Deserialize, Debug)]
pub struct Config {
    #[serde(flatten)]
    pub common: CommonConfig,
    #[serde(flatten)]
    pub worker: WorkerConfig,
}

impl Config {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let file = File::open(path)?;
        let data = serde_yaml::from_reader(file)?;

        Ok(data)
    }

    /// Reads, applies the environment override and validates.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::from_file(path)?;
        config.override_api_key(std::env::var(API_KEY_ENV).ok());
        config.worker.validate()?;
        Ok(config)
    }

    fn override_api_key(&mut self, api_key: Option<String>) {
        if let Some(api_key) = api_key.filter(|k| !k.is_empty()) {
            self.worker.sap.api_key = api_key;
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("could not load config from file: {0}")]
    LoadError(#[from] std::io::Error),
    #[error("could not parse config: {0}")]
    ParseError(#[from] serde_yaml::Error),
    #[error("invalid config: {0}")]
    Invalid(#[from] ValidationError),
}
