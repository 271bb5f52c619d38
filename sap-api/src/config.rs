use serde::Deserialize;
use thiserror::Error;
use url::Url;

#[derive(Error, Debug, PartialEq)]
pub enum ValidationError {
    #[error("Port cannot be 0")]
    InvalidPort,

    #[error("SAP API key is empty")]
    EmptyApiKey,

    #[error("Inbound queue name is empty")]
    EmptyQueueFrom,

    #[error("At least one outbound queue is required")]
    NoQueueTo,

    #[error("Empty outbound queue name")]
    EmptyQueueTo,
}

/// Worker configuration: where to read commands, where to fetch from, where to publish.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Config {
    /// Optional listener for `/health` and `/ready`
    #[serde(default)]
    pub admin_listener: Option<Listener>,
    pub sap: SapConfig,
    pub rabbitmq: RabbitmqConfig,
}

impl Config {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(listener) = &self.admin_listener {
            listener.validate()?;
        }
        self.sap.validate()?;
        self.rabbitmq.validate()
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Listener {
    pub host: String,
    pub port: u16,
}

impl Listener {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.port == 0 {
            return Err(ValidationError::InvalidPort);
        }
        Ok(())
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct SapConfig {
    /// Base URL of the SAP tenant. The OData service lives under `c4codataapi/`.
    pub base_url: Url,
    /// Sent as the `APIKey` header on every request
    pub api_key: String,
    /// Per-request timeout. Unset means the HTTP client default (none).
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl SapConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.api_key.is_empty() {
            return Err(ValidationError::EmptyApiKey);
        }
        Ok(())
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct RabbitmqConfig {
    pub url: String,
    pub queue_from: String,
    pub queue_to: Vec<String>,
    /// Whether a failed message goes back onto `queue_from` instead of being dead-lettered.
    #[serde(default)]
    pub requeue_on_failure: bool,
}

impl RabbitmqConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.queue_from.is_empty() {
            return Err(ValidationError::EmptyQueueFrom);
        }
        if self.queue_to.is_empty() {
            return Err(ValidationError::NoQueueTo);
        }
        if self.queue_to.iter().any(String::is_empty) {
            return Err(ValidationError::EmptyQueueTo);
        }
        Ok(())
    }

    /// Records are always published to the first outbound queue.
    pub fn output_queue(&self) -> Result<&str, ValidationError> {
        self.queue_to
            .first()
            .map(String::as_str)
            .ok_or(ValidationError::NoQueueTo)
    }
}
