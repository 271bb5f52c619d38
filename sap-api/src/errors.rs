use reqwest::StatusCode;
use shared::rabbitmq::{PublishError, RabbitmqError};
use thiserror::Error;

/// Failures while turning a raw SAP response body into records.
#[derive(Error, Debug)]
pub enum FormatError {
    #[error("cannot decode {entity} envelope: {source}")]
    Decode {
        entity: &'static str,
        #[source]
        source: serde_json::Error,
    },

    /// The envelope decoded but carried no results at all.
    #[error("{entity} response contains no results")]
    EmptyResult { entity: &'static str },
}

/// Failures inside a single accepter branch.
///
/// These are logged where they happen and never reach the message outcome.
#[derive(Error, Debug)]
pub enum CallerError {
    #[error("SAP request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("API request to {url} returned {status}")]
    UnexpectedStatus { url: String, status: StatusCode },

    #[error("could not format SAP response: {0}")]
    Format(#[from] FormatError),

    #[error("could not encode output message: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("could not publish records: {0}")]
    Publish(#[from] PublishError),
}

/// Message-level and process-level failures of the worker.
#[derive(Error, Debug)]
pub enum WorkerError {
    /// A panic anywhere in the per-message flow. Fails the message.
    #[error("fault while processing message: {0}")]
    Fault(String),

    #[error("rabbitmq error: {0}")]
    Rabbitmq(#[from] RabbitmqError),

    #[error("could not build SAP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("invalid config: {0}")]
    Config(#[from] crate::config::ValidationError),
}

impl From<tokio::task::JoinError> for WorkerError {
    fn from(e: tokio::task::JoinError) -> Self {
        WorkerError::Fault(e.to_string())
    }
}
