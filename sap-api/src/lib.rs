#![recursion_limit = "256"]

pub mod caller;
pub mod client;
pub mod config;
pub mod errors;
pub mod input_reader;
pub mod metrics_defs;
pub mod output_formatter;
pub mod worker;

#[cfg(test)]
mod testutils;

use caller::SapApiCaller;
use client::SapClient;
use errors::WorkerError;
use shared::admin_service::AdminService;
use shared::http::run_http_service;
use shared::rabbitmq::RabbitmqClient;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{error, info};

#[derive(thiserror::Error, Debug)]
pub enum AdminError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Connects to RabbitMQ and processes inbound messages one at a time until
/// the consumer stops.
pub async fn run(config: config::Config) -> Result<(), WorkerError> {
    config.validate()?;

    let client = SapClient::new(&config.sap).map_err(WorkerError::Client)?;
    let rmq = Arc::new(
        RabbitmqClient::connect(
            &config.rabbitmq.url,
            &config.rabbitmq.queue_from,
            &config.rabbitmq.queue_to,
        )
        .await?,
    );
    let caller = SapApiCaller::new(client, config.rabbitmq.output_queue()?, rmq.clone());

    let ready = Arc::new(AtomicBool::new(false));
    if let Some(listener) = config.admin_listener.clone() {
        let ready = ready.clone();
        let service = AdminService::<_, AdminError>::new(move || ready.load(Ordering::Relaxed));
        tokio::spawn(async move {
            if let Err(e) = run_http_service(&listener.host, listener.port, service).await {
                error!(error = %e, "Admin listener stopped");
            }
        });
    }

    let mut messages = rmq.iterator().await?;
    ready.store(true, Ordering::Relaxed);
    info!(queue = %config.rabbitmq.queue_from, "Waiting for messages");

    let result = worker::consume(
        &caller,
        &mut messages,
        config.rabbitmq.requeue_on_failure,
        ctrl_c(),
    )
    .await;

    ready.store(false, Ordering::Relaxed);
    rmq.close().await?;
    result
}

async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Cannot listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
}
