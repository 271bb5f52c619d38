//! RabbitMQ transport: one inbound consumer queue, any number of outbound queues.

use async_trait::async_trait;
use futures_util::{Stream, StreamExt};
use lapin::message::Delivery;
use lapin::options::{
    BasicAckOptions, BasicConsumeOptions, BasicNackOptions, BasicPublishOptions,
    BasicQosOptions, ConfirmSelectOptions, QueueDeclareOptions,
};
use lapin::types::FieldTable;
use lapin::{BasicProperties, Channel, Connection, ConnectionProperties, Consumer};
use std::pin::Pin;
use std::task::{Context, Poll};
use tracing::{debug, info};

const CONSUMER_TAG: &str = "employee-reads";
const PERSISTENT: u8 = 2;

#[derive(thiserror::Error, Debug)]
pub enum RabbitmqError {
    #[error("rabbitmq error: {0}")]
    Lapin(#[from] lapin::Error),
    #[error("message body is not valid JSON: {0}")]
    InvalidBody(#[from] serde_json::Error),
}

#[derive(thiserror::Error, Debug)]
pub enum PublishError {
    #[error("could not serialize payload for queue {queue}: {source}")]
    Serialize {
        queue: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("could not publish to queue {queue}: {source}")]
    Lapin {
        queue: String,
        #[source]
        source: lapin::Error,
    },
    #[error("broker rejected message published to queue {queue}")]
    Rejected { queue: String },
}

/// A consumed delivery: its decoded body and its acknowledgement.
#[async_trait]
pub trait InboundMessage: Send + Sync {
    fn data(&self) -> Result<serde_json::Value, RabbitmqError>;

    /// Acknowledges the message.
    async fn success(&self) -> Result<(), RabbitmqError>;

    /// Negatively acknowledges the message, optionally putting it back on the queue.
    async fn fail(&self, requeue: bool) -> Result<(), RabbitmqError>;
}

pub fn decode_body(body: &[u8]) -> Result<serde_json::Value, RabbitmqError> {
    Ok(serde_json::from_slice(body)?)
}

/// Publishes JSON payloads onto a named queue.
///
/// Implementations must tolerate concurrent calls from several tasks.
#[async_trait]
pub trait Outputter: Send + Sync {
    async fn send(&self, queue: &str, payload: serde_json::Value) -> Result<(), PublishError>;
}

pub struct RabbitmqClient {
    connection: Connection,
    channel: Channel,
    queue_from: String,
}

impl RabbitmqClient {
    /// Connects to the broker and declares every queue this client touches.
    ///
    /// Prefetch is pinned to 1 so that a single message is in flight at a time.
    pub async fn connect(
        url: &str,
        queue_from: &str,
        queue_to: &[String],
    ) -> Result<Self, RabbitmqError> {
        let connection = Connection::connect(url, ConnectionProperties::default()).await?;
        let channel = connection.create_channel().await?;
        channel
            .confirm_select(ConfirmSelectOptions::default())
            .await?;
        channel.basic_qos(1, BasicQosOptions::default()).await?;

        let queues = std::iter::once(queue_from).chain(queue_to.iter().map(String::as_str));
        for queue in queues {
            channel
                .queue_declare(
                    queue,
                    QueueDeclareOptions {
                        durable: true,
                        ..Default::default()
                    },
                    FieldTable::default(),
                )
                .await?;
        }

        info!(queue_from = %queue_from, queue_to = ?queue_to, "Connected to RabbitMQ");

        Ok(RabbitmqClient {
            connection,
            channel,
            queue_from: queue_from.to_string(),
        })
    }

    /// Starts consuming the inbound queue.
    pub async fn iterator(&self) -> Result<MessageIterator, RabbitmqError> {
        let consumer = self
            .channel
            .basic_consume(
                &self.queue_from,
                CONSUMER_TAG,
                BasicConsumeOptions::default(),
                FieldTable::default(),
            )
            .await?;

        Ok(MessageIterator { consumer })
    }

    pub async fn close(&self) -> Result<(), RabbitmqError> {
        self.channel.close(200, "shutting down").await?;
        self.connection.close(200, "shutting down").await?;
        Ok(())
    }
}

#[async_trait]
impl Outputter for RabbitmqClient {
    async fn send(&self, queue: &str, payload: serde_json::Value) -> Result<(), PublishError> {
        let body = serde_json::to_vec(&payload).map_err(|source| PublishError::Serialize {
            queue: queue.to_string(),
            source,
        })?;
        let lapin_error = |source| PublishError::Lapin {
            queue: queue.to_string(),
            source,
        };

        let properties = BasicProperties::default()
            .with_content_type("application/json".into())
            .with_delivery_mode(PERSISTENT);

        let confirmation = self
            .channel
            .basic_publish("", queue, BasicPublishOptions::default(), &body, properties)
            .await
            .map_err(lapin_error)?
            .await
            .map_err(lapin_error)?;

        if confirmation.is_nack() {
            return Err(PublishError::Rejected {
                queue: queue.to_string(),
            });
        }

        debug!(queue = %queue, bytes = body.len(), "Published message");
        Ok(())
    }
}

/// Stream of deliveries from the inbound queue. Ends once the consumer is cancelled.
pub struct MessageIterator {
    consumer: Consumer,
}

impl Stream for MessageIterator {
    type Item = Result<RabbitmqMessage, RabbitmqError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.consumer.poll_next_unpin(cx).map(|next| {
            next.map(|delivery| {
                delivery
                    .map(|delivery| RabbitmqMessage { delivery })
                    .map_err(RabbitmqError::from)
            })
        })
    }
}

pub struct RabbitmqMessage {
    delivery: Delivery,
}

#[async_trait]
impl InboundMessage for RabbitmqMessage {
    fn data(&self) -> Result<serde_json::Value, RabbitmqError> {
        decode_body(&self.delivery.data)
    }

    async fn success(&self) -> Result<(), RabbitmqError> {
        self.delivery.acker.ack(BasicAckOptions::default()).await?;
        Ok(())
    }

    async fn fail(&self, requeue: bool) -> Result<(), RabbitmqError> {
        self.delivery
            .acker
            .nack(BasicNackOptions {
                requeue,
                ..Default::default()
            })
            .await?;
        Ok(())
    }
}
