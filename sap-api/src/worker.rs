use crate::caller::SapApiCaller;
use crate::errors::WorkerError;
use crate::input_reader::RequestCommand;
use crate::metrics_defs::MESSAGES_PROCESSED;
use futures_util::{Stream, StreamExt};
use shared::counter;
use shared::rabbitmq::{InboundMessage, RabbitmqError};
use tracing::{debug, error, info};

/// Handles one inbound payload end to end.
///
/// The whole flow runs in its own task so that a panic anywhere inside it
/// surfaces here as [`WorkerError::Fault`] instead of taking down the loop.
/// Branch-level failures are not errors at this level.
pub async fn process_message(
    caller: &SapApiCaller,
    data: serde_json::Value,
) -> Result<usize, WorkerError> {
    let caller = caller.clone();

    tokio::spawn(async move {
        let command = RequestCommand::from_payload(&data);
        debug!(
            employee_id = %command.employee_id,
            user_id = %command.user_id,
            accepter = ?command.accepter,
            "Extracted request command"
        );
        caller.async_get_employee_basic_data(&command).await
    })
    .await?
}

/// Consumes until the stream ends or `shutdown` resolves.
///
/// `shutdown` is polled for the whole lifetime of the loop. A request that
/// arrives while a message is being handled stops the loop once that message
/// has been acknowledged.
pub async fn consume<S, M, F>(
    caller: &SapApiCaller,
    messages: &mut S,
    requeue_on_failure: bool,
    shutdown: F,
) -> Result<(), WorkerError>
where
    S: Stream<Item = Result<M, RabbitmqError>> + Unpin,
    M: InboundMessage,
    F: Future<Output = ()>,
{
    tokio::pin!(shutdown);

    loop {
        let next = tokio::select! {
            biased;
            _ = &mut shutdown => {
                info!("Shutdown requested, stopping consumer");
                return Ok(());
            }
            next = messages.next() => next,
        };

        let Some(delivery) = next else {
            info!("Consumer cancelled by broker");
            return Ok(());
        };

        handle_delivery(caller, &delivery?, requeue_on_failure).await?;
    }
}

async fn handle_delivery<M: InboundMessage>(
    caller: &SapApiCaller,
    message: &M,
    requeue_on_failure: bool,
) -> Result<(), RabbitmqError> {
    let data = match message.data() {
        Ok(data) => data,
        Err(e) => {
            counter!(MESSAGES_PROCESSED, "outcome" => "failure").increment(1);
            error!(error = %e, "Discarding undecodable message");
            return message.fail(false).await;
        }
    };

    match process_message(caller, data).await {
        Ok(completed) => {
            counter!(MESSAGES_PROCESSED, "outcome" => "success").increment(1);
            debug!(branches = completed, "Message processed");
            message.success().await
        }
        Err(e) => {
            counter!(MESSAGES_PROCESSED, "outcome" => "failure").increment(1);
            error!(error = %e, "Message failed");
            message.fail(requeue_on_failure).await
        }
    }
}
