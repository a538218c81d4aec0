//! The broker consume loop (§4.8): connects to the queue for one
//! [`AnalyzerKind`], and for every delivery runs the task to completion,
//! replies to the dispatcher, and acks — reconnecting with backoff on any
//! connection loss. An outer loop resets its backoff only after a
//! successful connect, gated by a `CancellationToken` for graceful
//! shutdown.

use std::time::Duration;

use futures_util::StreamExt;
use lapin::options::{BasicAckOptions, BasicConsumeOptions, BasicQosOptions};
use lapin::types::FieldTable;
use lapin::{Connection, ConnectionProperties};
use tokio_util::sync::CancellationToken;

use authscope_domain::config::Config;
use authscope_domain::model::{AnalyzerKind, Task, TaskState};
use authscope_domain::trace::TraceEvent;
use authscope_protocol::TaskEnvelope;

use crate::process::run_in_child;
use crate::reconnect::ReconnectBackoff;
use crate::reply::send_reply;
use crate::types::WorkerError;

/// Runs the consume loop until `shutdown` is cancelled. Returns once the
/// broker connection is closed in response to shutdown; reconnect attempts
/// are otherwise unbounded (matching `BrokerConfig::reconnect_attempts == 0`
/// unless overridden).
pub async fn run(cfg: Config, analyzer: AnalyzerKind, shutdown: CancellationToken) -> Result<(), WorkerError> {
    let queue = analyzer.queue_name();
    let mut backoff = ReconnectBackoff::for_broker(&cfg.worker.broker);
    let http = reqwest::Client::new();

    loop {
        if shutdown.is_cancelled() {
            return Ok(());
        }

        match connect_and_consume(&cfg, queue, &http, &shutdown).await {
            Ok(()) => return Ok(()),
            Err(e) => {
                if backoff.should_give_up() {
                    return Err(WorkerError::ReconnectExhausted(backoff.attempt() + 1));
                }
                let delay = backoff.delay();
                TraceEvent::BrokerReconnect { queue: queue.to_string(), attempt: backoff.attempt(), delay_ms: delay.as_millis() as u64 }.emit();
                tracing::warn!(queue, error = %e, attempt = backoff.attempt(), "broker connection lost, reconnecting");
                tokio::select! {
                    _ = tokio::time::sleep(delay) => {}
                    _ = shutdown.cancelled() => return Ok(()),
                }
                backoff.record_failure();
            }
        }
    }
}

async fn connect_and_consume(
    cfg: &Config,
    queue: &str,
    http: &reqwest::Client,
    shutdown: &CancellationToken,
) -> Result<(), WorkerError> {
    let conn = Connection::connect(&cfg.worker.broker.uri, ConnectionProperties::default())
        .await
        .map_err(|e| WorkerError::Broker(e.to_string()))?;
    let channel = conn
        .create_channel()
        .await
        .map_err(|e| WorkerError::Broker(e.to_string()))?;
    channel
        .basic_qos(cfg.worker.broker.prefetch, BasicQosOptions::default())
        .await
        .map_err(|e| WorkerError::Broker(e.to_string()))?;

    let mut consumer = channel
        .basic_consume(
            queue,
            "authscope-worker",
            BasicConsumeOptions::default(),
            FieldTable::default(),
        )
        .await
        .map_err(|e| WorkerError::Broker(e.to_string()))?;

    TraceEvent::BrokerConnected { queue: queue.to_string() }.emit();

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => {
                let _ = conn.close(200, "shutdown").await;
                return Ok(());
            }
            delivery = consumer.next() => {
                let Some(delivery) = delivery else {
                    return Err(WorkerError::Broker("consumer stream closed".into()));
                };
                let delivery = delivery.map_err(|e| WorkerError::Broker(e.to_string()))?;

                let envelope: TaskEnvelope = match serde_json::from_slice(&delivery.data) {
                    Ok(env) => env,
                    Err(e) => {
                        tracing::error!(error = %e, "malformed task envelope, acking to drop poison message");
                        let _ = delivery.ack(BasicAckOptions::default()).await;
                        continue;
                    }
                };

                handle_task(cfg, envelope, http).await;
                let _ = delivery.ack(BasicAckOptions::default()).await;
            }
        }
    }
}

async fn handle_task(cfg: &Config, envelope: TaskEnvelope, http: &reqwest::Client) {
    let mut task: Task = envelope.task;
    let task_id = task.task_config.task_id.clone();
    TraceEvent::TaskReceived { task_id: task_id.clone(), queue: task.analyzer.queue_name().to_string() }.emit();

    task.task_config.task_state = TaskState::RequestReceived;
    task.task_config.timestamps.request_received = Some(chrono::Utc::now());

    let cap = Duration::from_secs(cfg.worker.task_wall_time_cap_seconds);
    let result = match run_in_child(&task, cfg, cap).await {
        Ok(result) => result,
        Err(e) => {
            tracing::error!(task_id = %task_id, error = %e, "failed to run task in child process");
            return;
        }
    };

    task.task_config.task_state = TaskState::ResponseSent;
    task.task_config.timestamps.response_sent = Some(chrono::Utc::now());

    send_reply(http, &envelope.properties.reply_to, &task.scan_config.scan_id, &result, &cfg.worker).await;
}
