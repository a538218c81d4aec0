//! Publishes tasks onto the broker queue named by their `AnalyzerKind`.
//!
//! Mirrors the worker's own `lapin` usage (`authscope_worker::consumer`) from
//! the other end of the connection: one lazily-established `Connection` and
//! `Channel`, reused across publishes, re-created on the next publish if the
//! connection has dropped.

use lapin::options::{BasicPublishOptions, QueueDeclareOptions};
use lapin::types::FieldTable;
use lapin::{BasicProperties, Channel, Connection, ConnectionProperties};
use tokio::sync::Mutex;

use authscope_domain::config::BrokerConfig;
use authscope_domain::error::{Error, Result};
use authscope_domain::model::Task;
use authscope_domain::trace::TraceEvent;
use authscope_protocol::TaskEnvelope;

/// Publishes a task onto its analyzer's queue. Abstracted behind a trait,
/// same as `DocumentStore`/`BlobStore`, so handler logic can be exercised
/// against a fake in tests without a real broker connection — see
/// `authscope-testing`'s `RecordingBroker`.
#[async_trait::async_trait]
pub trait BrokerPublish: Send + Sync {
    async fn publish(&self, task: Task, reply_to: String) -> Result<()>;
}

pub struct BrokerPublisher {
    uri: String,
    // The `Connection` must be kept alive alongside its `Channel` — dropping
    // it closes every channel it owns.
    conn: Mutex<Option<(Connection, Channel)>>,
}

impl BrokerPublisher {
    pub fn new(cfg: &BrokerConfig) -> Self {
        Self { uri: cfg.uri.clone(), conn: Mutex::new(None) }
    }

    async fn channel(&self) -> Result<Channel> {
        let mut guard = self.conn.lock().await;
        if let Some((_, ch)) = guard.as_ref() {
            if ch.status().connected() {
                return Ok(ch.clone());
            }
        }
        let conn = Connection::connect(&self.uri, ConnectionProperties::default())
            .await
            .map_err(|e| Error::Broker(e.to_string()))?;
        let channel = conn.create_channel().await.map_err(|e| Error::Broker(e.to_string()))?;
        *guard = Some((conn, channel.clone()));
        Ok(channel)
    }

    /// Publishes `task` to its analyzer's queue, with `reply_to` embedded in
    /// the message properties so the worker knows where to PUT its result.
    async fn publish_inner(&self, task: Task, reply_to: String) -> Result<()> {
        let queue = task.analyzer.queue_name();
        let scan_id = task.scan_config.scan_id.clone();
        let task_id = task.task_config.task_id.clone();
        let envelope = TaskEnvelope::new(task, reply_to);

        let channel = self.channel().await?;
        channel
            .queue_declare(queue, QueueDeclareOptions { durable: true, ..Default::default() }, FieldTable::default())
            .await
            .map_err(|e| Error::Broker(e.to_string()))?;

        let body = serde_json::to_vec(&envelope)?;
        let properties = BasicProperties::default()
            .with_content_type(envelope.properties.content_type.as_str().into())
            .with_reply_to(envelope.properties.reply_to.as_str().into())
            .with_correlation_id(envelope.properties.correlation_id.as_str().into())
            .with_delivery_mode(2); // persistent

        channel
            .basic_publish(
                "",
                queue,
                BasicPublishOptions::default(),
                &body,
                properties,
            )
            .await
            .map_err(|e| Error::Broker(e.to_string()))?
            .await
            .map_err(|e| Error::Broker(e.to_string()))?;

        TraceEvent::TaskPublished { scan_id, task_id, queue: queue.to_string() }.emit();
        Ok(())
    }
}

#[async_trait::async_trait]
impl BrokerPublish for BrokerPublisher {
    async fn publish(&self, task: Task, reply_to: String) -> Result<()> {
        self.publish_inner(task, reply_to).await
    }
}
