//! Wire envelopes exchanged between the dispatcher and workers.
//!
//! Tasks travel dispatcher → broker → worker as a persistent AMQP message
//! carrying message properties (`reply_to`, `correlation_id`) alongside a
//! JSON body. Replies travel worker → dispatcher over plain HTTP PUT, not
//! back through the broker — see `TaskReplyEnvelope`.

use serde::{Deserialize, Serialize};

use authscope_domain::model::Task;

/// Maximum artifact size, inline on the wire, before the dispatcher's
/// blob-offload traversal must replace it with a `BlobReference`.
pub const MAX_INLINE_ARTIFACT_BYTES: usize = 8 * 1024 * 1024;

/// The AMQP message properties a task publish carries, beyond the JSON body
/// itself. `content_type` is always `application/json`; delivery mode is
/// always persistent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrokerMessageProperties {
    pub content_type: String,
    pub reply_to: String,
    pub correlation_id: String,
}

impl BrokerMessageProperties {
    pub fn for_task(task_id: impl Into<String>, reply_to: impl Into<String>) -> Self {
        Self {
            content_type: "application/json".into(),
            reply_to: reply_to.into(),
            correlation_id: task_id.into(),
        }
    }
}

/// A task as it is published to a broker queue: the task document plus the
/// message properties the worker needs to route its reply.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskEnvelope {
    pub properties: BrokerMessageProperties,
    pub task: Task,
}

impl TaskEnvelope {
    pub fn new(task: Task, reply_to: impl Into<String>) -> Self {
        let properties =
            BrokerMessageProperties::for_task(task.task_config.task_id.clone(), reply_to);
        Self { properties, task }
    }
}

/// Body of the worker's `PUT {reply_to}` call. Correlation back to the
/// originating task is carried by `task_id` (mirrors `correlation_id` in
/// `BrokerMessageProperties`), not re-derived from the HTTP path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskReplyEnvelope {
    pub task_id: String,
    pub scan_id: String,
    pub body: serde_json::Value,
}

#[cfg(test)]
mod tests {
    use super::*;
    use authscope_domain::model::{AnalyzerKind, ScanConfig, ScanType};

    fn sample_task() -> Task {
        Task::new(
            ScanConfig {
                scan_id: "scan-1".into(),
                scan_type: ScanType::Single,
                list_id: None,
                rank: None,
            },
            "example.com",
            AnalyzerKind::LandscapeAnalysis,
            serde_json::json!({}),
        )
    }

    #[test]
    fn envelope_carries_correlation_id_matching_task_id() {
        let task = sample_task();
        let task_id = task.task_config.task_id.clone();
        let env = TaskEnvelope::new(task, "https://dispatcher.example/reply");
        assert_eq!(env.properties.correlation_id, task_id);
        assert_eq!(env.properties.content_type, "application/json");
    }
}
