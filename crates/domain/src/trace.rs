use serde::Serialize;

/// Structured trace events emitted across all authscope crates.
///
/// Each stage of the pipeline, each broker reconnect, and each administrative
/// operation emits one of these rather than a free-form log line, so that
/// dashboards and tests can key off `event` without parsing prose.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event")]
pub enum TraceEvent {
    StageCompleted {
        task_id: String,
        stage: String,
        duration_seconds: f64,
    },
    BrokerReconnect {
        queue: String,
        attempt: u32,
        delay_ms: u64,
    },
    BrokerConnected {
        queue: String,
    },
    ReplyAttempt {
        task_id: String,
        attempt: u32,
        status: Option<u16>,
    },
    ReplyExhausted {
        task_id: String,
        attempts: u32,
    },
    ProcessTimeout {
        task_id: String,
        cap_seconds: u64,
    },
    TaskPublished {
        scan_id: String,
        task_id: String,
        queue: String,
    },
    TaskReceived {
        task_id: String,
        queue: String,
    },
    BlobOffloaded {
        task_id: String,
        bucket: String,
        object_name: String,
    },
    DuplicatePruned {
        scan_id: String,
        task_id: String,
        kept: String,
        removed_count: usize,
    },
    ScanDeleted {
        scan_id: String,
        blobs_removed: usize,
    },
    RescanEmitted {
        source_task_id: String,
        new_task_id: String,
    },
}

impl TraceEvent {
    pub fn emit(&self) {
        let json = serde_json::to_string(self).unwrap_or_default();
        tracing::info!(trace_event = %json, "authscope_event");
    }
}
