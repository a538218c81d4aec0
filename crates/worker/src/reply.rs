//! Delivers a `TaskResult` to the dispatcher's `reply_to` URL over HTTP,
//! retrying with the same jittered backoff the broker reconnect uses.

use authscope_domain::config::WorkerConfig;
use authscope_domain::model::TaskResult;
use authscope_domain::trace::TraceEvent;
use authscope_protocol::TaskReplyEnvelope;

use crate::reconnect::ReconnectBackoff;

/// `true` once the dispatcher has accepted the reply (2xx); `false` once
/// attempts are exhausted. The caller acks the broker message either way —
/// a reply that never lands is logged, not replayed as a poison pill.
pub async fn send_reply(
    client: &reqwest::Client,
    reply_to: &str,
    scan_id: &str,
    result: &TaskResult,
    cfg: &WorkerConfig,
) -> bool {
    let task_id = result.task_id.clone();
    let body = TaskReplyEnvelope {
        task_id: task_id.clone(),
        scan_id: scan_id.to_string(),
        body: serde_json::to_value(result).unwrap_or(serde_json::Value::Null),
    };

    let mut backoff = ReconnectBackoff::for_reply(cfg);

    loop {
        let outcome = client
            .put(reply_to)
            .basic_auth(&cfg.reply_basic_auth_user, Some(&cfg.reply_basic_auth_pass))
            .json(&body)
            .send()
            .await;

        let status = outcome.as_ref().ok().map(|r| r.status().as_u16());
        TraceEvent::ReplyAttempt { task_id: task_id.clone(), attempt: backoff.attempt(), status }.emit();

        if let Ok(response) = &outcome {
            if response.status().is_success() {
                return true;
            }
        }

        if backoff.should_give_up() {
            TraceEvent::ReplyExhausted { task_id: task_id.clone(), attempts: backoff.attempt() + 1 }.emit();
            return false;
        }

        tokio::time::sleep(backoff.delay()).await;
        backoff.record_failure();
    }
}
