//! Boot logic shared by the `dispatcher serve` CLI subcommand: build the
//! [`AppState`] once, then spawn its periodic background sweeps.
//!
//! Split into `build_app_state`/`spawn_background_tasks` rather than a
//! single do-everything function, so other entry points (tests included)
//! can reuse the state construction without the sweeps attached.

use std::sync::Arc;
use std::time::Duration;

use sha2::{Digest, Sha256};
use tokio_util::sync::CancellationToken;

use authscope_domain::config::Config;

use crate::admin::AdminOps;
use crate::broker::{BrokerPublish, BrokerPublisher};
use crate::state::AppState;
use crate::store::{InMemoryBlobStore, InMemoryDocumentStore};

pub async fn build_app_state(config: Arc<Config>) -> anyhow::Result<AppState> {
    let documents = Arc::new(InMemoryDocumentStore::new());
    let blobs = Arc::new(InMemoryBlobStore::new());
    let broker: Arc<dyn BrokerPublish> = Arc::new(BrokerPublisher::new(&config.worker.broker));

    let admin = Arc::new(AdminOps {
        documents: documents.clone(),
        blobs: blobs.clone(),
        broker: broker.clone(),
        reply_base_url: config.server.reply_base_url.clone(),
    });

    let admin_token_hash = admin_token_hash(&config.server.admin_token_env);

    Ok(AppState { config, documents, blobs, broker, admin, admin_token_hash })
}

fn admin_token_hash(env_var: &str) -> Option<[u8; 32]> {
    let token = std::env::var(env_var).ok()?;
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    Some(hasher.finalize().into())
}

/// Spawns the dispatcher's periodic sweeps. Currently one: tasks stuck
/// non-terminal past `worker.task_wall_time_cap_seconds` (a worker that
/// crashed hard enough to never send a reply, or was lost with its message
/// unacked past redelivery) are automatically rescanned.
pub fn spawn_background_tasks(state: AppState, shutdown: CancellationToken) {
    tokio::spawn(stale_task_sweep(state, shutdown));
}

async fn stale_task_sweep(state: AppState, shutdown: CancellationToken) {
    let interval = Duration::from_secs(300);
    loop {
        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            _ = shutdown.cancelled() => return,
        }

        let cutoff = chrono::Utc::now()
            - chrono::Duration::seconds(state.config.worker.task_wall_time_cap_seconds as i64 * 2);
        let stale = match state.documents.pending_tasks_older_than(cutoff).await {
            Ok(tasks) => tasks,
            Err(e) => {
                tracing::warn!(error = %e, "stale task sweep: failed to query document store");
                continue;
            }
        };

        for task in stale {
            let task_id = task.task_config.task_id.clone();
            if let Err(e) = state.admin.rescan_task(&task_id).await {
                tracing::warn!(task_id = %task_id, error = %e, "stale task sweep: rescan failed");
            }
        }
    }
}
