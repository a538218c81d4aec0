//! Scan lifecycle endpoints.
//!
//! - `POST   /v1/scans`      — materialize one task per domain and enqueue it
//! - `GET    /v1/scans/:id`  — scan metadata plus its tasks' current state
//! - `DELETE /v1/scans/:id`  — delete a scan, its tasks, results, and blobs
//!
//! Shape: validate the request body, build a domain record, persist it,
//! hand off to the async side, return 201 with identifiers — one task per
//! domain, fanned out to the broker.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};
use serde::Deserialize;

use authscope_domain::model::{AnalyzerKind, Scan, ScanConfig, ScanParams, ScanType, Task};

use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateScanRequest {
    pub scan_type: ScanType,
    pub domains: Vec<String>,
    pub analyzer: AnalyzerKind,
    #[serde(default)]
    pub analyzer_config: serde_json::Value,
    #[serde(default)]
    pub list_id: Option<String>,
}

pub async fn create_scan(State(state): State<AppState>, Json(body): Json<CreateScanRequest>) -> impl IntoResponse {
    if body.domains.is_empty() {
        return (StatusCode::BAD_REQUEST, Json(serde_json::json!({ "error": "domains must not be empty" })))
            .into_response();
    }

    let scan = Scan::new(body.scan_type, ScanParams { list_id: body.list_id.clone(), ..Default::default() });
    if let Err(e) = state.documents.put_scan(scan.clone()).await {
        return (StatusCode::INTERNAL_SERVER_ERROR, Json(serde_json::json!({ "error": e.to_string() })))
            .into_response();
    }

    let mut task_ids = Vec::with_capacity(body.domains.len());
    for domain in &body.domains {
        let scan_config = ScanConfig {
            scan_id: scan.scan_id.clone(),
            scan_type: body.scan_type,
            list_id: body.list_id.clone(),
            rank: None,
        };
        let task = Task::new(scan_config, domain.clone(), body.analyzer, body.analyzer_config.clone());
        let task_id = task.task_config.task_id.clone();

        if let Err(e) = state.documents.put_task(task.clone()).await {
            tracing::warn!(task_id = %task_id, error = %e, "failed to persist task");
            continue;
        }

        let reply_to = state.admin.reply_url(&task_id);
        if let Err(e) = state.broker.publish(task, reply_to).await {
            tracing::warn!(task_id = %task_id, error = %e, "failed to publish task");
            continue;
        }

        task_ids.push(task_id);
    }

    (StatusCode::CREATED, Json(serde_json::json!({ "scan_id": scan.scan_id, "task_ids": task_ids })))
        .into_response()
}

pub async fn get_scan(State(state): State<AppState>, Path(scan_id): Path<String>) -> impl IntoResponse {
    let scan = match state.documents.get_scan(&scan_id).await {
        Ok(Some(scan)) => scan,
        Ok(None) => {
            return (StatusCode::NOT_FOUND, Json(serde_json::json!({ "error": "scan not found" }))).into_response();
        }
        Err(e) => {
            return (StatusCode::INTERNAL_SERVER_ERROR, Json(serde_json::json!({ "error": e.to_string() })))
                .into_response();
        }
    };

    let tasks = state.documents.tasks_for_scan(&scan_id).await.unwrap_or_default();
    let summary: Vec<serde_json::Value> = tasks
        .iter()
        .map(|t| serde_json::json!({ "task_id": t.task_config.task_id, "domain": t.domain, "state": t.task_config.task_state }))
        .collect();

    Json(serde_json::json!({ "scan": scan, "tasks": summary })).into_response()
}

pub async fn delete_scan(State(state): State<AppState>, Path(scan_id): Path<String>) -> impl IntoResponse {
    match state.admin.delete_scan(&scan_id).await {
        Ok(blobs_removed) => Json(serde_json::json!({ "scan_id": scan_id, "blobs_removed": blobs_removed })).into_response(),
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, Json(serde_json::json!({ "error": e.to_string() }))).into_response(),
    }
}
