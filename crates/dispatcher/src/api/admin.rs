//! HTTP handlers wrapping [`crate::admin::AdminOps`]. Every route here sits
//! behind the admin-token middleware.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};
use serde::Deserialize;

use authscope_domain::model::AnalyzerKind;

use crate::state::AppState;

pub async fn rescan_task(State(state): State<AppState>, Path(task_id): Path<String>) -> impl IntoResponse {
    match state.admin.rescan_task(&task_id).await {
        Ok(fresh) => (StatusCode::CREATED, Json(serde_json::json!({ "task_id": fresh.task_config.task_id }))).into_response(),
        Err(e) => (StatusCode::BAD_REQUEST, Json(serde_json::json!({ "error": e.to_string() }))).into_response(),
    }
}

#[derive(Debug, Deserialize)]
pub struct PruneDuplicatesRequest {
    pub analyzer: AnalyzerKind,
}

pub async fn prune_duplicates(
    State(state): State<AppState>,
    Path(scan_id): Path<String>,
    Json(body): Json<PruneDuplicatesRequest>,
) -> impl IntoResponse {
    match state.admin.prune_duplicates(&scan_id, body.analyzer).await {
        Ok(removed) => Json(serde_json::json!({ "removed": removed })).into_response(),
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, Json(serde_json::json!({ "error": e.to_string() }))).into_response(),
    }
}

#[derive(Debug, Deserialize)]
pub struct TagRequest {
    pub scan_id: String,
}

pub async fn add_tag(
    State(state): State<AppState>,
    Path(tag_name): Path<String>,
    Json(body): Json<TagRequest>,
) -> impl IntoResponse {
    match state.admin.add_tag(&tag_name, &body.scan_id).await {
        Ok(tag) => Json(serde_json::json!(tag)).into_response(),
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, Json(serde_json::json!({ "error": e.to_string() }))).into_response(),
    }
}

pub async fn remove_tag(
    State(state): State<AppState>,
    Path(tag_name): Path<String>,
    Json(body): Json<TagRequest>,
) -> impl IntoResponse {
    match state.admin.remove_tag(&tag_name, &body.scan_id).await {
        Ok(Some(tag)) => Json(serde_json::json!(tag)).into_response(),
        Ok(None) => (StatusCode::NOT_FOUND, Json(serde_json::json!({ "error": "tag not found" }))).into_response(),
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, Json(serde_json::json!({ "error": e.to_string() }))).into_response(),
    }
}
