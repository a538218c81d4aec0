//! Worker reply intake and task lookup.
//!
//! - `PUT /v1/tasks/:id/reply` — a worker's `authscope_worker::reporter` PUTs
//!   its `TaskReplyEnvelope` here when a task finishes (or fails).
//! - `GET /v1/tasks/:id`       — task state, for polling clients.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};

use authscope_domain::model::{TaskResult, TaskState};
use authscope_protocol::TaskReplyEnvelope;

use crate::state::AppState;

pub async fn reply(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
    Json(envelope): Json<TaskReplyEnvelope>,
) -> impl IntoResponse {
    if envelope.task_id != task_id {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({ "error": "task_id in body does not match path" })),
        )
            .into_response();
    }

    let task = match state.documents.get_task(&task_id).await {
        Ok(Some(task)) => task,
        Ok(None) => {
            return (StatusCode::NOT_FOUND, Json(serde_json::json!({ "error": "task not found" }))).into_response();
        }
        Err(e) => {
            return (StatusCode::INTERNAL_SERVER_ERROR, Json(serde_json::json!({ "error": e.to_string() })))
                .into_response();
        }
    };

    let mut body = envelope.body;
    if let Err(e) = crate::blob_offload::offload(&task_id, state.blobs.as_ref(), &mut body).await {
        return (StatusCode::INTERNAL_SERVER_ERROR, Json(serde_json::json!({ "error": e.to_string() })))
            .into_response();
    }

    let result: TaskResult = match serde_json::from_value(body) {
        Ok(result) => result,
        Err(e) => {
            return (StatusCode::BAD_REQUEST, Json(serde_json::json!({ "error": format!("invalid task result: {e}") })))
                .into_response();
        }
    };

    if let Err(e) = state.documents.put_result(task.analyzer, result).await {
        return (StatusCode::INTERNAL_SERVER_ERROR, Json(serde_json::json!({ "error": e.to_string() })))
            .into_response();
    }

    let mut timestamps = task.task_config.timestamps;
    timestamps.response_received = Some(chrono::Utc::now());
    if let Err(e) = state
        .documents
        .update_task_state(&task_id, TaskState::ResponseReceived, timestamps)
        .await
    {
        return (StatusCode::INTERNAL_SERVER_ERROR, Json(serde_json::json!({ "error": e.to_string() })))
            .into_response();
    }

    StatusCode::NO_CONTENT.into_response()
}

pub async fn get_task(State(state): State<AppState>, Path(task_id): Path<String>) -> impl IntoResponse {
    match state.documents.get_task(&task_id).await {
        Ok(Some(task)) => Json(serde_json::json!(task)).into_response(),
        Ok(None) => (StatusCode::NOT_FOUND, Json(serde_json::json!({ "error": "task not found" }))).into_response(),
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, Json(serde_json::json!({ "error": e.to_string() }))).into_response(),
    }
}
