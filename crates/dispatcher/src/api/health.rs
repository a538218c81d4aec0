use axum::extract::State;
use axum::response::Json;

use crate::state::AppState;

pub async fn health(State(_state): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}
