//! Admin bearer-token auth middleware.
//!
//! Hashes the expected token once at startup (`AppState::admin_token_hash`),
//! then compares a constant-time digest of the request's bearer token
//! against it on every protected request. If no admin token is configured,
//! requests pass through unauthenticated (dev mode).
//!
//! `subtle`'s `ConstantTimeEq` isn't in this workspace's dependency table,
//! so the constant-time fold is done by hand here instead of pulling in a
//! crate for one function.

use axum::body::Body;
use axum::extract::State;
use axum::http::Request;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use sha2::{Digest, Sha256};

use crate::state::AppState;

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

pub async fn require_admin_token(State(state): State<AppState>, req: Request<Body>, next: Next) -> Response {
    let expected_hash = match &state.admin_token_hash {
        Some(h) => h,
        None => return next.run(req).await,
    };

    let provided = req
        .headers()
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .unwrap_or("");

    let provided_hash = Sha256::digest(provided.as_bytes());

    if !constant_time_eq(&provided_hash, expected_hash) {
        return (
            axum::http::StatusCode::UNAUTHORIZED,
            axum::Json(serde_json::json!({ "error": "invalid or missing admin token" })),
        )
            .into_response();
    }

    next.run(req).await
}

/// Verifies the HTTP Basic credentials a worker's `reply.rs::send_reply`
/// attaches to `PUT /v1/tasks/:id/reply`, checked against
/// `worker.reply_basic_auth_user`/`reply_basic_auth_pass`. Distinct from
/// `require_admin_token` because a worker never carries the admin bearer
/// token — this is the reply endpoint's own, separate credential.
pub async fn require_worker_basic_auth(State(state): State<AppState>, req: Request<Body>, next: Next) -> Response {
    let expected_user = &state.config.worker.reply_basic_auth_user;
    let expected_pass = &state.config.worker.reply_basic_auth_pass;

    let header = req.headers().get("authorization").and_then(|v| v.to_str().ok());
    let provided = header.and_then(|v| v.strip_prefix("Basic ")).and_then(|b64| {
        use base64::Engine;
        base64::engine::general_purpose::STANDARD.decode(b64).ok()
    });

    let ok = provided
        .and_then(|bytes| String::from_utf8(bytes).ok())
        .and_then(|creds| creds.split_once(':').map(|(u, p)| (u.to_string(), p.to_string())))
        .map(|(user, pass)| constant_time_eq(user.as_bytes(), expected_user.as_bytes()) && constant_time_eq(pass.as_bytes(), expected_pass.as_bytes()))
        .unwrap_or(false);

    if !ok {
        return (
            axum::http::StatusCode::UNAUTHORIZED,
            axum::Json(serde_json::json!({ "error": "invalid worker credentials" })),
        )
            .into_response();
    }

    next.run(req).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constant_time_eq_matches_only_identical_bytes() {
        assert!(constant_time_eq(b"abc", b"abc"));
        assert!(!constant_time_eq(b"abc", b"abd"));
        assert!(!constant_time_eq(b"abc", b"ab"));
    }
}
