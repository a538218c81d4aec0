pub mod admin;
pub mod auth;
pub mod health;
pub mod scans;
pub mod tasks;

use axum::middleware;
use axum::routing::{delete, get, post, put};
use axum::Router;
use tower_http::cors::{AllowOrigin, CorsLayer};

use authscope_domain::config::CorsConfig;

use crate::state::AppState;

/// Builds the full API router.
///
/// Routes split into **public** (health probe, worker reply intake — a
/// worker has no admin token) and **protected** (scan/admin management,
/// gated behind the bearer-token middleware keyed on `server.admin_token_env`).
pub fn router(state: AppState) -> Router<AppState> {
    let reply = Router::new()
        .route("/v1/tasks/:id/reply", put(tasks::reply))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth::require_worker_basic_auth));

    let public = Router::new().route("/v1/health", get(health::health)).merge(reply);

    let protected = Router::new()
        .route("/v1/scans", post(scans::create_scan))
        .route("/v1/scans/:id", get(scans::get_scan))
        .route("/v1/scans/:id", delete(scans::delete_scan))
        .route("/v1/tasks/:id", get(tasks::get_task))
        .route("/v1/admin/tasks/:id/rescan", post(admin::rescan_task))
        .route("/v1/admin/scans/:id/prune-duplicates", post(admin::prune_duplicates))
        .route("/v1/admin/tags/:name", post(admin::add_tag))
        .route("/v1/admin/tags/:name/remove", post(admin::remove_tag))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth::require_admin_token));

    public
        .merge(protected)
        .layer(build_cors_layer(&state.config.server.cors))
        .layer(tower_http::trace::TraceLayer::new_for_http())
}

/// Builds the CORS layer from `server.cors.allowed_origins`. Supports exact
/// origins, wildcard-port patterns like `http://localhost:*`, and a bare
/// `*` for fully permissive CORS (logged, since that's rarely intended in a
/// deployment that also requires an admin token).
fn build_cors_layer(cors: &CorsConfig) -> CorsLayer {
    if cors.allowed_origins.iter().any(|o| o == "*") {
        tracing::warn!("CORS configured with a permissive '*' origin");
        return CorsLayer::permissive();
    }

    let patterns: Vec<(String, Option<String>)> = cors
        .allowed_origins
        .iter()
        .map(|origin| match origin.split_once(":*") {
            Some((prefix, _)) => (prefix.to_string(), Some(":*".to_string())),
            None => (origin.clone(), None),
        })
        .collect();

    CorsLayer::new().allow_methods(tower_http::cors::Any).allow_headers(tower_http::cors::Any).allow_origin(
        AllowOrigin::predicate(move |origin, _| {
            let Ok(origin) = origin.to_str() else { return false };
            patterns.iter().any(|(prefix, wildcard)| match wildcard {
                Some(_) => origin.starts_with(prefix.as_str()),
                None => origin == prefix,
            })
        }),
    )
}
