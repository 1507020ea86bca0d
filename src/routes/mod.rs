pub mod api;
pub mod auth;
pub mod comments;
pub mod extract;
pub mod posts;
pub mod subreddits;
pub mod users;
pub mod vote_routes;

use axum::{extract::State, routing::get, Json, Router};
use serde_json::{json, Value};
use crate::AppState;

pub fn create_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .nest("/api", api::routes())
}

async fn health(State(app_state): State<AppState>) -> Json<Value> {
    let database = app_state.db.health_check().await;
    let cache = app_state.cache.health_check().await;
    if let Err(e) = &cache {
        tracing::warn!(error = %e, "post cache health check failed");
    }

    Json(json!({
        "status": if database.is_ok() && cache.is_ok() { "healthy" } else { "degraded" },
        "service": "link_aggregator",
        "version": env!("CARGO_PKG_VERSION"),
        "storage": {
            "backend": app_state.db.backend(),
            "ok": database.is_ok()
        },
        "cache": {
            "backend": app_state.cache.backend(),
            "ok": cache.is_ok()
        }
    }))
}
