//! Axum router construction for the gateway.
//!
//! Assembles the `WebSocket` route and the health probe into a single
//! [`Router`] with CORS middleware enabled -- exam dashboards are
//! served from other origins.

use std::sync::Arc;

use axum::routing::get;
use axum::{Json, Router};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;
use crate::ws;

/// Build the complete Axum router for the gateway.
///
/// Routes:
/// - `GET /health` -- liveness probe
/// - `GET /ws/exam` -- the exam client `WebSocket`
///
/// CORS is configured to allow any origin for development. In
/// production this should be restricted.
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/ws/exam", get(ws::ws_exam))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Liveness probe for orchestrators and load balancers.
async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}
