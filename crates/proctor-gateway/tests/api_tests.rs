//! Integration tests for the gateway routes.
//!
//! Tests use Axum's `Router` directly via `tower::ServiceExt` without
//! starting a TCP server. This validates routing and handler wiring
//! without needing a live network connection.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use proctor_core::memory::{MemoryBus, MemoryLock, MemoryStore};
use proctor_core::ports::RoomStore;
use proctor_core::RoomCoordinator;
use proctor_gateway::router::build_router;
use proctor_gateway::state::AppState;
use serde_json::Value;
use tower::ServiceExt;

fn make_test_state() -> Arc<AppState> {
    let coordinator = RoomCoordinator::with_tick_period(
        Arc::new(MemoryStore::new()) as Arc<dyn RoomStore>,
        Arc::new(MemoryLock::default()),
        Arc::new(MemoryBus::new()),
        Duration::from_secs(3600),
    );
    Arc::new(AppState::new(coordinator))
}

async fn body_to_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_health_reports_ok() {
    let router = build_router(make_test_state());

    let response = router
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["status"], "ok");
}

#[tokio::test]
async fn test_ws_route_requires_an_upgrade() {
    let router = build_router(make_test_state());

    // A plain GET without upgrade headers must not 404: the route
    // exists, the handshake is just incomplete.
    let response = router
        .oneshot(Request::get("/ws/exam").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_ne!(response.status(), StatusCode::NOT_FOUND);
    assert!(response.status().is_client_error());
}

#[tokio::test]
async fn test_nonexistent_route_returns_404() {
    let router = build_router(make_test_state());

    let response = router
        .oneshot(
            Request::get("/api/nonexistent")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
