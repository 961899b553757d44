//! `WebSocket` handler for exam clients.
//!
//! Each connection upgrades at `GET /ws/exam`, then speaks the
//! [`protocol`](crate::protocol) frames: requests in, events and
//! errors out. A connection watches at most one room at a time --
//! joining a room subscribes it to that room's local fanout channel,
//! and a later join switches the subscription.
//!
//! Request failures are reported as error frames on the same
//! connection; the socket stays open so the client can retry.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::IntoResponse;
use proctor_types::{EventKind, RoomEvent};
use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::protocol::{ClientRequest, ServerMessage};
use crate::state::AppState;

/// Upgrade an HTTP request to a `WebSocket` connection and begin
/// serving the exam protocol.
///
/// # Route
///
/// `GET /ws/exam`
pub async fn ws_exam(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_ws(socket, state))
}

/// Handle the `WebSocket` lifecycle: dispatch client requests to the
/// coordinator and forward fanned-out room events.
async fn handle_ws(mut socket: WebSocket, state: Arc<AppState>) {
    debug!("WebSocket client connected");

    let mut feed: Option<broadcast::Receiver<RoomEvent>> = None;

    loop {
        tokio::select! {
            // A room event fanned out to the joined room.
            result = recv_event(&mut feed), if feed.is_some() => {
                match result {
                    Ok(event) => {
                        if !send_message(&mut socket, &ServerMessage::Event(event)).await {
                            return;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        debug!(skipped, "WebSocket client lagged, skipping ahead");
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        debug!("fanout channel closed, shutting down WebSocket");
                        return;
                    }
                }
            }
            // A frame from the client.
            msg = socket.recv() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        if !handle_request(&mut socket, &state, &mut feed, text.as_str()).await {
                            return;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        debug!("WebSocket client disconnected");
                        return;
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if socket.send(Message::Pong(data)).await.is_err() {
                            debug!("WebSocket client disconnected (pong failed)");
                            return;
                        }
                    }
                    Some(Err(e)) => {
                        debug!("WebSocket error: {e}");
                        return;
                    }
                    _ => {
                        // Ignore binary and pong frames.
                    }
                }
            }
        }
    }
}

/// Receive from the feed; only polled when a room has been joined.
async fn recv_event(
    feed: &mut Option<broadcast::Receiver<RoomEvent>>,
) -> Result<RoomEvent, broadcast::error::RecvError> {
    match feed.as_mut() {
        Some(rx) => rx.recv().await,
        // Guarded by `feed.is_some()` in the select arm.
        None => std::future::pending().await,
    }
}

/// Parse and dispatch one client frame. Returns `false` when the
/// connection is gone and the handler should exit.
async fn handle_request(
    socket: &mut WebSocket,
    state: &Arc<AppState>,
    feed: &mut Option<broadcast::Receiver<RoomEvent>>,
    text: &str,
) -> bool {
    let request: ClientRequest = match serde_json::from_str(text) {
        Ok(request) => request,
        Err(e) => {
            warn!(error = %e, "unparseable client frame");
            return send_error(socket, format!("invalid request: {e}")).await;
        }
    };

    let coordinator = state.coordinator();
    match request {
        ClientRequest::Join { exam_id } => {
            match coordinator.join(&exam_id).await {
                Ok(Some(room)) => {
                    let existing = ServerMessage::Event(RoomEvent::new(EventKind::Existing, room));
                    if !send_message(socket, &existing).await {
                        return false;
                    }
                }
                Ok(None) => {
                    debug!(exam_id = %exam_id, "join for a room that has not started");
                }
                Err(e) => {
                    return send_error(socket, e.to_string()).await;
                }
            }
            *feed = Some(state.subscribe(&exam_id).await);
            true
        }
        ClientRequest::Start(request) => match coordinator.start(request).await {
            Ok(_) => true,
            Err(e) => send_error(socket, e.to_string()).await,
        },
        ClientRequest::Restart(request) => match coordinator.restart(request).await {
            Ok(_) => true,
            Err(e) => send_error(socket, e.to_string()).await,
        },
        ClientRequest::Pause { exam_id } => match coordinator.pause(&exam_id).await {
            Ok(_) => true,
            Err(e) => send_error(socket, e.to_string()).await,
        },
        ClientRequest::Reset { exam_id } => match coordinator.reset(&exam_id).await {
            Ok(_) => true,
            Err(e) => send_error(socket, e.to_string()).await,
        },
    }
}

/// Send one frame; returns `false` if the client is gone.
async fn send_message(socket: &mut WebSocket, message: &ServerMessage) -> bool {
    let json = match serde_json::to_string(message) {
        Ok(json) => json,
        Err(e) => {
            warn!("failed to serialize server message: {e}");
            return true;
        }
    };
    if socket.send(Message::Text(json.into())).await.is_err() {
        debug!("WebSocket client disconnected (send failed)");
        return false;
    }
    true
}

async fn send_error(socket: &mut WebSocket, message: String) -> bool {
    warn!(reason = %message, "request failed");
    send_message(socket, &ServerMessage::Error { message }).await
}
