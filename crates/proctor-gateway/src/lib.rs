//! Client gateway for the Proctor exam timer.
//!
//! Exam clients hold one `WebSocket` per connection to
//! `GET /ws/exam`, send join/start/pause/reset requests as JSON
//! frames, and receive every room transition as an event frame. The
//! gateway itself is side-effect-free: each request delegates 1:1 to
//! the room coordinator, and outbound frames are verbatim relays of
//! bus events to the clients connected to that room on this instance.
//!
//! # Modules
//!
//! - [`protocol`] -- the JSON frame types exchanged with clients
//! - [`state`] -- shared [`AppState`] and the per-room fanout channels
//! - [`ws`] -- the `WebSocket` connection handler
//! - [`router`] -- Axum route assembly
//! - [`server`] -- HTTP server lifecycle

pub mod protocol;
pub mod router;
pub mod server;
pub mod state;
pub mod ws;

pub use protocol::{ClientRequest, ServerMessage};
pub use server::{start_server, ServerConfig, ServerError};
pub use state::AppState;
