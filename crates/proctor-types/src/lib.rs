//! Shared data model for the Proctor exam timer service.
//!
//! This crate defines the types that flow between every layer of the
//! system: the persisted [`ExamRoom`] record, the [`RoomEvent`]
//! notifications fanned out across instances, and the request payloads
//! accepted from connected clients. Serde renames keep the JSON wire
//! format camel-cased so existing exam dashboards keep working.
//!
//! # Modules
//!
//! - [`ids`] -- the [`ExamId`] identifier newtype
//! - [`room`] -- the persisted [`ExamRoom`] record and its transitions
//! - [`events`] -- cross-instance [`RoomEvent`] notifications
//! - [`requests`] -- client-facing start/restart payloads

pub mod events;
pub mod ids;
pub mod requests;
pub mod room;

pub use events::{EventKind, RoomEvent};
pub use ids::ExamId;
pub use requests::{RestartRequest, StartRequest};
pub use room::ExamRoom;
