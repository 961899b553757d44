//! Redis-backed shared state for the Proctor exam timer.
//!
//! Redis holds the single source of truth for every room: one JSON
//! value per exam identifier, plus one short-lived lock key per exam
//! that serializes mutations across service instances. This crate
//! implements the `proctor-core` port traits on top of a shared
//! [`fred`] client.
//!
//! # Key Patterns
//!
//! | Pattern | Type | Description |
//! |---------|------|-------------|
//! | `exam:{exam_id}` | JSON | Serialized [`ExamRoom`](proctor_types::ExamRoom) |
//! | `timer-lock:{exam_id}` | String | Lock token guarding the room's mutations |
//!
//! # Modules
//!
//! - [`store`] -- [`RedisStore`], the `RoomStore` implementation
//! - [`lock`] -- [`RedisLock`], the `RoomLock` implementation
//! - [`keys`] -- key layout helpers

pub mod keys;
pub mod lock;
pub mod store;

pub use lock::RedisLock;
pub use store::RedisStore;
