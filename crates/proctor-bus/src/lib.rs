//! NATS pub/sub for cross-instance room events.
//!
//! Every coordinator publishes each room transition on a subject
//! derived from the exam identifier; every instance's fanout loop
//! subscribes to the wildcard and relays matching events to its local
//! clients. Delivery is at-least-once with no replay: subscribers that
//! join late get current state through an explicit room query, not the
//! bus.
//!
//! Ordering across different rooms is not guaranteed, and receivers
//! must not depend on strict ordering even within a room -- every
//! event carries a full snapshot, so handling stays idempotent.
//!
//! # Modules
//!
//! - [`bus`] -- [`NatsBus`], the `EventPublisher` implementation
//! - [`subject`] -- subject layout and identifier sanitizing

pub mod bus;
pub mod subject;

pub use bus::NatsBus;
