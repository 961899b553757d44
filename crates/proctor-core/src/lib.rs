//! Room coordination engine for the Proctor exam timer.
//!
//! This crate owns the only part of the system with real invariants:
//! the room lifecycle state machine, the per-room timer driver, and
//! the read-modify-write contract that binds them to the shared state
//! store. It talks to its collaborators exclusively through the port
//! traits in [`ports`], so the same coordinator runs against Redis and
//! NATS in production or against the in-memory implementations in
//! [`memory`] for tests and single-node deployments.
//!
//! # Mutation contract
//!
//! Every mutation of a room follows the same locked critical section:
//!
//! ```text
//! acquire lock(exam_id)
//!     -> read room from store
//!     -> compute next state per the state machine
//!     -> write it back (or delete)
//!     -> publish the transition on the event bus
//! release lock
//! ```
//!
//! The distributed lock linearizes mutations for one exam across all
//! service instances. No room state is cached outside a held lock.
//!
//! # Modules
//!
//! - [`ports`] -- `RoomStore` / `RoomLock` / `EventPublisher` traits
//! - [`coordinator`] -- the [`RoomCoordinator`] state machine
//! - [`timer`] -- the per-room periodic [`timer driver`](timer)
//! - [`memory`] -- in-process implementations of the ports
//! - [`error`] -- the [`CoordinatorError`] taxonomy

pub mod coordinator;
pub mod error;
pub mod memory;
pub mod ports;
pub mod timer;

pub use coordinator::{RoomCoordinator, TickOutcome};
pub use error::CoordinatorError;
pub use ports::{
    BusError, EventPublisher, LockConfig, LockError, LockToken, RoomLock, RoomStore, StoreError,
};
