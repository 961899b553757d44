//! Port traits the coordinator consumes.
//!
//! The coordinator never talks to Redis or NATS directly. It sees
//! three capabilities: a keyed room store, a per-room mutual-exclusion
//! lock, and a fire-and-forget event publisher. Production wires these
//! to `proctor-db` and `proctor-bus`; tests and single-node
//! deployments use [`crate::memory`].
//!
//! Lock acquisition failure always means "cannot proceed right now",
//! never permission to mutate without exclusion. A lock that expires
//! while logically held is an accepted race: its consequence is
//! bounded because every mutation is idempotent on the stored state
//! rather than assuming exclusivity is absolute.

use std::time::Duration;

use async_trait::async_trait;
use proctor_types::{ExamId, ExamRoom, RoomEvent};
use rand::Rng as _;

/// Errors from the shared room state store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The store could not be reached or the operation failed.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// A room record could not be serialized or deserialized.
    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Errors from the mutual-exclusion lock.
#[derive(Debug, thiserror::Error)]
pub enum LockError {
    /// The retry budget was exhausted without acquiring the lock.
    #[error("lock unavailable: {0}")]
    Unavailable(String),

    /// The lock expired or was taken over before release.
    #[error("lock lost: {0}")]
    Lost(String),

    /// The lock backend failed.
    #[error("lock backend error: {0}")]
    Backend(String),
}

/// Errors from the cross-instance event bus.
#[derive(Debug, thiserror::Error)]
pub enum BusError {
    /// The bus could not be reached or the publish failed.
    #[error("bus unavailable: {0}")]
    Unavailable(String),

    /// An event could not be serialized or deserialized.
    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Proof of a held lock, returned by [`RoomLock::acquire`].
///
/// The `value` is a per-acquisition random token; release compares it
/// against the stored value so a lock that expired and was re-acquired
/// by another actor is never deleted out from under them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockToken {
    /// The lock key this token guards.
    pub resource: String,
    /// Random token proving this acquisition.
    pub value: String,
}

/// Tuning for lock acquisition: TTL and bounded jittered retry.
///
/// Defaults: 2 s TTL, 10 retries, 200 ms base delay, up to 50 ms of
/// jitter. The TTL must comfortably exceed
/// a critical section; a tick's read+decrement+write+publish is well
/// under a second.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockConfig {
    /// How long an acquired lock lives before expiring on its own.
    pub ttl: Duration,
    /// How many times to retry acquisition before failing.
    pub retry_count: u32,
    /// Base delay between acquisition attempts.
    pub retry_delay: Duration,
    /// Upper bound of random jitter added to each delay.
    pub retry_jitter: Duration,
}

impl Default for LockConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_millis(2000),
            retry_count: 10,
            retry_delay: Duration::from_millis(200),
            retry_jitter: Duration::from_millis(50),
        }
    }
}

impl LockConfig {
    /// The pause before the next acquisition attempt: base delay plus
    /// random jitter, so colliding instances do not retry in lockstep.
    pub fn retry_pause(&self) -> Duration {
        let jitter_ms = u64::try_from(self.retry_jitter.as_millis()).unwrap_or(u64::MAX);
        let jitter = if jitter_ms == 0 {
            Duration::ZERO
        } else {
            Duration::from_millis(rand::rng().random_range(0..=jitter_ms))
        };
        self.retry_delay.saturating_add(jitter)
    }
}

/// Keyed storage of [`ExamRoom`] records, one per exam identifier.
///
/// No compare-and-swap is assumed; all consistency comes from the
/// [`RoomLock`] serializing access. Implementations must not cache
/// state that could be observed outside a lock-held section.
#[async_trait]
pub trait RoomStore: Send + Sync {
    /// Read the room for `exam_id`, or `None` if absent.
    async fn get_room(&self, exam_id: &ExamId) -> Result<Option<ExamRoom>, StoreError>;

    /// Write the room record, overwriting any previous value.
    async fn set_room(&self, room: &ExamRoom) -> Result<(), StoreError>;

    /// Delete the room record. Deleting an absent room is not an error.
    async fn delete_room(&self, exam_id: &ExamId) -> Result<(), StoreError>;
}

/// Mutual exclusion scoped to one exam identifier.
#[async_trait]
pub trait RoomLock: Send + Sync {
    /// Acquire the lock for `exam_id`, retrying with jittered backoff
    /// up to the configured budget.
    async fn acquire(&self, exam_id: &ExamId) -> Result<LockToken, LockError>;

    /// Release a held lock. Returns [`LockError::Lost`] if the lock
    /// already expired or was acquired by someone else.
    async fn release(&self, token: LockToken) -> Result<(), LockError>;
}

/// Fire-and-forget publication of room transitions to all instances.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Publish one transition event. Delivery is at-least-once.
    async fn publish(&self, event: &RoomEvent) -> Result<(), BusError>;
}
