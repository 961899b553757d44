//! In-process implementations of the port traits.
//!
//! These back two uses: deterministic tests of the coordinator, and
//! single-node deployments that have no Redis or NATS to talk to (the
//! lock port deliberately admits a conditional-insert implementation
//! for the non-clustered case). They honor the same contracts as the
//! distributed implementations -- bounded jittered retry on the lock,
//! token-checked release, fire-and-forget publication.

use std::collections::HashMap;

use async_trait::async_trait;
use proctor_types::{ExamId, ExamRoom, RoomEvent};
use tokio::sync::{broadcast, Mutex, RwLock};
use uuid::Uuid;

use crate::ports::{
    BusError, EventPublisher, LockConfig, LockError, LockToken, RoomLock, RoomStore, StoreError,
};

/// Capacity of the in-memory event channel.
const BUS_CAPACITY: usize = 256;

/// A [`RoomStore`] backed by a process-local map.
#[derive(Debug, Default)]
pub struct MemoryStore {
    rooms: RwLock<HashMap<ExamId, ExamRoom>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of rooms currently stored. Test helper.
    pub async fn len(&self) -> usize {
        self.rooms.read().await.len()
    }

    /// Whether the store holds no rooms. Test helper.
    pub async fn is_empty(&self) -> bool {
        self.rooms.read().await.is_empty()
    }
}

#[async_trait]
impl RoomStore for MemoryStore {
    async fn get_room(&self, exam_id: &ExamId) -> Result<Option<ExamRoom>, StoreError> {
        Ok(self.rooms.read().await.get(exam_id).cloned())
    }

    async fn set_room(&self, room: &ExamRoom) -> Result<(), StoreError> {
        self.rooms
            .write()
            .await
            .insert(room.exam_id.clone(), room.clone());
        Ok(())
    }

    async fn delete_room(&self, exam_id: &ExamId) -> Result<(), StoreError> {
        self.rooms.write().await.remove(exam_id);
        Ok(())
    }
}

/// A [`RoomLock`] backed by conditional insertion into a local map.
///
/// Suitable for single-process deployments where all mutations funnel
/// through one service instance. Tokens never expire on their own; a
/// crashed critical section in-process means the task holding the
/// token was dropped, and the token value check still protects against
/// double release.
#[derive(Debug)]
pub struct MemoryLock {
    held: Mutex<HashMap<String, String>>,
    config: LockConfig,
}

impl MemoryLock {
    /// Create a lock manager with the given retry tuning.
    pub fn new(config: LockConfig) -> Self {
        Self {
            held: Mutex::new(HashMap::new()),
            config,
        }
    }
}

impl Default for MemoryLock {
    fn default() -> Self {
        Self::new(LockConfig::default())
    }
}

#[async_trait]
impl RoomLock for MemoryLock {
    async fn acquire(&self, exam_id: &ExamId) -> Result<LockToken, LockError> {
        let resource = exam_id.as_str().to_owned();
        let mut attempt: u32 = 0;
        loop {
            {
                let mut held = self.held.lock().await;
                if !held.contains_key(&resource) {
                    let value = Uuid::new_v4().to_string();
                    held.insert(resource.clone(), value.clone());
                    return Ok(LockToken { resource, value });
                }
            }
            if attempt >= self.config.retry_count {
                return Err(LockError::Unavailable(format!(
                    "retries exhausted for {resource}"
                )));
            }
            attempt = attempt.saturating_add(1);
            tokio::time::sleep(self.config.retry_pause()).await;
        }
    }

    async fn release(&self, token: LockToken) -> Result<(), LockError> {
        let mut held = self.held.lock().await;
        match held.get(&token.resource) {
            Some(value) if *value == token.value => {
                held.remove(&token.resource);
                Ok(())
            }
            Some(_) => Err(LockError::Lost(format!(
                "lock {} was re-acquired by another actor",
                token.resource
            ))),
            None => Err(LockError::Lost(format!(
                "lock {} is no longer held",
                token.resource
            ))),
        }
    }
}

/// An [`EventPublisher`] backed by a tokio broadcast channel.
///
/// Subscribers that fall behind skip ahead, mirroring the lossy
/// at-least-once character of the real bus closely enough for tests.
#[derive(Debug)]
pub struct MemoryBus {
    sender: broadcast::Sender<RoomEvent>,
}

impl MemoryBus {
    /// Create a bus with the default channel capacity.
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(BUS_CAPACITY);
        Self { sender }
    }

    /// Subscribe to every event published after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<RoomEvent> {
        self.sender.subscribe()
    }
}

impl Default for MemoryBus {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EventPublisher for MemoryBus {
    async fn publish(&self, event: &RoomEvent) -> Result<(), BusError> {
        // A send error only means nobody is subscribed right now.
        let _ = self.sender.send(event.clone());
        Ok(())
    }
}
