//! Shared application state for the gateway.
//!
//! [`AppState`] holds the coordinator handle and one broadcast channel
//! per room for local fanout: the bus pump pushes every received
//! [`RoomEvent`] in, and each `WebSocket` connection watching that
//! room holds a receiver. Relaying is verbatim -- events carry full
//! snapshots, so delivering one twice leaves a client in the same
//! state as delivering it once.

use std::collections::HashMap;
use std::sync::Arc;

use proctor_core::RoomCoordinator;
use proctor_types::{ExamId, RoomEvent};
use tokio::sync::{broadcast, RwLock};
use tracing::debug;

/// Capacity of each per-room broadcast channel.
///
/// A subscriber that falls behind by more than this many events
/// receives a [`broadcast::error::RecvError::Lagged`] and skips to the
/// newest snapshot, which is always safe to render.
const BROADCAST_CAPACITY: usize = 256;

/// Gateway-wide shared state.
pub struct AppState {
    coordinator: Arc<RoomCoordinator>,
    rooms: RwLock<HashMap<ExamId, broadcast::Sender<RoomEvent>>>,
}

impl AppState {
    /// Create the state around a coordinator handle.
    pub fn new(coordinator: Arc<RoomCoordinator>) -> Self {
        Self {
            coordinator,
            rooms: RwLock::new(HashMap::new()),
        }
    }

    /// The coordinator serving this instance.
    pub const fn coordinator(&self) -> &Arc<RoomCoordinator> {
        &self.coordinator
    }

    /// Subscribe to events for one room, creating its channel if this
    /// is the first local watcher.
    pub async fn subscribe(&self, exam_id: &ExamId) -> broadcast::Receiver<RoomEvent> {
        let mut rooms = self.rooms.write().await;
        rooms
            .entry(exam_id.clone())
            .or_insert_with(|| broadcast::channel(BROADCAST_CAPACITY).0)
            .subscribe()
    }

    /// Relay one bus event to every client watching its room here.
    ///
    /// Rooms nobody watches locally are skipped; a channel whose last
    /// receiver disconnected is pruned on the way.
    pub async fn fanout(&self, event: &RoomEvent) {
        let exam_id = &event.room.exam_id;
        let mut rooms = self.rooms.write().await;
        let Some(sender) = rooms.get(exam_id) else {
            return;
        };
        match sender.send(event.clone()) {
            Ok(receivers) => {
                debug!(exam_id = %exam_id, kind = %event.kind, receivers, "event fanned out");
            }
            Err(_) => {
                rooms.remove(exam_id);
                debug!(exam_id = %exam_id, "no watchers left, channel pruned");
            }
        }
    }

    /// Number of rooms with at least one local watcher. Test helper.
    pub async fn watched_rooms(&self) -> usize {
        self.rooms.read().await.len()
    }
}

impl core::fmt::Debug for AppState {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AppState").finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use std::time::Duration;

    use proctor_core::memory::{MemoryBus, MemoryLock, MemoryStore};
    use proctor_core::ports::RoomStore;
    use proctor_types::{EventKind, ExamRoom};

    use super::*;

    fn state() -> AppState {
        let coordinator = RoomCoordinator::with_tick_period(
            Arc::new(MemoryStore::new()) as Arc<dyn RoomStore>,
            Arc::new(MemoryLock::default()),
            Arc::new(MemoryBus::new()),
            Duration::from_secs(3600),
        );
        AppState::new(coordinator)
    }

    fn tick_event(time_left: u64) -> RoomEvent {
        RoomEvent::new(
            EventKind::TimerTick,
            ExamRoom {
                exam_id: ExamId::new("exam-fan"),
                subject: String::new(),
                duration: 60,
                time_left,
                is_running: true,
                is_finished: false,
            },
        )
    }

    #[tokio::test]
    async fn fanout_reaches_all_room_watchers() {
        let state = state();
        let exam_id = ExamId::new("exam-fan");
        let mut a = state.subscribe(&exam_id).await;
        let mut b = state.subscribe(&exam_id).await;

        state.fanout(&tick_event(59)).await;

        assert_eq!(a.recv().await.expect("recv failed"), tick_event(59));
        assert_eq!(b.recv().await.expect("recv failed"), tick_event(59));
    }

    #[tokio::test]
    async fn duplicate_delivery_is_idempotent() {
        let state = state();
        let mut rx = state.subscribe(&ExamId::new("exam-fan")).await;

        // At-least-once delivery: the same bus message arrives twice.
        state.fanout(&tick_event(30)).await;
        state.fanout(&tick_event(30)).await;

        let first = rx.recv().await.expect("recv failed");
        let second = rx.recv().await.expect("recv failed");
        // The client-visible state after two deliveries is the same
        // snapshot as after one.
        assert_eq!(first, second);
        assert_eq!(second.room.time_left, 30);
    }

    #[tokio::test]
    async fn unwatched_rooms_are_skipped() {
        let state = state();
        // No subscription for this room; fanout must be a no-op.
        state.fanout(&tick_event(10)).await;
        assert_eq!(state.watched_rooms().await, 0);
    }

    #[tokio::test]
    async fn channel_is_pruned_after_last_watcher_leaves() {
        let state = state();
        let exam_id = ExamId::new("exam-fan");
        let rx = state.subscribe(&exam_id).await;
        assert_eq!(state.watched_rooms().await, 1);

        drop(rx);
        state.fanout(&tick_event(5)).await;
        assert_eq!(state.watched_rooms().await, 0);
    }
}
