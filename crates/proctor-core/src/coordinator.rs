//! The room lifecycle state machine.
//!
//! [`RoomCoordinator`] serializes every mutation of a room under its
//! distributed lock, persists the result to the shared store, and
//! publishes the transition on the event bus. The states are Absent,
//! Running, Paused, and Finished; Finished is terminal and is
//! immediately followed by deletion back to Absent.
//!
//! | Operation  | Precondition       | Effect                                        | Emits     |
//! |------------|--------------------|-----------------------------------------------|-----------|
//! | start      | Absent             | create room, launch driver                    | Started   |
//! | start      | Paused / Running   | resume, keep `time_left`                      | Started   |
//! | restart    | any                | overwrite room, run, launch driver            | Started   |
//! | pause      | Running            | stop the clock                                | Paused    |
//! | reset      | any (even Absent)  | restore full countdown, then delete           | Reset     |
//! | advance    | Running, left > 1  | decrement, persist                            | TimerTick |
//! | advance    | Running, left <= 1 | finish, publish, delete                       | Finished  |
//! | join       | any                | none (read-only snapshot for the new client)  | --        |
//!
//! Publish failures never fail an operation: by the time the
//! coordinator publishes, the store already holds the authoritative
//! state, so a lost event only delays peers until the next tick
//! publishes a fresh snapshot.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use proctor_types::{
    EventKind, ExamId, ExamRoom, RestartRequest, RoomEvent, StartRequest,
};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::error::CoordinatorError;
use crate::ports::{EventPublisher, LockToken, RoomLock, RoomStore};
use crate::timer;

/// Default timer period: the countdown advances once per second.
pub const DEFAULT_TICK_PERIOD: Duration = Duration::from_secs(1);

/// What one timer tick observed and did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// The countdown was decremented; the new `time_left` is carried.
    Advanced(u64),
    /// The countdown reached zero; the room was published and cleared.
    Finished,
    /// The room is absent or not running; nothing was mutated.
    Stopped,
}

/// One registered timer driver: its task handle plus the generation
/// it was launched under, so an exiting driver can never remove the
/// registry entry of a driver that superseded it.
struct DriverSlot {
    generation: u64,
    handle: JoinHandle<()>,
}

/// Coordinates all mutations of exam rooms on this service instance.
///
/// Cheap to share: hold it in an [`Arc`] (the constructors already
/// return one, since the timer drivers it launches keep their own
/// handle to it).
pub struct RoomCoordinator {
    store: Arc<dyn RoomStore>,
    lock: Arc<dyn RoomLock>,
    bus: Arc<dyn EventPublisher>,
    /// Timer drivers running in this process, keyed by exam. At most
    /// one per room per instance.
    drivers: Mutex<HashMap<ExamId, DriverSlot>>,
    /// Monotonic counter stamping each driver launch.
    driver_generation: AtomicU64,
    tick_period: Duration,
}

impl RoomCoordinator {
    /// Create a coordinator that ticks rooms once per second.
    pub fn new(
        store: Arc<dyn RoomStore>,
        lock: Arc<dyn RoomLock>,
        bus: Arc<dyn EventPublisher>,
    ) -> Arc<Self> {
        Self::with_tick_period(store, lock, bus, DEFAULT_TICK_PERIOD)
    }

    /// Create a coordinator with an explicit timer period.
    ///
    /// Tests use a long period and call [`advance`](Self::advance)
    /// directly to step the state machine without wall-clock time.
    pub fn with_tick_period(
        store: Arc<dyn RoomStore>,
        lock: Arc<dyn RoomLock>,
        bus: Arc<dyn EventPublisher>,
        tick_period: Duration,
    ) -> Arc<Self> {
        Arc::new(Self {
            store,
            lock,
            bus,
            drivers: Mutex::new(HashMap::new()),
            driver_generation: AtomicU64::new(0),
            tick_period,
        })
    }

    /// The period between timer ticks for drivers on this instance.
    pub const fn tick_period(&self) -> Duration {
        self.tick_period
    }

    /// Read-only snapshot of a room for a joining client.
    ///
    /// No lock is taken: nothing is mutated, and the caller only needs
    /// the latest state the store will admit to. Returns `None` when
    /// the room has not started (or has finished and been cleared).
    pub async fn join(&self, exam_id: &ExamId) -> Result<Option<ExamRoom>, CoordinatorError> {
        let room = self.store.get_room(exam_id).await?;
        debug!(exam_id = %exam_id, found = room.is_some(), "join snapshot read");
        Ok(room)
    }

    /// Create the room if absent, otherwise resume it.
    ///
    /// A timer driver is launched only when this instance performed
    /// the Absent -> Running transition; a room already marked running
    /// is treated as already active elsewhere and advances there.
    pub async fn start(
        self: &Arc<Self>,
        request: StartRequest,
    ) -> Result<ExamRoom, CoordinatorError> {
        let exam_id = request.exam_id.clone();
        let token = self.acquire(&exam_id).await?;
        let result = self.start_locked(&request).await;
        self.release(token).await;
        let (room, already_active) = result?;

        if already_active {
            debug!(exam_id = %exam_id, "room already running, not launching a driver");
        } else {
            self.launch_driver(exam_id).await;
        }
        Ok(room)
    }

    async fn start_locked(
        &self,
        request: &StartRequest,
    ) -> Result<(ExamRoom, bool), CoordinatorError> {
        match self.store.get_room(&request.exam_id).await? {
            None => {
                let mut room = ExamRoom::fresh(
                    request.exam_id.clone(),
                    request.subject.clone().unwrap_or_default(),
                    request.duration,
                );
                room.time_left = request.initial_time_left();
                self.store.set_room(&room).await?;
                info!(exam_id = %room.exam_id, duration = room.duration, "room created and started");
                self.publish(EventKind::Started, &room).await;
                Ok((room, false))
            }
            Some(mut room) => {
                let already_active = room.is_running;
                room.resume();
                // A countdown stuck at zero restarts from the request,
                // capped at the stored room's duration.
                if room.time_left == 0 {
                    room.time_left = request.initial_time_left().min(room.duration);
                }
                self.store.set_room(&room).await?;
                info!(
                    exam_id = %room.exam_id,
                    time_left = room.time_left,
                    already_active,
                    "room resumed"
                );
                self.publish(EventKind::Started, &room).await;
                Ok((room, already_active))
            }
        }
    }

    /// Overwrite the room from the request and run it.
    ///
    /// Unlike [`start`](Self::start), restart does not care what was
    /// stored before: the request is the new truth. A fresh driver is
    /// always launched, superseding any driver already registered.
    pub async fn restart(
        self: &Arc<Self>,
        request: RestartRequest,
    ) -> Result<ExamRoom, CoordinatorError> {
        let exam_id = request.exam_id.clone();
        let token = self.acquire(&exam_id).await?;
        let result = self.restart_locked(&request).await;
        self.release(token).await;
        let room = result?;

        self.launch_driver(exam_id).await;
        Ok(room)
    }

    async fn restart_locked(
        &self,
        request: &RestartRequest,
    ) -> Result<ExamRoom, CoordinatorError> {
        let mut room = ExamRoom::fresh(
            request.exam_id.clone(),
            request.subject.clone(),
            request.duration,
        );
        room.time_left = request.initial_time_left();
        self.store.set_room(&room).await?;
        info!(exam_id = %room.exam_id, time_left = room.time_left, "room restarted");
        self.publish(EventKind::Started, &room).await;
        Ok(room)
    }

    /// Stop the countdown, keeping `time_left` where it is.
    ///
    /// # Errors
    ///
    /// Returns [`CoordinatorError::RoomNotFound`] if the room is
    /// absent -- there is nothing to pause.
    pub async fn pause(&self, exam_id: &ExamId) -> Result<ExamRoom, CoordinatorError> {
        let token = self.acquire(exam_id).await?;
        let result = self.pause_locked(exam_id).await;
        self.release(token).await;
        result
    }

    async fn pause_locked(&self, exam_id: &ExamId) -> Result<ExamRoom, CoordinatorError> {
        let Some(mut room) = self.store.get_room(exam_id).await? else {
            return Err(CoordinatorError::RoomNotFound(exam_id.clone()));
        };
        room.pause();
        self.store.set_room(&room).await?;
        info!(exam_id = %exam_id, time_left = room.time_left, "room paused");
        self.publish(EventKind::Paused, &room).await;
        Ok(room)
    }

    /// Restore the full countdown, stop the clock, and clear the room.
    ///
    /// Resetting an absent room is not an error: a `Reset` event
    /// carrying the given identifier is still published so stale
    /// client state anywhere converges to cleared.
    pub async fn reset(&self, exam_id: &ExamId) -> Result<ExamRoom, CoordinatorError> {
        let token = self.acquire(exam_id).await?;
        let result = self.reset_locked(exam_id).await;
        self.release(token).await;
        result
    }

    async fn reset_locked(&self, exam_id: &ExamId) -> Result<ExamRoom, CoordinatorError> {
        match self.store.get_room(exam_id).await? {
            Some(mut room) => {
                room.reset();
                self.store.set_room(&room).await?;
                self.publish(EventKind::Reset, &room).await;
                self.store.delete_room(exam_id).await?;
                info!(exam_id = %exam_id, "room reset and cleared");
                Ok(room)
            }
            None => {
                let cleared = ExamRoom {
                    exam_id: exam_id.clone(),
                    subject: String::new(),
                    duration: 0,
                    time_left: 0,
                    is_running: false,
                    is_finished: false,
                };
                self.publish(EventKind::Reset, &cleared).await;
                info!(exam_id = %exam_id, "reset of absent room, published for convergence");
                Ok(cleared)
            }
        }
    }

    /// Execute one timer tick as a full locked critical section.
    ///
    /// Public so the timer driver (and deterministic tests) can step
    /// the countdown. Idempotent against peers: if another actor
    /// paused, reset, or finished the room since the last tick, this
    /// observes the stored state and reports [`TickOutcome::Stopped`]
    /// rather than erroring.
    pub async fn advance(&self, exam_id: &ExamId) -> Result<TickOutcome, CoordinatorError> {
        let token = self.acquire(exam_id).await?;
        let result = self.advance_locked(exam_id).await;
        self.release(token).await;
        result
    }

    async fn advance_locked(&self, exam_id: &ExamId) -> Result<TickOutcome, CoordinatorError> {
        let Some(mut room) = self.store.get_room(exam_id).await? else {
            return Ok(TickOutcome::Stopped);
        };
        if !room.is_running {
            return Ok(TickOutcome::Stopped);
        }
        if room.time_left == 0 || room.tick_down() == 0 {
            room.finish();
            self.publish(EventKind::Finished, &room).await;
            self.store.delete_room(exam_id).await?;
            info!(exam_id = %exam_id, "countdown finished, room cleared");
            return Ok(TickOutcome::Finished);
        }
        self.store.set_room(&room).await?;
        self.publish(EventKind::TimerTick, &room).await;
        Ok(TickOutcome::Advanced(room.time_left))
    }

    /// Whether a timer driver for this room is running in this process.
    pub async fn has_driver(&self, exam_id: &ExamId) -> bool {
        self.drivers.lock().await.contains_key(exam_id)
    }

    /// Abort every driver on this instance. Called on shutdown; the
    /// stored state remains authoritative, so a peer (or a restart)
    /// picks the countdown back up from `time_left`.
    pub async fn abort_drivers(&self) {
        let mut drivers = self.drivers.lock().await;
        for (exam_id, slot) in drivers.drain() {
            slot.handle.abort();
            debug!(exam_id = %exam_id, "timer driver aborted");
        }
    }

    /// Launch a fresh timer driver for `exam_id` on this instance.
    ///
    /// The registry mutex is held across the check, the spawn, and the
    /// insert, so concurrent launches converge on exactly one driver.
    /// A driver already registered is aborted and superseded rather
    /// than trusted: it may be mid-exit after observing a stop, in
    /// which case relying on it would leave the room with no clock.
    /// Returns whether an old driver was superseded.
    pub(crate) async fn launch_driver(self: &Arc<Self>, exam_id: ExamId) -> bool {
        let mut drivers = self.drivers.lock().await;
        let superseded = if let Some(old) = drivers.remove(&exam_id) {
            old.handle.abort();
            debug!(exam_id = %exam_id, "superseded timer driver aborted");
            true
        } else {
            false
        };

        let generation = self.driver_generation.fetch_add(1, Ordering::Relaxed);
        let task_coordinator = Arc::clone(self);
        let task_exam_id = exam_id.clone();
        let handle = tokio::spawn(async move {
            timer::run_driver(task_coordinator, task_exam_id, generation).await;
        });
        drivers.insert(exam_id, DriverSlot { generation, handle });
        superseded
    }

    /// Remove the registry entry of an exiting driver, unless a newer
    /// launch already superseded it (the generations differ).
    pub(crate) async fn detach_driver(&self, exam_id: &ExamId, generation: u64) {
        let mut drivers = self.drivers.lock().await;
        if drivers
            .get(exam_id)
            .is_some_and(|slot| slot.generation == generation)
        {
            drivers.remove(exam_id);
        }
    }

    async fn acquire(&self, exam_id: &ExamId) -> Result<LockToken, CoordinatorError> {
        self.lock
            .acquire(exam_id)
            .await
            .map_err(|source| CoordinatorError::LockUnavailable {
                exam_id: exam_id.clone(),
                source,
            })
    }

    /// Release a held lock, logging (never propagating) failures: by
    /// this point the critical section's writes are already durable.
    async fn release(&self, token: LockToken) {
        let resource = token.resource.clone();
        if let Err(e) = self.lock.release(token).await {
            warn!(resource = %resource, error = %e, "lock release failed");
        }
    }

    /// Publish a transition, logging (never propagating) failures.
    async fn publish(&self, kind: EventKind, room: &ExamRoom) {
        let event = RoomEvent::new(kind, room.clone());
        if let Err(e) = self.bus.publish(&event).await {
            warn!(
                exam_id = %room.exam_id,
                kind = %kind,
                error = %e,
                "event publish failed, peers catch up on the next published snapshot"
            );
        }
    }
}

impl core::fmt::Debug for RoomCoordinator {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RoomCoordinator")
            .field("tick_period", &self.tick_period)
            .finish_non_exhaustive()
    }
}
