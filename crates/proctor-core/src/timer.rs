//! Per-room timer drivers.
//!
//! A driver is a periodic task, one per room per owning process, that
//! calls [`RoomCoordinator::advance`] once per period until the stored
//! state says to stop. Stopping is always a consequence of observed
//! state (room absent, not running, or finished), never of an external
//! cancel signal -- that makes the driver robust to mutations made by
//! peer instances it knows nothing about.
//!
//! Launch and registration live on the coordinator
//! ([`RoomCoordinator::launch_driver`]), which holds the registry
//! mutex across the whole launch and stamps each driver with a
//! generation; an exiting driver only deregisters its own generation,
//! so a driver that superseded it is never detached by mistake.
//!
//! A failed tick is "try again next period", never fatal: the exam
//! clock's authority is the stored `time_left`, and any future
//! successful tick recovers it. Terminating the driver on error would
//! silently stop the exam clock with nothing to compensate.

use std::sync::Arc;

use proctor_types::ExamId;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::coordinator::{RoomCoordinator, TickOutcome};

/// The driver loop: one locked critical section per period.
pub(crate) async fn run_driver(
    coordinator: Arc<RoomCoordinator>,
    exam_id: ExamId,
    generation: u64,
) {
    info!(exam_id = %exam_id, period = ?coordinator.tick_period(), "timer driver started");

    let mut ticker = tokio::time::interval(coordinator.tick_period());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    // The first interval tick completes immediately; consume it so the
    // countdown first advances a full period after the start.
    ticker.tick().await;

    loop {
        ticker.tick().await;
        match coordinator.advance(&exam_id).await {
            Ok(TickOutcome::Advanced(time_left)) => {
                debug!(exam_id = %exam_id, time_left, "tick");
            }
            Ok(TickOutcome::Finished) => {
                info!(exam_id = %exam_id, "countdown finished, driver exiting");
                break;
            }
            Ok(TickOutcome::Stopped) => {
                info!(exam_id = %exam_id, "room stopped or cleared, driver exiting");
                break;
            }
            Err(e) => {
                // Lock contention or a store hiccup on one tick; the
                // next period reads fresh state and tries again.
                warn!(exam_id = %exam_id, error = %e, "tick failed, retrying next period");
            }
        }
    }

    coordinator.detach_driver(&exam_id, generation).await;
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use std::time::Duration;

    use proctor_types::{RestartRequest, StartRequest};

    use crate::memory::{MemoryBus, MemoryLock, MemoryStore};
    use crate::ports::RoomStore;

    use super::*;

    fn setup() -> (Arc<RoomCoordinator>, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let coordinator = RoomCoordinator::new(
            Arc::clone(&store) as Arc<dyn RoomStore>,
            Arc::new(MemoryLock::default()),
            Arc::new(MemoryBus::new()),
        );
        (coordinator, store)
    }

    fn request(exam_id: &str, duration: u64) -> StartRequest {
        StartRequest {
            exam_id: ExamId::new(exam_id),
            duration,
            time_left: None,
            subject: None,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn driver_counts_down_and_clears_the_room() {
        let (coordinator, store) = setup();
        let exam_id = ExamId::new("exam-drv");
        coordinator
            .start(request("exam-drv", 3))
            .await
            .expect("start failed");
        assert!(coordinator.has_driver(&exam_id).await);

        // Virtual time: the driver ticks once per second and needs a
        // little slack to run its final cleanup.
        tokio::time::sleep(Duration::from_secs(5)).await;

        assert!(store.is_empty().await, "driver must clear a finished room");
        assert!(!coordinator.has_driver(&exam_id).await);
    }

    #[tokio::test(start_paused = true)]
    async fn driver_stops_when_room_is_paused() {
        let (coordinator, store) = setup();
        let exam_id = ExamId::new("exam-drv2");
        coordinator
            .start(request("exam-drv2", 600))
            .await
            .expect("start failed");

        tokio::time::sleep(Duration::from_millis(2500)).await;
        coordinator.pause(&exam_id).await.expect("pause failed");
        // The driver observes is_running == false on its next tick.
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(!coordinator.has_driver(&exam_id).await);

        let frozen = store
            .get_room(&exam_id)
            .await
            .expect("store read failed")
            .expect("room missing")
            .time_left;
        tokio::time::sleep(Duration::from_secs(3)).await;
        let later = store
            .get_room(&exam_id)
            .await
            .expect("store read failed")
            .expect("room missing")
            .time_left;
        assert_eq!(frozen, later, "paused countdown must not advance");
    }

    #[tokio::test(start_paused = true)]
    async fn relaunch_supersedes_the_registered_driver() {
        let (coordinator, _store) = setup();
        let exam_id = ExamId::new("exam-drv3");
        coordinator
            .start(request("exam-drv3", 600))
            .await
            .expect("start failed");
        assert!(coordinator.launch_driver(exam_id.clone()).await);
        assert!(coordinator.has_driver(&exam_id).await);
        coordinator.abort_drivers().await;
        assert!(!coordinator.has_driver(&exam_id).await);
    }

    #[tokio::test(start_paused = true)]
    async fn restart_after_driver_exit_relaunches_the_clock() {
        let (coordinator, store) = setup();
        let exam_id = ExamId::new("exam-drv4");
        coordinator
            .start(request("exam-drv4", 600))
            .await
            .expect("start failed");

        coordinator.pause(&exam_id).await.expect("pause failed");
        // Let the driver observe the pause, exit, and deregister.
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(!coordinator.has_driver(&exam_id).await);

        coordinator
            .restart(RestartRequest {
                exam_id: exam_id.clone(),
                duration: 600,
                time_left: 600,
                subject: String::new(),
            })
            .await
            .expect("restart failed");
        assert!(coordinator.has_driver(&exam_id).await);

        tokio::time::sleep(Duration::from_millis(2500)).await;
        let time_left = store
            .get_room(&exam_id)
            .await
            .expect("store read failed")
            .expect("room missing")
            .time_left;
        assert_eq!(time_left, 598, "restarted countdown must advance");
    }

    #[tokio::test(start_paused = true)]
    async fn restart_over_a_live_driver_keeps_a_single_clock() {
        let (coordinator, store) = setup();
        let exam_id = ExamId::new("exam-drv5");
        coordinator
            .start(request("exam-drv5", 600))
            .await
            .expect("start failed");
        tokio::time::sleep(Duration::from_millis(2500)).await;

        // The running driver is superseded, never doubled: after the
        // restart the countdown advances once per period, not twice.
        coordinator
            .restart(RestartRequest {
                exam_id: exam_id.clone(),
                duration: 600,
                time_left: 600,
                subject: String::new(),
            })
            .await
            .expect("restart failed");
        assert!(coordinator.has_driver(&exam_id).await);

        tokio::time::sleep(Duration::from_millis(3600)).await;
        let time_left = store
            .get_room(&exam_id)
            .await
            .expect("store read failed")
            .expect("room missing")
            .time_left;
        assert_eq!(time_left, 597, "exactly one driver may advance the clock");
    }
}
