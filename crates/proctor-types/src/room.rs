//! The persisted exam room record.
//!
//! [`ExamRoom`] is the sole entity stored in the shared state store:
//! one JSON value per exam identifier. Absence of a record means the
//! exam has not started, or has finished and been cleared.
//!
//! # Invariants
//!
//! - `is_running` and `is_finished` are never simultaneously true.
//! - `0 <= time_left <= duration`.
//! - `time_left` only decreases while the room is running.
//!
//! Transition helpers here only manipulate the record in memory; the
//! coordinator is responsible for performing them inside a lock-held
//! critical section and persisting the result.

use serde::{Deserialize, Serialize};

use crate::ids::ExamId;

/// The countdown state of one exam, keyed by its identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExamRoom {
    /// The exam identifier; also the store key and lock resource key.
    pub exam_id: ExamId,
    /// Opaque subject label shown to clients.
    #[serde(default)]
    pub subject: String,
    /// Total exam length in seconds, immutable after creation.
    pub duration: u64,
    /// Seconds remaining on the countdown.
    pub time_left: u64,
    /// Whether the countdown is currently advancing.
    pub is_running: bool,
    /// Whether the countdown reached zero.
    pub is_finished: bool,
}

impl ExamRoom {
    /// Create a freshly started room: full countdown, running.
    pub fn fresh(exam_id: ExamId, subject: impl Into<String>, duration: u64) -> Self {
        Self {
            exam_id,
            subject: subject.into(),
            duration,
            time_left: duration,
            is_running: true,
            is_finished: false,
        }
    }

    /// Mark the room paused. The countdown freezes at `time_left`.
    pub const fn pause(&mut self) {
        self.is_running = false;
    }

    /// Mark the room running again, keeping the current `time_left`.
    pub const fn resume(&mut self) {
        self.is_running = true;
        self.is_finished = false;
    }

    /// Restore the full countdown and stop the clock.
    pub const fn reset(&mut self) {
        self.time_left = self.duration;
        self.is_running = false;
        self.is_finished = false;
    }

    /// Mark the room finished: clock stopped, countdown exhausted.
    pub const fn finish(&mut self) {
        self.time_left = 0;
        self.is_running = false;
        self.is_finished = true;
    }

    /// Decrement the countdown by one second, saturating at zero.
    ///
    /// Returns the new `time_left`.
    pub const fn tick_down(&mut self) -> u64 {
        self.time_left = self.time_left.saturating_sub(1);
        self.time_left
    }

    /// Check the record against the data-model invariants.
    ///
    /// Used by tests to assert that no operation sequence can produce
    /// an inconsistent record.
    pub const fn is_consistent(&self) -> bool {
        !(self.is_running && self.is_finished) && self.time_left <= self.duration
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn room() -> ExamRoom {
        ExamRoom::fresh(ExamId::new("exam-1"), "algebra", 600)
    }

    #[test]
    fn fresh_room_is_running_with_full_countdown() {
        let r = room();
        assert!(r.is_running);
        assert!(!r.is_finished);
        assert_eq!(r.time_left, 600);
        assert!(r.is_consistent());
    }

    #[test]
    fn pause_and_resume_keep_time_left() {
        let mut r = room();
        r.time_left = 312;
        r.pause();
        assert!(!r.is_running);
        assert_eq!(r.time_left, 312);
        r.resume();
        assert!(r.is_running);
        assert_eq!(r.time_left, 312);
        assert!(r.is_consistent());
    }

    #[test]
    fn reset_restores_full_duration() {
        let mut r = room();
        r.time_left = 17;
        r.reset();
        assert_eq!(r.time_left, 600);
        assert!(!r.is_running);
        assert!(r.is_consistent());
    }

    #[test]
    fn finish_never_overlaps_running() {
        let mut r = room();
        r.finish();
        assert!(r.is_finished);
        assert!(!r.is_running);
        assert_eq!(r.time_left, 0);
        assert!(r.is_consistent());
    }

    #[test]
    fn tick_down_saturates_at_zero() {
        let mut r = room();
        r.time_left = 1;
        assert_eq!(r.tick_down(), 0);
        assert_eq!(r.tick_down(), 0);
        assert!(r.is_consistent());
    }

    #[test]
    fn wire_format_is_camel_cased() {
        let json = serde_json::to_value(room()).expect("serialize failed");
        assert!(json.get("examId").is_some());
        assert!(json.get("timeLeft").is_some());
        assert!(json.get("isRunning").is_some());
        assert!(json.get("isFinished").is_some());
    }
}
