//! Client-facing mutation payloads.
//!
//! These mirror the JSON bodies the gateway accepts from connected
//! exam clients. Start allows `time_left` to be omitted (a fresh room
//! begins with the full duration); restart always carries the complete
//! room description because it overwrites whatever is stored.

use serde::{Deserialize, Serialize};

use crate::ids::ExamId;

/// Payload for `start`: create the room if absent, otherwise resume it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartRequest {
    /// The exam to start or resume.
    pub exam_id: ExamId,
    /// Total exam length in seconds.
    pub duration: u64,
    /// Countdown to begin from; defaults to `duration` for a new room.
    #[serde(default)]
    pub time_left: Option<u64>,
    /// Subject label for a newly created room.
    #[serde(default)]
    pub subject: Option<String>,
}

impl StartRequest {
    /// The countdown a newly created room should begin from.
    ///
    /// Capped at `duration`: a payload claiming more time remaining
    /// than the exam is long must not produce a record where
    /// `time_left > duration`.
    pub fn initial_time_left(&self) -> u64 {
        self.time_left.unwrap_or(self.duration).min(self.duration)
    }
}

/// Payload for `restart`: overwrite the room and run it from `time_left`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RestartRequest {
    /// The exam to restart.
    pub exam_id: ExamId,
    /// Total exam length in seconds.
    pub duration: u64,
    /// Countdown to run from.
    pub time_left: u64,
    /// Subject label.
    #[serde(default)]
    pub subject: String,
}

impl RestartRequest {
    /// The countdown to run from, capped at `duration`.
    pub const fn initial_time_left(&self) -> u64 {
        if self.time_left > self.duration {
            self.duration
        } else {
            self.time_left
        }
    }
}
