//! Cross-instance room transition notifications.
//!
//! Every state transition a coordinator performs is broadcast to all
//! service instances as a [`RoomEvent`]. Delivery is at-least-once and
//! unordered across rooms, so each event carries a **full**
//! [`ExamRoom`] snapshot rather than a delta: a receiver that sees an
//! event twice, or out of order, still ends up holding the latest
//! state it has observed. Handlers must be idempotent.
//!
//! The serialized `kind` values are the action names existing exam
//! dashboard clients already speak.

use serde::{Deserialize, Serialize};

use crate::room::ExamRoom;

/// The kind of room transition an event describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventKind {
    /// Snapshot of a room that already exists, sent to a joining client.
    #[serde(rename = "existingExam")]
    Existing,
    /// The room was created or resumed.
    #[serde(rename = "examStarted")]
    Started,
    /// The countdown was paused.
    #[serde(rename = "examPaused")]
    Paused,
    /// The room was reset and cleared.
    #[serde(rename = "examReset")]
    Reset,
    /// One second elapsed on a running countdown.
    #[serde(rename = "examTimerUpdate")]
    TimerTick,
    /// The countdown reached zero and the room was cleared.
    #[serde(rename = "examFinished")]
    Finished,
}

impl EventKind {
    /// The wire name of this event kind.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Existing => "existingExam",
            Self::Started => "examStarted",
            Self::Paused => "examPaused",
            Self::Reset => "examReset",
            Self::TimerTick => "examTimerUpdate",
            Self::Finished => "examFinished",
        }
    }
}

impl core::fmt::Display for EventKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A room transition notification carried over the event bus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomEvent {
    /// Which transition occurred.
    pub kind: EventKind,
    /// Full snapshot of the room at the moment of transition.
    pub room: ExamRoom,
}

impl RoomEvent {
    /// Bundle a transition kind with the room snapshot it produced.
    pub const fn new(kind: EventKind, room: ExamRoom) -> Self {
        Self { kind, room }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::ids::ExamId;

    #[test]
    fn kind_uses_dashboard_action_names() {
        let json = serde_json::to_string(&EventKind::TimerTick).expect("serialize failed");
        assert_eq!(json, "\"examTimerUpdate\"");
        let json = serde_json::to_string(&EventKind::Finished).expect("serialize failed");
        assert_eq!(json, "\"examFinished\"");
    }

    #[test]
    fn event_round_trips_with_full_snapshot() {
        let event = RoomEvent::new(
            EventKind::Started,
            ExamRoom::fresh(ExamId::new("exam-7"), "history", 90),
        );
        let json = serde_json::to_string(&event).expect("serialize failed");
        let back: RoomEvent = serde_json::from_str(&json).expect("deserialize failed");
        assert_eq!(back, event);
        assert_eq!(back.room.time_left, 90);
    }

    #[test]
    fn display_matches_wire_name() {
        assert_eq!(EventKind::Existing.to_string(), "existingExam");
    }
}
