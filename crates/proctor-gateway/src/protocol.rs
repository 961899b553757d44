//! JSON frame types exchanged with connected exam clients.
//!
//! The operation names (`joinExam`, `createAndStartExam`, ...) are the
//! ones existing dashboard clients already send, so those clients keep
//! working unchanged. Inbound frames are tagged with `op`, outbound
//! frames with `type`.

use proctor_types::{ExamId, RestartRequest, RoomEvent, StartRequest};
use serde::{Deserialize, Serialize};

/// A request frame from a connected client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op")]
pub enum ClientRequest {
    /// Watch a room: reply with its current state, then stream events.
    #[serde(rename = "joinExam", rename_all = "camelCase")]
    Join {
        /// The exam to watch.
        exam_id: ExamId,
    },

    /// Create the room if absent, otherwise resume it.
    #[serde(rename = "createAndStartExam")]
    Start(StartRequest),

    /// Overwrite the room and run it.
    #[serde(rename = "restartExam")]
    Restart(RestartRequest),

    /// Stop the countdown.
    #[serde(rename = "pauseExam", rename_all = "camelCase")]
    Pause {
        /// The exam to pause.
        exam_id: ExamId,
    },

    /// Restore the full countdown and clear the room.
    #[serde(rename = "resetExam", rename_all = "camelCase")]
    Reset {
        /// The exam to reset.
        exam_id: ExamId,
    },
}

/// A frame sent to a connected client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ServerMessage {
    /// A room transition, either unicast (join replies) or relayed
    /// from the event bus.
    Event(RoomEvent),

    /// A request failed; the connection stays open.
    Error {
        /// Human-readable description of the failure.
        message: String,
    },
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use proctor_types::{EventKind, ExamRoom};

    use super::*;

    #[test]
    fn join_frame_parses_with_dashboard_op_name() {
        let request: ClientRequest =
            serde_json::from_str(r#"{"op":"joinExam","examId":"exam-42"}"#)
                .expect("parse failed");
        assert_eq!(
            request,
            ClientRequest::Join {
                exam_id: ExamId::new("exam-42")
            }
        );
    }

    #[test]
    fn start_frame_carries_the_request_payload() {
        let request: ClientRequest = serde_json::from_str(
            r#"{"op":"createAndStartExam","examId":"exam-42","duration":3600,"subject":"latin"}"#,
        )
        .expect("parse failed");
        let ClientRequest::Start(start) = request else {
            panic!("expected a start request");
        };
        assert_eq!(start.duration, 3600);
        assert_eq!(start.initial_time_left(), 3600);
        assert_eq!(start.subject.as_deref(), Some("latin"));
    }

    #[test]
    fn unknown_op_is_rejected() {
        let result: Result<ClientRequest, _> =
            serde_json::from_str(r#"{"op":"deleteEverything","examId":"x"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn event_frame_is_tagged_and_flat() {
        let message = ServerMessage::Event(RoomEvent::new(
            EventKind::Paused,
            ExamRoom::fresh(ExamId::new("exam-42"), "latin", 60),
        ));
        let json = serde_json::to_value(&message).expect("serialize failed");
        assert_eq!(json.get("type").and_then(|v| v.as_str()), Some("event"));
        assert_eq!(
            json.get("kind").and_then(|v| v.as_str()),
            Some("examPaused")
        );
        assert!(json.get("room").is_some());
    }

    #[test]
    fn error_frame_round_trips() {
        let message = ServerMessage::Error {
            message: "no room exists for exam exam-42".to_owned(),
        };
        let json = serde_json::to_string(&message).expect("serialize failed");
        let back: ServerMessage = serde_json::from_str(&json).expect("parse failed");
        assert_eq!(back, message);
    }
}
