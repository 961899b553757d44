//! Type-safe identifier wrapper for exam rooms.
//!
//! Exam identifiers are opaque strings minted by the upstream exam
//! platform, not UUIDs generated here. The newtype keeps them from
//! being confused with other strings (subjects, lock tokens, NATS
//! subjects) at compile time. The same identifier doubles as the room
//! state key and the lock resource key, so it is the single handle by
//! which a room is addressed everywhere in the system.

use serde::{Deserialize, Serialize};

/// Unique identifier for one exam room.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExamId(String);

impl ExamId {
    /// Create an identifier from any string-like value.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Return the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume the wrapper and return the inner [`String`].
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl core::fmt::Display for ExamId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for ExamId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for ExamId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn serializes_transparently() {
        let id = ExamId::new("midterm-2026");
        let json = serde_json::to_string(&id).expect("serialize failed");
        assert_eq!(json, "\"midterm-2026\"");
    }

    #[test]
    fn round_trips_through_string() {
        let id = ExamId::from("final-a3");
        assert_eq!(id.as_str(), "final-a3");
        assert_eq!(id.clone().into_inner(), "final-a3");
        assert_eq!(format!("{id}"), "final-a3");
    }
}
