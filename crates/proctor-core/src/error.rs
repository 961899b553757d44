//! Error taxonomy for coordinator operations.
//!
//! Uses `thiserror` for typed errors that surface to the gateway. Two
//! policies are encoded in the types rather than documented away:
//! storage and lock failures abort the operation (after releasing any
//! held lock) and propagate here, while event-bus publish failures do
//! not appear at all -- the authoritative store write has already
//! happened, so a failed publish is a delivery-only degradation that
//! the coordinator logs and absorbs.

use proctor_types::ExamId;

use crate::ports::{LockError, StoreError};

/// Errors that a coordinator operation can surface to its caller.
#[derive(Debug, thiserror::Error)]
pub enum CoordinatorError {
    /// The room lock could not be acquired within the retry budget.
    /// The caller must surface "try again"; it may never proceed
    /// without the lock.
    #[error("could not lock room {exam_id}: {source}")]
    LockUnavailable {
        /// The exam whose lock was contended.
        exam_id: ExamId,
        /// The underlying lock failure.
        source: LockError,
    },

    /// The operation requires a room that does not exist.
    #[error("no room exists for exam {0}")]
    RoomNotFound(ExamId),

    /// The shared state store failed. Client-triggered operations
    /// surface this immediately; the timer driver retries on its next
    /// natural tick instead.
    #[error("store error: {source}")]
    Store {
        /// The underlying store failure.
        #[from]
        source: StoreError,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_exam() {
        let err = CoordinatorError::RoomNotFound(ExamId::new("exam-9"));
        assert_eq!(err.to_string(), "no room exists for exam exam-9");

        let err = CoordinatorError::LockUnavailable {
            exam_id: ExamId::new("exam-9"),
            source: LockError::Unavailable("retries exhausted".to_owned()),
        };
        assert!(err.to_string().contains("exam-9"));
        assert!(err.to_string().contains("retries exhausted"));
    }
}
