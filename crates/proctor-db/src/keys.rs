//! Redis key layout.
//!
//! Room state and lock keys live in distinct namespaces so a lock can
//! never clobber the record it guards.

use proctor_types::ExamId;

/// Prefix for room state keys.
pub const ROOM_PREFIX: &str = "exam:";

/// Prefix for lock keys.
pub const LOCK_PREFIX: &str = "timer-lock:";

/// The key holding the serialized room for `exam_id`.
pub fn room_key(exam_id: &ExamId) -> String {
    format!("{ROOM_PREFIX}{exam_id}")
}

/// The key holding the lock token for `exam_id`.
pub fn lock_key(exam_id: &ExamId) -> String {
    format!("{LOCK_PREFIX}{exam_id}")
}
