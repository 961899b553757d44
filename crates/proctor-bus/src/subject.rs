//! NATS subject layout for room events.
//!
//! Events for one room publish on `exam.events.{exam_id}`, with the
//! identifier sanitized to fit NATS subject grammar (no dots, spaces,
//! or wildcards inside a token). The fanout loop subscribes to the
//! wildcard `exam.events.>`. Receivers never parse the identifier back
//! out of the subject -- the payload carries it.

use proctor_types::ExamId;

/// Prefix of every room event subject.
pub const EVENTS_PREFIX: &str = "exam.events.";

/// Wildcard matching every room event subject.
pub const EVENTS_WILDCARD: &str = "exam.events.>";

/// The subject on which events for `exam_id` are published.
pub fn events_subject(exam_id: &ExamId) -> String {
    format!("{EVENTS_PREFIX}{}", sanitize(exam_id.as_str()))
}

/// Replace characters that NATS subject tokens cannot carry.
///
/// Exam identifiers are opaque strings from the upstream platform, so
/// dots, spaces, and wildcard characters must be neutralized before
/// they become part of a subject. Distinct identifiers can in theory
/// collapse to the same subject; that only widens delivery, and
/// receivers filter on the payload's identifier anyway.
fn sanitize(id: &str) -> String {
    id.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}
