//! Frame classification.
//!
//! Pure mapping from a raw inbound frame to an [`InboundEvent`]. The rules,
//! in priority order:
//!
//! 1. Absent or unrecognized `type` classifies as `Unknown`; the frame is
//!    never dropped.
//! 2. `message_sent` receipts are distinct from support/chat pushes even
//!    though both may carry a thread snapshot.
//! 3. Every event is created unread, except receipts, which are born read
//!    (your own successful send is not an unread notification to you).
//! 4. Malformed shapes never panic; they degrade to `Unknown` with the
//!    raw payload preserved.

use serde_json::Value;
use tripline_proto::EventKind;

use crate::InboundEvent;

/// Classify one raw frame.
///
/// `fallback_id` and `fallback_timestamp` are used when the frame carries
/// no `id`/`timestamp` of its own; the caller draws them from its
/// [`crate::Environment`] so this function stays pure.
#[must_use]
pub fn classify(frame: Value, fallback_id: String, fallback_timestamp: u64) -> InboundEvent {
    let kind = frame
        .get("type")
        .and_then(Value::as_str)
        .map_or(EventKind::Unknown, EventKind::from_wire);

    let id = frame
        .get("id")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map_or(fallback_id, str::to_owned);

    let timestamp = frame.get("timestamp").and_then(Value::as_u64).unwrap_or(fallback_timestamp);

    InboundEvent { id, kind, data: frame, timestamp, read: kind == EventKind::MessageSent }
}
