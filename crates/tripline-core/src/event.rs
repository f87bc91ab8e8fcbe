//! Classified inbound events.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tripline_proto::EventKind;

/// One classified inbound frame.
///
/// Events are immutable once created except for the `read` flag, which
/// only flips through [`crate::MessageStore::mark_read`]. The store keeps
/// them in arrival order; arrival order is the only ordering guarantee.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundEvent {
    /// Unique event id. Server-assigned when present on the frame,
    /// client-generated otherwise.
    pub id: String,
    /// Typed classification of the frame.
    pub kind: EventKind,
    /// Raw frame payload, preserved verbatim for diagnostics and for
    /// type-specific formatters.
    pub data: Value,
    /// Event time in millis since the Unix epoch, server-assigned when
    /// present on the frame.
    pub timestamp: u64,
    /// Whether the user has seen this event. Send receipts are born read.
    pub read: bool,
}
