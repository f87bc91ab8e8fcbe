//! Outbound frame construction.
//!
//! Every outbound operation builds a typed JSON envelope with a
//! client-generated `id` and the current wall-clock timestamp. The caller
//! supplies both (the runtime draws them from its `Environment`); this
//! module stays free of clocks and RNGs.

use serde_json::{Value, json};

use crate::EventKind;

/// Builder for outbound frames.
///
/// One envelope per send; `id` must be unique per frame and `timestamp`
/// is millis since the Unix epoch.
#[derive(Debug, Clone)]
pub struct Envelope {
    id: String,
    timestamp: u64,
}

impl Envelope {
    /// Create an envelope with the given frame id and timestamp.
    #[must_use]
    pub fn new(id: impl Into<String>, timestamp: u64) -> Self {
        Self { id: id.into(), timestamp }
    }

    /// Booking alert for a partner. `payload` lands under `data`.
    #[must_use]
    pub fn booking_notification(&self, payload: Value) -> Value {
        json!({
            "type": EventKind::BookingNotification.as_wire(),
            "id": self.id,
            "timestamp": self.timestamp,
            "data": payload,
        })
    }

    /// Order status change notice.
    #[must_use]
    pub fn order_update(&self, order_id: &str, status: &str, extra: Option<Value>) -> Value {
        let mut frame = json!({
            "type": EventKind::OrderUpdate.as_wire(),
            "id": self.id,
            "timestamp": self.timestamp,
            "orderId": order_id,
            "status": status,
        });
        if let (Some(extra), Some(obj)) = (extra, frame.as_object_mut()) {
            obj.insert("extra".to_owned(), extra);
        }
        frame
    }

    /// Generic chat text.
    #[must_use]
    pub fn chat_message(&self, text: &str) -> Value {
        json!({
            "type": EventKind::ChatMessage.as_wire(),
            "id": self.id,
            "timestamp": self.timestamp,
            "message": text,
        })
    }

    /// Support line addressed to a partner's thread.
    #[must_use]
    pub fn support_message(&self, to_partner_id: &str, text: &str) -> Value {
        json!({
            "type": EventKind::SupportMessage.as_wire(),
            "id": self.id,
            "timestamp": self.timestamp,
            "to": to_partner_id,
            "message": text,
        })
    }
}
