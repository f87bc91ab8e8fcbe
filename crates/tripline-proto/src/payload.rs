//! Typed payload views over raw JSON frames.
//!
//! [`Payload::from_value`] is total: any frame that does not match a known
//! shape comes back as [`Payload::Unknown`] with the raw value preserved.
//! Callers never lose a frame to a parse mismatch.
//!
//! Support pushes arrive in two wire shapes - a structured one
//! (`ticketId`/`from`/`message`/`updatedContent`) and a legacy flat one
//! (`sender`/`receiver`/`content`/`createdAt`). Both normalize to one
//! canonical [`SupportUpdate`] here; the shape duality never propagates
//! past this boundary.

use serde::Deserialize;
use serde_json::Value;

use crate::EventKind;

/// New booking alert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookingNotification {
    /// Customer the booking was placed by, when the server supplied it.
    pub customer_name: Option<String>,
}

/// Order status change.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderUpdate {
    /// Order the update refers to.
    pub order_id: String,
    /// New status value.
    pub status: String,
    /// Optional extra detail supplied by the server.
    #[serde(default)]
    pub extra: Option<Value>,
}

/// Operator broadcast.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SystemMessage {
    /// Broadcast text.
    pub message: String,
}

/// Generic chat push.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ChatMessage {
    /// Chat text.
    pub message: String,
}

/// Channel-level error notice.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ChannelNotice {
    /// Error description from the server.
    pub message: String,
}

/// Canonical support-thread push, normalized from either wire shape.
///
/// `lines` is always the full thread snapshot to date for `ticket_id`;
/// consumers replace their view wholesale, never patch incrementally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupportUpdate {
    /// Thread key. Legacy pushes carry no ticket id, so the sender id
    /// serves as the key there.
    pub ticket_id: String,
    /// Author of the newest line, when the server supplied it.
    pub from: Option<String>,
    /// Newest line text, when the server supplied it.
    pub message: Option<String>,
    /// Full ordered thread snapshot.
    pub lines: Vec<String>,
}

/// Confirmation that our own send landed server-side.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendReceipt {
    /// Thread the send belonged to.
    pub ticket_id: String,
    /// Text that was sent.
    pub message: String,
    /// Full thread snapshot including the sent line.
    #[serde(default, rename = "updatedContent")]
    pub lines: Vec<String>,
}

/// Structured support push wire shape.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StructuredSupportWire {
    ticket_id: String,
    #[serde(default)]
    from: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default, rename = "updatedContent")]
    updated_content: Vec<String>,
}

/// Legacy flat support push wire shape.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LegacySupportWire {
    sender: String,
    #[serde(default)]
    #[allow(dead_code)]
    receiver: Option<String>,
    #[serde(default)]
    content: Vec<String>,
    #[serde(default)]
    #[allow(dead_code)]
    created_at: Option<Value>,
}

/// Typed view over an inbound frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    /// `booking_notification` frame.
    Booking(BookingNotification),
    /// `order_update` frame.
    Order(OrderUpdate),
    /// `system_message` frame.
    System(SystemMessage),
    /// `chat_message` frame.
    Chat(ChatMessage),
    /// `support_message` frame, either wire shape.
    Support(SupportUpdate),
    /// `message_sent` confirmation.
    Receipt(SendReceipt),
    /// `error` frame.
    Notice(ChannelNotice),
    /// Anything that did not match a known shape, raw value preserved.
    Unknown(Value),
}

impl Payload {
    /// Parse a raw frame into a typed view. Never fails: shape mismatches
    /// degrade to [`Payload::Unknown`] carrying the original value.
    #[must_use]
    pub fn from_value(frame: &Value) -> Self {
        let kind = frame
            .get("type")
            .and_then(Value::as_str)
            .map_or(EventKind::Unknown, EventKind::from_wire);

        match kind {
            EventKind::BookingNotification => Self::Booking(BookingNotification {
                customer_name: frame
                    .pointer("/data/customerName")
                    .and_then(Value::as_str)
                    .map(str::to_owned),
            }),
            EventKind::OrderUpdate => parse_or_unknown(frame, Self::Order),
            EventKind::SystemMessage => parse_or_unknown(frame, Self::System),
            EventKind::ChatMessage => parse_or_unknown(frame, Self::Chat),
            EventKind::SupportMessage => parse_support(frame),
            EventKind::MessageSent => parse_or_unknown(frame, Self::Receipt),
            EventKind::Error => parse_or_unknown(frame, Self::Notice),
            EventKind::Unknown => Self::Unknown(frame.clone()),
        }
    }

    /// Event kind this payload corresponds to.
    #[must_use]
    pub fn kind(&self) -> EventKind {
        match self {
            Self::Booking(_) => EventKind::BookingNotification,
            Self::Order(_) => EventKind::OrderUpdate,
            Self::System(_) => EventKind::SystemMessage,
            Self::Chat(_) => EventKind::ChatMessage,
            Self::Support(_) => EventKind::SupportMessage,
            Self::Receipt(_) => EventKind::MessageSent,
            Self::Notice(_) => EventKind::Error,
            Self::Unknown(_) => EventKind::Unknown,
        }
    }
}

fn parse_or_unknown<T>(frame: &Value, wrap: fn(T) -> Payload) -> Payload
where
    T: for<'de> Deserialize<'de>,
{
    match serde_json::from_value::<T>(frame.clone()) {
        Ok(parsed) => wrap(parsed),
        Err(_) => Payload::Unknown(frame.clone()),
    }
}

/// Try the structured shape first, then the legacy flat shape.
fn parse_support(frame: &Value) -> Payload {
    if let Ok(wire) = serde_json::from_value::<StructuredSupportWire>(frame.clone()) {
        return Payload::Support(SupportUpdate {
            ticket_id: wire.ticket_id,
            from: wire.from,
            message: wire.message,
            lines: wire.updated_content,
        });
    }

    if let Ok(wire) = serde_json::from_value::<LegacySupportWire>(frame.clone()) {
        return Payload::Support(SupportUpdate {
            ticket_id: wire.sender.clone(),
            from: Some(wire.sender),
            message: None,
            lines: wire.content,
        });
    }

    Payload::Unknown(frame.clone())
}
