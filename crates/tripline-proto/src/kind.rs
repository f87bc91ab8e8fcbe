//! Typed frame discriminator.

use serde::{Deserialize, Serialize};

/// Classification of an inbound frame, derived from its `type` field.
///
/// Unrecognized or absent discriminators map to [`EventKind::Unknown`];
/// frames are never dropped for having an unknown type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    /// New booking alert for a partner.
    BookingNotification,
    /// Order status changed.
    OrderUpdate,
    /// Operator broadcast.
    SystemMessage,
    /// Generic chat push.
    ChatMessage,
    /// Support thread push (structured or legacy shape).
    SupportMessage,
    /// Confirmation that our own send succeeded.
    ///
    /// Distinct from [`EventKind::SupportMessage`] even though both may
    /// carry a full thread snapshot: a receipt is not a new arrival.
    MessageSent,
    /// Channel-level error notice.
    Error,
    /// Unrecognized frame shape, retained for diagnostics.
    Unknown,
}

impl EventKind {
    /// Parse the wire discriminator. Anything unrecognized is `Unknown`.
    #[must_use]
    pub fn from_wire(s: &str) -> Self {
        match s {
            "booking_notification" => Self::BookingNotification,
            "order_update" => Self::OrderUpdate,
            "system_message" => Self::SystemMessage,
            "chat_message" => Self::ChatMessage,
            "support_message" => Self::SupportMessage,
            "message_sent" => Self::MessageSent,
            "error" => Self::Error,
            _ => Self::Unknown,
        }
    }

    /// Wire discriminator string for this kind.
    #[must_use]
    pub fn as_wire(&self) -> &'static str {
        match self {
            Self::BookingNotification => "booking_notification",
            Self::OrderUpdate => "order_update",
            Self::SystemMessage => "system_message",
            Self::ChatMessage => "chat_message",
            Self::SupportMessage => "support_message",
            Self::MessageSent => "message_sent",
            Self::Error => "error",
            Self::Unknown => "unknown",
        }
    }
}
