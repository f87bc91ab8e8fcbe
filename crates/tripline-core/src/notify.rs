//! Notification dispatcher.
//!
//! Turns newly arrived, unread events into ephemeral toast presentations,
//! independent of the persistent unread list. Dispatch is idempotent per
//! event id, the visible set is capped (oldest evicted first, read state
//! irrelevant), and each toast self-dismisses after a fixed duration
//! unless manually dismissed first.

use std::collections::HashSet;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tripline_proto::{EventKind, Payload};

use crate::InboundEvent;

/// Most toasts visible at once; older ones are evicted first.
pub const DEFAULT_MAX_VISIBLE: usize = 3;

/// How long a toast stays up before self-dismissing.
pub const DEFAULT_TOAST_TTL: Duration = Duration::from_millis(5000);

/// Dispatcher configuration. Defaults are configurable observations, not
/// hard requirements.
#[derive(Debug, Clone)]
pub struct NotifyConfig {
    /// Cap on concurrently visible toasts.
    pub max_visible: usize,
    /// Self-dismiss duration.
    pub ttl: Duration,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self { max_visible: DEFAULT_MAX_VISIBLE, ttl: DEFAULT_TOAST_TTL }
    }
}

/// Presentation severity, mapped per event kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    /// Positive outcome (new booking).
    Success,
    /// Neutral information (order updates, chat, support, broadcasts).
    Info,
    /// Degraded but functioning (unrecognized frames).
    Warning,
    /// Channel-level failure.
    Error,
}

/// One transient presentation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Toast {
    /// Id of the event this toast presents. One toast per event, ever.
    pub event_id: String,
    /// Fixed per-kind label.
    pub title: String,
    /// Type-specific formatted body.
    pub body: String,
    /// Per-kind severity.
    pub severity: Severity,
}

/// Toast dispatcher with eviction and self-dismiss timing.
///
/// Pure state machine: expiry is driven by [`NotificationDispatcher::tick`]
/// with the caller's clock.
#[derive(Debug, Clone)]
pub struct NotificationDispatcher<I>
where
    I: Copy + Ord + std::ops::Add<Duration, Output = I>,
{
    config: NotifyConfig,
    /// Visible toasts with their self-dismiss deadlines, oldest first.
    active: Vec<(Toast, I)>,
    /// Every event id ever presented; dispatch is idempotent against it.
    seen: HashSet<String>,
}

impl<I> NotificationDispatcher<I>
where
    I: Copy + Ord + std::ops::Add<Duration, Output = I>,
{
    /// Create a dispatcher with no active toasts.
    #[must_use]
    pub fn new(config: NotifyConfig) -> Self {
        Self { config, active: Vec::new(), seen: HashSet::new() }
    }

    /// Present a newly appended event.
    ///
    /// Returns `true` when a toast was created. Already-read events (send
    /// receipts) and already-presented ids yield nothing.
    pub fn dispatch(&mut self, event: &InboundEvent, now: I) -> bool {
        if event.read || self.seen.contains(&event.id) {
            return false;
        }
        self.seen.insert(event.id.clone());

        let toast = Toast {
            event_id: event.id.clone(),
            title: title_for(event.kind).to_owned(),
            body: body_for(event.kind, &event.data),
            severity: severity_for(event.kind),
        };
        self.active.push((toast, now + self.config.ttl));

        // Cap the visible set; oldest goes first regardless of read state
        while self.active.len() > self.config.max_visible {
            self.active.remove(0);
        }
        true
    }

    /// Drop toasts whose self-dismiss deadline has lapsed.
    pub fn tick(&mut self, now: I) {
        self.active.retain(|(_, expires_at)| now < *expires_at);
    }

    /// Manually dismiss one toast. Returns `true` when it was visible.
    pub fn dismiss(&mut self, event_id: &str) -> bool {
        let before = self.active.len();
        self.active.retain(|(toast, _)| toast.event_id != event_id);
        self.active.len() != before
    }

    /// Currently visible toasts, oldest first.
    #[must_use]
    pub fn active(&self) -> Vec<&Toast> {
        self.active.iter().map(|(toast, _)| toast).collect()
    }
}

fn severity_for(kind: EventKind) -> Severity {
    match kind {
        EventKind::BookingNotification => Severity::Success,
        EventKind::OrderUpdate
        | EventKind::SystemMessage
        | EventKind::ChatMessage
        | EventKind::SupportMessage
        | EventKind::MessageSent => Severity::Info,
        EventKind::Error => Severity::Error,
        EventKind::Unknown => Severity::Warning,
    }
}

fn title_for(kind: EventKind) -> &'static str {
    match kind {
        EventKind::BookingNotification => "New booking",
        EventKind::OrderUpdate => "Order update",
        EventKind::SystemMessage => "System notice",
        EventKind::ChatMessage => "New chat message",
        EventKind::SupportMessage => "Support reply",
        EventKind::MessageSent => "Message sent",
        EventKind::Error => "Connection problem",
        EventKind::Unknown => "Notification",
    }
}

/// Type-specific body formatter over the raw payload.
fn body_for(kind: EventKind, data: &Value) -> String {
    match Payload::from_value(data) {
        Payload::Booking(b) => match b.customer_name {
            Some(name) => format!("New booking from {name}"),
            None => "A new booking arrived".to_owned(),
        },
        Payload::Order(o) => format!("Order {} is now {}", o.order_id, o.status),
        Payload::System(s) => s.message,
        Payload::Chat(c) => c.message,
        Payload::Support(s) => {
            let text = s.message.or_else(|| s.lines.last().cloned()).unwrap_or_default();
            match s.from {
                Some(from) => format!("{from}: {text}"),
                None => text,
            }
        },
        Payload::Receipt(r) => format!("Delivered to ticket {}", r.ticket_id),
        Payload::Notice(n) => n.message,
        Payload::Unknown(_) => format!("Unrecognized {} event", kind.as_wire()),
    }
}

#[cfg(test)]
mod tests {
    use std::time::Instant;

    use serde_json::json;

    use super::*;

    fn event(id: &str, kind: EventKind, data: Value) -> InboundEvent {
        InboundEvent {
            id: id.to_owned(),
            kind,
            data,
            timestamp: 0,
            read: kind == EventKind::MessageSent,
        }
    }

    fn dispatcher() -> NotificationDispatcher<Instant> {
        NotificationDispatcher::new(NotifyConfig::default())
    }

    #[test]
    fn chat_event_produces_chat_titled_toast() {
        let t0 = Instant::now();
        let mut nd = dispatcher();
        let frame = json!({ "type": "chat_message", "message": "hello" });

        assert!(nd.dispatch(&event("m1", EventKind::ChatMessage, frame), t0));

        let active = nd.active();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].title, "New chat message");
        assert_eq!(active[0].body, "hello");
        assert_eq!(active[0].severity, Severity::Info);
    }

    #[test]
    fn dispatch_is_idempotent_per_event_id() {
        let t0 = Instant::now();
        let mut nd = dispatcher();
        let ev = event("m1", EventKind::ChatMessage, json!({ "type": "chat_message", "message": "x" }));

        assert!(nd.dispatch(&ev, t0));
        assert!(!nd.dispatch(&ev, t0), "the same event never produces two presentations");
        assert_eq!(nd.active().len(), 1);
    }

    #[test]
    fn receipts_yield_no_toast() {
        let t0 = Instant::now();
        let mut nd = dispatcher();
        let ev = event(
            "r1",
            EventKind::MessageSent,
            json!({ "type": "message_sent", "ticketId": "t-1", "message": "ok" }),
        );
        assert!(!nd.dispatch(&ev, t0));
        assert!(nd.active().is_empty());
    }

    #[test]
    fn cap_evicts_oldest_first() {
        let t0 = Instant::now();
        let mut nd = dispatcher();
        for i in 0..5 {
            let id = format!("m{i}");
            nd.dispatch(
                &event(&id, EventKind::ChatMessage, json!({ "type": "chat_message", "message": id })),
                t0,
            );
        }

        let ids: Vec<&str> = nd.active().iter().map(|t| t.event_id.as_str()).collect();
        assert_eq!(ids, ["m2", "m3", "m4"]);
    }

    #[test]
    fn toasts_self_dismiss_after_ttl() {
        let t0 = Instant::now();
        let mut nd = dispatcher();
        nd.dispatch(
            &event("m1", EventKind::ChatMessage, json!({ "type": "chat_message", "message": "x" })),
            t0,
        );

        nd.tick(t0 + DEFAULT_TOAST_TTL - Duration::from_millis(1));
        assert_eq!(nd.active().len(), 1);

        nd.tick(t0 + DEFAULT_TOAST_TTL);
        assert!(nd.active().is_empty());
    }

    #[test]
    fn manual_dismiss_beats_the_timer() {
        let t0 = Instant::now();
        let mut nd = dispatcher();
        nd.dispatch(
            &event("m1", EventKind::ChatMessage, json!({ "type": "chat_message", "message": "x" })),
            t0,
        );

        assert!(nd.dismiss("m1"));
        assert!(!nd.dismiss("m1"));
        assert!(nd.active().is_empty());
    }

    #[test]
    fn severity_mapping_per_kind() {
        assert_eq!(severity_for(EventKind::BookingNotification), Severity::Success);
        assert_eq!(severity_for(EventKind::OrderUpdate), Severity::Info);
        assert_eq!(severity_for(EventKind::Error), Severity::Error);
        assert_eq!(severity_for(EventKind::Unknown), Severity::Warning);
    }

    #[test]
    fn booking_body_uses_customer_name() {
        let t0 = Instant::now();
        let mut nd = dispatcher();
        nd.dispatch(
            &event(
                "b1",
                EventKind::BookingNotification,
                json!({ "type": "booking_notification", "data": { "customerName": "Ada" } }),
            ),
            t0,
        );
        assert_eq!(nd.active()[0].body, "New booking from Ada");
        assert_eq!(nd.active()[0].severity, Severity::Success);
    }
}
