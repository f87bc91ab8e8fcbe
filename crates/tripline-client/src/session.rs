//! Session-scoped state container.
//!
//! One `Session` per logged-in user: created at login, dropped at logout.
//! It composes the pure state machines (channel, store, reload
//! coordinator, dispatcher, ticket board) and translates transport events,
//! ticks, and user operations into [`SessionAction`]s for the driver to
//! execute. No I/O happens here.

use std::time::Duration;

use serde_json::Value;
use tracing::{debug, error, warn};
use tripline_core::{
    Channel, ChannelAction, ChannelConfig, ChannelError, Environment, Identity, InboundEvent,
    LinkState, MessageStore, NotificationDispatcher, NotifyConfig, ReloadConfig, ReloadCoordinator,
    Ticket, TicketBoard, Toast,
};
use tripline_proto::{Envelope, EventKind, Payload, SupportUpdate, ThreadRecord};

/// How often the driver wakes the session for timer maintenance.
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(100);

/// Aggregate configuration for one session.
#[derive(Debug, Clone, Default)]
pub struct SessionConfig {
    /// Channel lifecycle tuning (retry backoff).
    pub channel: ChannelConfig,
    /// Reload debounce tuning.
    pub reload: ReloadConfig,
    /// Toast cap and self-dismiss duration.
    pub notify: NotifyConfig,
}

/// Actions the driver executes on behalf of the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionAction {
    /// Open the transport with these credentials.
    OpenTransport(Identity),
    /// Close and release the transport.
    CloseTransport,
    /// Push one frame over the open transport.
    SendFrame(Value),
    /// Start a support-thread fetch via the history collaborator.
    FetchThreads,
}

/// Read-only view of session state, published to presentation
/// subscribers after every mutation.
#[derive(Debug, Clone)]
pub struct SessionSnapshot {
    /// Current link state.
    pub connection_state: LinkState,
    /// Derived count of unread stored events.
    pub unread_count: usize,
    /// Stored events in arrival order.
    pub messages: Vec<InboundEvent>,
    /// Currently visible toasts, oldest first.
    pub toasts: Vec<Toast>,
    /// Ticket threads ordered by id.
    pub tickets: Vec<Ticket>,
}

/// The session state container.
///
/// Methods take the caller's clock and return actions; the driver owns
/// the actual timers and I/O.
pub struct Session<E: Environment> {
    env: E,
    channel: Channel<E::Instant>,
    store: MessageStore,
    reload: ReloadCoordinator<E::Instant>,
    notify: NotificationDispatcher<E::Instant>,
    tickets: TicketBoard,
}

impl<E: Environment> Session<E> {
    /// Create a session with no connection and empty state.
    pub fn new(env: E, config: SessionConfig) -> Self {
        Self {
            env,
            channel: Channel::new(config.channel),
            store: MessageStore::new(),
            reload: ReloadCoordinator::new(config.reload),
            notify: NotificationDispatcher::new(config.notify),
            tickets: TicketBoard::new(),
        }
    }

    /// Initiate the persistent connection.
    ///
    /// # Errors
    ///
    /// - [`ChannelError::InvalidIdentity`] if the user id is empty
    pub fn connect(&mut self, identity: Identity) -> Result<Vec<SessionAction>, ChannelError> {
        let now = self.env.now();
        let actions = self.channel.connect(identity, now)?;
        Ok(self.map_channel_actions(actions))
    }

    /// Explicit disconnect: releases the transport, suppresses automatic
    /// reconnection until the next `connect`, and drops any pending
    /// reload timer so nothing fires against a logged-out session.
    pub fn disconnect(&mut self) -> Vec<SessionAction> {
        let now = self.env.now();
        self.reload.cancel_pending();
        let actions = self.channel.disconnect(now);
        self.map_channel_actions(actions)
    }

    /// The transport finished opening.
    pub fn transport_opened(&mut self) -> Vec<SessionAction> {
        let now = self.env.now();
        let actions = self.channel.on_open(now);
        self.map_channel_actions(actions)
    }

    /// The transport closed or failed.
    pub fn transport_closed(&mut self, reason: &str) -> Vec<SessionAction> {
        debug!(reason, "transport closed");
        let now = self.env.now();
        let actions = self.channel.on_close(now);
        self.map_channel_actions(actions)
    }

    /// Process one inbound frame: classify, store, notify, and feed the
    /// per-kind side effects (ticket snapshots, reload triggers).
    pub fn handle_frame(&mut self, frame: Value) -> Vec<SessionAction> {
        let now = self.env.now();
        let event = tripline_core::classify(frame, self.env.frame_id(), self.env.wall_clock_millis());

        // A duplicate frame is a full no-op: no store entry, no toast,
        // no reload trigger.
        if !self.store.append(event.clone()) {
            debug!(id = %event.id, "duplicate frame dropped");
            return vec![];
        }

        self.notify.dispatch(&event, now);

        let mut actions = Vec::new();
        match event.kind {
            EventKind::SupportMessage => {
                if let Payload::Support(update) = Payload::from_value(&event.data) {
                    self.tickets.apply_update(&update);
                }
                if self.reload.trigger(now) {
                    actions.push(SessionAction::FetchThreads);
                }
            },
            EventKind::ChatMessage => {
                if self.reload.trigger(now) {
                    actions.push(SessionAction::FetchThreads);
                }
            },
            EventKind::MessageSent => {
                self.apply_receipt(&event.data);
                if self.reload.trigger_post_send(now) {
                    actions.push(SessionAction::FetchThreads);
                }
            },
            EventKind::Error => {
                warn!(id = %event.id, "server error frame received");
            },
            EventKind::Unknown => {
                warn!(id = %event.id, "unrecognized frame kind retained as-is");
            },
            EventKind::BookingNotification
            | EventKind::OrderUpdate
            | EventKind::SystemMessage => {},
        }
        actions
    }

    /// Periodic maintenance: due reconnects, lapsed reload deadlines,
    /// expired toasts.
    pub fn tick(&mut self) -> Vec<SessionAction> {
        let now = self.env.now();
        let channel_actions = self.channel.tick(now);
        let mut actions = self.map_channel_actions(channel_actions);
        if self.reload.tick(now) {
            actions.push(SessionAction::FetchThreads);
        }
        self.notify.tick(now);
        actions
    }

    /// A thread fetch finished: rebuild the board wholesale and close the
    /// reload window.
    pub fn apply_threads(&mut self, records: &[ThreadRecord]) {
        self.tickets.replace_all(records);
        self.reload.complete(self.env.now());
    }

    /// A thread fetch failed. The last-known board is retained; the next
    /// trigger retries. An ephemeral error toast is shown without creating
    /// a stored event.
    pub fn reload_failed(&mut self, message: &str) {
        warn!(message, "support thread reload failed");
        let now = self.env.now();
        self.reload.complete(now);

        let event = InboundEvent {
            id: self.env.frame_id(),
            kind: EventKind::Error,
            data: serde_json::json!({ "type": "error", "message": message }),
            timestamp: self.env.wall_clock_millis(),
            read: false,
        };
        self.notify.dispatch(&event, now);
    }

    /// Send a booking alert. The payload lands under `data`.
    pub fn send_booking_notification(&mut self, payload: Value) -> Vec<SessionAction> {
        let frame = self.envelope().booking_notification(payload);
        self.gated_send(frame)
    }

    /// Send an order status change notice.
    pub fn send_order_update(
        &mut self,
        order_id: &str,
        status: &str,
        extra: Option<Value>,
    ) -> Vec<SessionAction> {
        let frame = self.envelope().order_update(order_id, status, extra);
        self.gated_send(frame)
    }

    /// Send a chat message.
    pub fn send_chat_message(&mut self, text: &str) -> Vec<SessionAction> {
        let frame = self.envelope().chat_message(text);
        self.gated_send(frame)
    }

    /// Send a support line to a partner's thread.
    pub fn send_support_message(&mut self, to_partner_id: &str, text: &str) -> Vec<SessionAction> {
        let frame = self.envelope().support_message(to_partner_id, text);
        self.gated_send(frame)
    }

    /// Mark one stored event read.
    pub fn mark_read(&mut self, id: &str) -> bool {
        self.store.mark_read(id)
    }

    /// Remove one stored event.
    pub fn remove(&mut self, id: &str) -> bool {
        self.store.remove(id)
    }

    /// Drop all stored events and all ticket threads.
    pub fn clear_all(&mut self) {
        self.store.clear_all();
        self.tickets.clear();
    }

    /// Manually dismiss one toast.
    pub fn dismiss_toast(&mut self, event_id: &str) -> bool {
        self.notify.dismiss(event_id)
    }

    /// User id from the most recent connect, if any.
    #[must_use]
    pub fn user_id(&self) -> Option<&str> {
        self.channel.identity().map(|i| i.user_id.as_str())
    }

    /// Current link state.
    #[must_use]
    pub fn connection_state(&self) -> LinkState {
        self.channel.state()
    }

    /// Build the current read-only view.
    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            connection_state: self.channel.state(),
            unread_count: self.store.unread_count(),
            messages: self.store.messages().to_vec(),
            toasts: self.notify.active().into_iter().cloned().collect(),
            tickets: self.tickets.tickets().into_iter().cloned().collect(),
        }
    }

    fn envelope(&self) -> Envelope {
        Envelope::new(self.env.frame_id(), self.env.wall_clock_millis())
    }

    /// Send with link-state gating. A rejected send is logged and
    /// dropped; it never tears the session down. Transient rejections
    /// (link down, will succeed after reconnect) log at warn; anything
    /// permanently wrong logs at error.
    fn gated_send(&mut self, frame: Value) -> Vec<SessionAction> {
        match self.channel.send(frame) {
            Ok(actions) => self.map_channel_actions(actions),
            Err(err) if err.is_transient() => {
                warn!(%err, "outbound frame dropped");
                vec![]
            },
            Err(err) => {
                error!(%err, "outbound frame rejected");
                vec![]
            },
        }
    }

    /// A send receipt may carry a snapshot of the updated thread. Apply
    /// it like any other snapshot; an empty one is skipped rather than
    /// wiping the thread.
    fn apply_receipt(&mut self, data: &Value) {
        if let Payload::Receipt(receipt) = Payload::from_value(data) {
            if !receipt.lines.is_empty() {
                self.tickets.apply_update(&SupportUpdate {
                    ticket_id: receipt.ticket_id,
                    from: None,
                    message: Some(receipt.message),
                    lines: receipt.lines,
                });
            }
        }
    }

    fn map_channel_actions(&self, actions: Vec<ChannelAction>) -> Vec<SessionAction> {
        actions
            .into_iter()
            .filter_map(|action| match action {
                ChannelAction::OpenTransport(identity) => {
                    Some(SessionAction::OpenTransport(identity))
                },
                ChannelAction::CloseTransport => Some(SessionAction::CloseTransport),
                ChannelAction::SendFrame(frame) => Some(SessionAction::SendFrame(frame)),
                ChannelAction::StateChanged(state) => {
                    debug!(?state, "link state changed");
                    None
                },
            })
            .collect()
    }
}
