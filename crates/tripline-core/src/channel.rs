//! Channel lifecycle state machine.
//!
//! Manages the single persistent connection per session: connect,
//! reconnect backoff, send gating, and the frozen disconnect that follows
//! an explicit logout. Uses the action pattern: methods take time as input
//! and return actions for the driver to execute, keeping the machine pure
//! and deterministic under test.
//!
//! # State Machine
//!
//! ```text
//! ┌──────────────┐  connect()  ┌────────────┐   (open)    ┌───────────┐
//! │ Disconnected │────────────>│ Connecting │────────────>│ Connected │
//! └──────────────┘             └────────────┘             └───────────┘
//!        ^                           │ (failure)                │ (close|error)
//!        │        retry after        ↓                          ↓
//!        │        backoff      ┌──────────────┐          ┌──────────────┐
//!        └─────────────────────│ Disconnected │<─────────│ Disconnected │
//!                              └──────────────┘          └──────────────┘
//! ```
//!
//! `disconnect()` freezes the machine in Disconnected: scheduled retries
//! are cancelled and no further automatic reconnection happens until an
//! explicit `connect()`.

use std::time::Duration;

use serde_json::Value;

use crate::error::ChannelError;

/// First retry delay after an unexpected close.
pub const DEFAULT_RETRY_BASE: Duration = Duration::from_secs(1);

/// Upper bound on the doubling retry delay.
pub const DEFAULT_RETRY_CAP: Duration = Duration::from_secs(30);

/// Credentials used to open the channel, supplied by the authentication
/// collaborator at login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    /// Logged-in user id. Must be non-empty.
    pub user_id: String,
    /// Bearer token for the channel handshake.
    pub token: String,
}

impl Identity {
    /// Create an identity from its parts.
    #[must_use]
    pub fn new(user_id: impl Into<String>, token: impl Into<String>) -> Self {
        Self { user_id: user_id.into(), token: token.into() }
    }
}

/// Connection state. Exactly one value at any instant; transitions are
/// the single source of truth for "can I send".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    /// No transport. May have a reconnect pending unless frozen.
    Disconnected,
    /// Transport setup in flight.
    Connecting,
    /// Transport open; sends are valid.
    Connected,
}

/// Actions returned by the channel state machine.
///
/// The driver executes these: open or close the underlying transport,
/// push a frame, or fan a state change out to subscribers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelAction {
    /// Open the transport with these credentials.
    OpenTransport(Identity),

    /// Close and release the transport resource.
    CloseTransport,

    /// Push this frame over the open transport.
    SendFrame(Value),

    /// The link state changed; subscribers driving connection-status UI
    /// observe every transition through this action.
    StateChanged(LinkState),
}

/// Channel configuration.
#[derive(Debug, Clone)]
pub struct ChannelConfig {
    /// First retry delay after an unexpected close.
    pub retry_base: Duration,
    /// Cap on the doubling retry delay.
    pub retry_cap: Duration,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self { retry_base: DEFAULT_RETRY_BASE, retry_cap: DEFAULT_RETRY_CAP }
    }
}

/// Channel lifecycle state machine.
///
/// Pure state machine: no I/O, no clock. Time is passed as parameters and
/// reconnection is driven by periodic [`Channel::tick`] calls.
///
/// Generic over `I` to support both real and virtual time.
#[derive(Debug, Clone)]
pub struct Channel<I>
where
    I: Copy + Ord + std::ops::Add<Duration, Output = I>,
{
    state: LinkState,
    config: ChannelConfig,
    /// Credentials from the most recent `connect`. Retries reuse them.
    identity: Option<Identity>,
    /// Explicit logout happened; automatic reconnection is suppressed.
    frozen: bool,
    /// When the next automatic reconnect fires. `None` if none scheduled.
    retry_at: Option<I>,
    /// Delay the next unexpected close will schedule.
    next_retry_delay: Duration,
}

impl<I> Channel<I>
where
    I: Copy + Ord + std::ops::Add<Duration, Output = I>,
{
    /// Create a channel in [`LinkState::Disconnected`], frozen until the
    /// first explicit `connect`.
    #[must_use]
    pub fn new(config: ChannelConfig) -> Self {
        let next_retry_delay = config.retry_base;
        Self { state: LinkState::Disconnected, config, identity: None, frozen: true, retry_at: None, next_retry_delay }
    }

    /// Current link state.
    #[must_use]
    pub fn state(&self) -> LinkState {
        self.state
    }

    /// True after an explicit `disconnect`; no automatic reconnection
    /// will happen until the next `connect`.
    #[must_use]
    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    /// Identity from the most recent `connect`.
    #[must_use]
    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    /// Initiate transport setup.
    ///
    /// Idempotent while Connecting or Connected: repeated calls never open
    /// a duplicate transport for the same identity.
    ///
    /// # Errors
    ///
    /// - [`ChannelError::InvalidIdentity`] if the user id is empty
    pub fn connect(&mut self, identity: Identity, _now: I) -> Result<Vec<ChannelAction>, ChannelError> {
        if identity.user_id.is_empty() {
            return Err(ChannelError::InvalidIdentity);
        }

        if self.state != LinkState::Disconnected {
            return Ok(vec![]);
        }

        self.frozen = false;
        self.identity = Some(identity.clone());
        self.retry_at = None;
        self.next_retry_delay = self.config.retry_base;
        self.state = LinkState::Connecting;

        Ok(vec![ChannelAction::StateChanged(LinkState::Connecting), ChannelAction::OpenTransport(identity)])
    }

    /// The transport finished opening.
    ///
    /// Resets the retry backoff. An open that races a preceding
    /// `disconnect` is answered with a close so the resource is released.
    pub fn on_open(&mut self, _now: I) -> Vec<ChannelAction> {
        if self.frozen {
            return vec![ChannelAction::CloseTransport];
        }

        if self.state != LinkState::Connecting {
            return vec![];
        }

        self.state = LinkState::Connected;
        self.next_retry_delay = self.config.retry_base;
        self.retry_at = None;
        vec![ChannelAction::StateChanged(LinkState::Connected)]
    }

    /// The transport closed or errored.
    ///
    /// Unless frozen, schedules a reconnect after the current backoff
    /// delay (doubling, capped). Covers both failure while Connecting and
    /// an unexpected close while Connected.
    pub fn on_close(&mut self, now: I) -> Vec<ChannelAction> {
        let was = self.state;
        self.state = LinkState::Disconnected;

        let mut actions = Vec::new();
        if was != LinkState::Disconnected {
            actions.push(ChannelAction::StateChanged(LinkState::Disconnected));
        }

        if !self.frozen && self.identity.is_some() {
            self.retry_at = Some(now + self.next_retry_delay);
            self.next_retry_delay = (self.next_retry_delay * 2).min(self.config.retry_cap);
        }

        actions
    }

    /// Gate an outbound frame on the link state.
    ///
    /// # Errors
    ///
    /// - [`ChannelError::SendRejected`] in any state but Connected. The
    ///   error is non-fatal; callers log it and must not assume delivery.
    pub fn send(&mut self, frame: Value) -> Result<Vec<ChannelAction>, ChannelError> {
        if self.state != LinkState::Connected {
            return Err(ChannelError::SendRejected { state: self.state });
        }
        Ok(vec![ChannelAction::SendFrame(frame)])
    }

    /// Explicit disconnect (logout or unmount).
    ///
    /// Freezes the machine: cancels any in-flight reconnection attempt and
    /// any scheduled retry, and releases the transport.
    pub fn disconnect(&mut self, _now: I) -> Vec<ChannelAction> {
        let was = self.state;
        self.frozen = true;
        self.retry_at = None;
        self.next_retry_delay = self.config.retry_base;
        self.state = LinkState::Disconnected;

        let mut actions = vec![ChannelAction::CloseTransport];
        if was != LinkState::Disconnected {
            actions.push(ChannelAction::StateChanged(LinkState::Disconnected));
        }
        actions
    }

    /// Process periodic maintenance: fire a due reconnect.
    pub fn tick(&mut self, now: I) -> Vec<ChannelAction> {
        if self.frozen || self.state != LinkState::Disconnected {
            return vec![];
        }

        let due = self.retry_at.is_some_and(|at| now >= at);
        if !due {
            return vec![];
        }

        let Some(identity) = self.identity.clone() else {
            self.retry_at = None;
            return vec![];
        };

        self.retry_at = None;
        self.state = LinkState::Connecting;
        vec![ChannelAction::StateChanged(LinkState::Connecting), ChannelAction::OpenTransport(identity)]
    }

    /// When the next automatic reconnect is scheduled. `None` if none.
    #[must_use]
    pub fn retry_at(&self) -> Option<I> {
        self.retry_at
    }
}
