//! Error types for the channel state machine.
//!
//! The messaging layer recovers from everything locally: transport drops
//! reconnect with backoff, fetch failures retain last-known state, and
//! classification never errors at all. The only typed errors live at the
//! channel boundary, and none of them are fatal to the enclosing session.

use thiserror::Error;

use crate::channel::LinkState;

/// Errors surfaced by [`crate::Channel`] operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChannelError {
    /// `connect` was called without a usable identity.
    #[error("cannot connect: identity has an empty user id")]
    InvalidIdentity,

    /// `send` was called while the channel was not connected.
    ///
    /// Non-fatal by contract: the caller logs a warning and must not
    /// assume delivery (at-most-once, best-effort semantics).
    #[error("send rejected: channel is {state:?}, not connected")]
    SendRejected {
        /// Link state at the time of the rejected send.
        state: LinkState,
    },
}

impl ChannelError {
    /// True when the operation may succeed if simply retried later.
    ///
    /// A rejected send becomes valid once the channel reconnects; a missing
    /// identity never fixes itself.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::SendRejected { .. })
    }
}
