//! Injectable transport abstraction.
//!
//! The original pattern of observing global events to simulate pushes is
//! replaced by this explicit trait: the driver talks to `Transport`, and
//! tests substitute a scripted fake without any global hooks.

use std::future::Future;

use serde_json::Value;
use tripline_core::Identity;

use crate::error::TransportError;

/// Events surfaced by a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// One inbound frame, already decoded to JSON.
    Frame(Value),

    /// The transport closed, expectedly or not. The channel state machine
    /// decides whether a reconnect follows.
    Closed {
        /// Human-readable close reason for diagnostics.
        reason: String,
    },
}

/// The persistent channel's I/O boundary.
///
/// Implementations hold at most one live connection. [`Transport::recv`]
/// must stay pending while no connection is open (it must never spin
/// returning closures for a transport that is already down); a stream
/// ending surfaces exactly one [`TransportEvent::Closed`].
pub trait Transport: Send {
    /// Open the connection with the session's credentials.
    ///
    /// Suspends until the transport is open or setup has failed.
    fn open(
        &mut self,
        identity: &Identity,
    ) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Push one frame to the server.
    fn send(&mut self, frame: Value) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Wait for the next transport event.
    fn recv(&mut self) -> impl Future<Output = TransportEvent> + Send;

    /// Close and release the connection. Idempotent.
    fn close(&mut self) -> impl Future<Output = ()> + Send;
}
