//! Scripted in-memory transport.

use std::sync::{Arc, Mutex, MutexGuard};

use serde_json::Value;
use tokio::sync::mpsc;
use tripline_client::{Transport, TransportError, TransportEvent};
use tripline_core::Identity;

#[derive(Default)]
struct Shared {
    /// Frames the session pushed, in send order.
    sent: Vec<Value>,
    /// Identities passed to successful opens, in order.
    opens: Vec<Identity>,
    /// Errors to fail upcoming opens with, consumed front-first.
    open_failures: Vec<String>,
}

/// Test-side controller for a [`FakeTransport`].
#[derive(Clone)]
pub struct FakeTransportHandle {
    events: mpsc::UnboundedSender<TransportEvent>,
    shared: Arc<Mutex<Shared>>,
}

impl FakeTransportHandle {
    /// Deliver one inbound frame to the session.
    pub fn push_frame(&self, frame: Value) {
        let _ = self.events.send(TransportEvent::Frame(frame));
    }

    /// Tear the connection down from the server side.
    pub fn push_closed(&self, reason: impl Into<String>) {
        let _ = self.events.send(TransportEvent::Closed { reason: reason.into() });
    }

    /// Make the next `open` call fail with this message.
    pub fn fail_next_open(&self, message: impl Into<String>) {
        self.lock().open_failures.push(message.into());
    }

    /// Frames the session has sent so far.
    #[must_use]
    pub fn sent(&self) -> Vec<Value> {
        self.lock().sent.clone()
    }

    /// Number of successful opens so far.
    #[must_use]
    pub fn open_count(&self) -> usize {
        self.lock().opens.len()
    }

    /// Identities passed to successful opens, in order.
    #[must_use]
    pub fn opens(&self) -> Vec<Identity> {
        self.lock().opens.clone()
    }

    #[allow(clippy::unwrap_used)]
    fn lock(&self) -> MutexGuard<'_, Shared> {
        self.shared.lock().unwrap()
    }
}

/// In-memory [`Transport`] fed by a [`FakeTransportHandle`].
///
/// Honors the transport contract: `recv` stays pending while no
/// connection is open, and a queued `Closed` event flips the connection
/// back down.
pub struct FakeTransport {
    events: mpsc::UnboundedReceiver<TransportEvent>,
    shared: Arc<Mutex<Shared>>,
    open: bool,
}

impl FakeTransport {
    /// Create a transport and its controller.
    #[must_use]
    pub fn new() -> (Self, FakeTransportHandle) {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let shared = Arc::new(Mutex::new(Shared::default()));
        let transport = FakeTransport { events: event_rx, shared: Arc::clone(&shared), open: false };
        let handle = FakeTransportHandle { events: event_tx, shared };
        (transport, handle)
    }

    #[allow(clippy::unwrap_used)]
    fn lock(&self) -> MutexGuard<'_, Shared> {
        self.shared.lock().unwrap()
    }
}

impl Transport for FakeTransport {
    async fn open(&mut self, identity: &Identity) -> Result<(), TransportError> {
        let failure = {
            let mut shared = self.lock();
            if shared.open_failures.is_empty() {
                shared.opens.push(identity.clone());
                None
            } else {
                Some(shared.open_failures.remove(0))
            }
        };

        match failure {
            Some(message) => Err(TransportError::Connect(message)),
            None => {
                self.open = true;
                Ok(())
            },
        }
    }

    async fn send(&mut self, frame: Value) -> Result<(), TransportError> {
        if !self.open {
            return Err(TransportError::Stream("no open connection".to_owned()));
        }
        self.lock().sent.push(frame);
        Ok(())
    }

    async fn recv(&mut self) -> TransportEvent {
        if !self.open {
            return std::future::pending().await;
        }
        match self.events.recv().await {
            Some(TransportEvent::Closed { reason }) => {
                self.open = false;
                TransportEvent::Closed { reason }
            },
            Some(event) => event,
            // Controller dropped: the scripted stream simply goes quiet
            None => std::future::pending().await,
        }
    }

    async fn close(&mut self) {
        self.open = false;
    }
}
