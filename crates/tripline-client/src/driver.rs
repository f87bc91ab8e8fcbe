//! Tokio event loop around a [`Session`].
//!
//! The driver owns the transport, the timers, and the in-flight fetch
//! and open attempts. It is the only task that touches the session;
//! everything else talks to it through a [`SessionHandle`] and observes
//! state through the published snapshots.
//!
//! Slow I/O never blocks the loop: a transport open and a thread fetch
//! each run as their own in-flight future that the `select!` polls
//! alongside commands, transport events, and ticks. A logout or
//! shutdown is therefore processed immediately even while a connect
//! attempt is still hanging.

use std::collections::VecDeque;
use std::sync::Arc;

use serde_json::Value;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use tripline_core::{Environment, Identity};
use tripline_proto::ThreadRecord;

use crate::api::SupportApi;
use crate::error::{SessionClosed, SupportApiError, TransportError};
use crate::session::{
    DEFAULT_TICK_INTERVAL, Session, SessionAction, SessionConfig, SessionSnapshot,
};
use crate::transport::{Transport, TransportEvent};

/// User operations accepted by the driver.
#[derive(Debug, Clone)]
pub enum SessionCommand {
    /// Open the persistent channel with these credentials.
    Connect(Identity),
    /// Close the channel and suppress reconnection.
    Disconnect,
    /// Send a booking alert; the payload lands under `data`.
    SendBookingNotification(Value),
    /// Send an order status change notice.
    SendOrderUpdate {
        /// Order being updated.
        order_id: String,
        /// New status value.
        status: String,
        /// Optional free-form detail object.
        extra: Option<Value>,
    },
    /// Send a chat message.
    SendChatMessage(String),
    /// Send a support line to a partner's thread.
    SendSupportMessage {
        /// Partner whose thread receives the line.
        to_partner_id: String,
        /// Line text.
        text: String,
    },
    /// Mark one stored event read.
    MarkRead(String),
    /// Remove one stored event.
    Remove(String),
    /// Drop all stored events and ticket threads.
    ClearAll,
    /// Manually dismiss one toast.
    DismissToast(String),
    /// Stop the driver and release the transport.
    Shutdown,
}

/// Cloneable front for a running driver.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    commands: mpsc::UnboundedSender<SessionCommand>,
    snapshot: watch::Receiver<SessionSnapshot>,
}

impl SessionHandle {
    /// Send one command to the driver.
    ///
    /// # Errors
    ///
    /// - [`SessionClosed`] when the driver has shut down
    pub fn send(&self, command: SessionCommand) -> Result<(), SessionClosed> {
        self.commands.send(command).map_err(|_| SessionClosed)
    }

    /// Latest published snapshot.
    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshot.borrow().clone()
    }

    /// Wait for the next snapshot publication.
    ///
    /// # Errors
    ///
    /// - [`SessionClosed`] when the driver has shut down
    pub async fn changed(&mut self) -> Result<(), SessionClosed> {
        self.snapshot.changed().await.map_err(|_| SessionClosed)
    }
}

/// What one loop iteration is about.
enum Step<T> {
    Command(Option<SessionCommand>),
    Transport(TransportEvent),
    Opened { transport: Option<T>, result: Result<(), TransportError> },
    Fetched(Result<Vec<ThreadRecord>, SupportApiError>),
    Tick,
}

/// The session event loop.
///
/// Constructed alongside its [`SessionHandle`]; consumed by
/// [`SessionDriver::run`], typically inside `tokio::spawn`.
pub struct SessionDriver<T, E>
where
    T: Transport + 'static,
    E: Environment,
{
    session: Session<E>,
    /// The transport, unless an open attempt currently owns it.
    transport: Option<T>,
    api: Arc<dyn SupportApi>,
    commands: mpsc::UnboundedReceiver<SessionCommand>,
    snapshot: watch::Sender<SessionSnapshot>,
    /// In-flight open attempt; hands the transport back when it resolves.
    /// The loop keeps processing everything else meanwhile.
    opening: Option<JoinHandle<(T, Result<(), TransportError>)>>,
    /// At most one thread fetch runs at a time; the reload coordinator
    /// guarantees it never asks for a second.
    fetch: Option<JoinHandle<Result<Vec<ThreadRecord>, SupportApiError>>>,
}

impl<T, E> SessionDriver<T, E>
where
    T: Transport + 'static,
    E: Environment,
{
    /// Create a driver and its handle.
    pub fn new(
        env: E,
        config: SessionConfig,
        transport: T,
        api: Arc<dyn SupportApi>,
    ) -> (Self, SessionHandle) {
        let session = Session::new(env, config);
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (snapshot_tx, snapshot_rx) = watch::channel(session.snapshot());

        let driver = Self {
            session,
            transport: Some(transport),
            api,
            commands: command_rx,
            snapshot: snapshot_tx,
            opening: None,
            fetch: None,
        };
        let handle = SessionHandle { commands: command_tx, snapshot: snapshot_rx };
        (driver, handle)
    }

    /// Run the event loop until shutdown or the last handle drops.
    pub async fn run(mut self) {
        info!("session driver started");
        let mut ticker = tokio::time::interval(DEFAULT_TICK_INTERVAL);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            let step = tokio::select! {
                command = self.commands.recv() => Step::Command(command),
                event = transport_recv(&mut self.transport) => Step::Transport(event),
                (transport, result) = poll_open(&mut self.opening) => {
                    Step::Opened { transport, result }
                },
                result = poll_fetch(&mut self.fetch) => Step::Fetched(result),
                _ = ticker.tick() => Step::Tick,
            };

            match step {
                Step::Command(None) | Step::Command(Some(SessionCommand::Shutdown)) => break,
                Step::Command(Some(command)) => self.handle_command(command).await,
                Step::Transport(TransportEvent::Frame(frame)) => {
                    let actions = self.session.handle_frame(frame);
                    self.execute(actions).await;
                },
                Step::Transport(TransportEvent::Closed { reason }) => {
                    let actions = self.session.transport_closed(&reason);
                    self.execute(actions).await;
                },
                Step::Opened { transport, result } => {
                    if let Some(transport) = transport {
                        self.transport = Some(transport);
                    }
                    // A disconnect that raced the open leaves the session
                    // frozen; transport_opened then answers with a close.
                    let actions = match result {
                        Ok(()) => self.session.transport_opened(),
                        Err(err) => {
                            warn!(%err, "transport open failed");
                            self.session.transport_closed(&err.to_string())
                        },
                    };
                    self.execute(actions).await;
                },
                Step::Fetched(Ok(records)) => {
                    self.session.apply_threads(&records);
                    self.publish();
                },
                Step::Fetched(Err(err)) => {
                    self.session.reload_failed(&err.to_string());
                    self.publish();
                },
                Step::Tick => {
                    let actions = self.session.tick();
                    self.execute(actions).await;
                },
            }
        }

        if let Some(opening) = self.opening.take() {
            opening.abort();
        }
        if let Some(fetch) = self.fetch.take() {
            fetch.abort();
        }
        if let Some(transport) = self.transport.as_mut() {
            transport.close().await;
        }
        info!("session driver stopped");
    }

    async fn handle_command(&mut self, command: SessionCommand) {
        match command {
            SessionCommand::Connect(identity) => match self.session.connect(identity) {
                Ok(actions) => self.execute(actions).await,
                Err(err) => warn!(%err, "connect rejected"),
            },
            SessionCommand::Disconnect => {
                let actions = self.session.disconnect();
                self.execute(actions).await;
            },
            SessionCommand::SendBookingNotification(payload) => {
                let actions = self.session.send_booking_notification(payload);
                self.execute(actions).await;
            },
            SessionCommand::SendOrderUpdate { order_id, status, extra } => {
                let actions = self.session.send_order_update(&order_id, &status, extra);
                self.execute(actions).await;
            },
            SessionCommand::SendChatMessage(text) => {
                let actions = self.session.send_chat_message(&text);
                self.execute(actions).await;
            },
            SessionCommand::SendSupportMessage { to_partner_id, text } => {
                let actions = self.session.send_support_message(&to_partner_id, &text);
                self.execute(actions).await;
            },
            SessionCommand::MarkRead(id) => {
                self.session.mark_read(&id);
                self.publish();
            },
            SessionCommand::Remove(id) => {
                self.session.remove(&id);
                self.publish();
            },
            SessionCommand::ClearAll => {
                self.session.clear_all();
                self.publish();
            },
            SessionCommand::DismissToast(id) => {
                self.session.dismiss_toast(&id);
                self.publish();
            },
            SessionCommand::Shutdown => {},
        }
    }

    /// Execute actions, feeding any follow-up actions back into the
    /// worklist. Nothing here awaits slow I/O: opens and fetches are
    /// started as in-flight futures and resolved by the select loop, so
    /// the Connecting snapshot is published before the open completes.
    async fn execute(&mut self, actions: Vec<SessionAction>) {
        let mut queue: VecDeque<SessionAction> = actions.into();
        while let Some(action) = queue.pop_front() {
            match action {
                SessionAction::OpenTransport(identity) => self.begin_open(identity),
                SessionAction::CloseTransport => {
                    if let Some(transport) = self.transport.as_mut() {
                        transport.close().await;
                    }
                },
                SessionAction::SendFrame(frame) => match self.transport.as_mut() {
                    Some(transport) => {
                        if let Err(err) = transport.send(frame).await {
                            warn!(%err, "send failed; treating the transport as down");
                            queue.extend(self.session.transport_closed(&err.to_string()));
                        }
                    },
                    // Sends are gated on Connected, which never overlaps
                    // an in-flight open
                    None => warn!("send with no transport available"),
                },
                SessionAction::FetchThreads => self.begin_fetch(),
            }
        }
        self.publish();
    }

    fn begin_open(&mut self, identity: Identity) {
        if self.opening.is_some() {
            debug!("open already in flight");
            return;
        }
        let Some(mut transport) = self.transport.take() else {
            warn!("no transport available for open");
            return;
        };

        self.opening = Some(tokio::spawn(async move {
            let result = transport.open(&identity).await;
            (transport, result)
        }));
    }

    fn begin_fetch(&mut self) {
        if self.fetch.is_some() {
            debug!("fetch already in flight");
            return;
        }
        let Some(user_id) = self.session.user_id().map(str::to_owned) else {
            self.session.reload_failed("no identity for thread fetch");
            return;
        };

        let api = Arc::clone(&self.api);
        self.fetch =
            Some(tokio::spawn(async move { api.fetch_support_threads(&user_id).await }));
    }

    fn publish(&mut self) {
        self.snapshot.send_replace(self.session.snapshot());
    }
}

/// Receive from the transport if the driver currently holds it; stay
/// pending while an open attempt owns it.
async fn transport_recv<T: Transport>(transport: &mut Option<T>) -> TransportEvent {
    match transport {
        Some(transport) => transport.recv().await,
        None => std::future::pending().await,
    }
}

/// Await the in-flight open if one exists; stay pending otherwise.
///
/// Returns the transport so the driver regains ownership. A task
/// failure (abort/panic) loses the transport and surfaces as a connect
/// error.
async fn poll_open<T>(
    opening: &mut Option<JoinHandle<(T, Result<(), TransportError>)>>,
) -> (Option<T>, Result<(), TransportError>) {
    match opening {
        Some(handle) => {
            let joined = handle.await;
            *opening = None;
            match joined {
                Ok((transport, result)) => (Some(transport), result),
                Err(err) => (None, Err(TransportError::Connect(err.to_string()))),
            }
        },
        None => std::future::pending().await,
    }
}

/// Await the in-flight fetch if one exists; stay pending otherwise so the
/// select loop ignores this arm.
async fn poll_fetch(
    fetch: &mut Option<JoinHandle<Result<Vec<ThreadRecord>, SupportApiError>>>,
) -> Result<Vec<ThreadRecord>, SupportApiError> {
    match fetch {
        Some(handle) => {
            let result = handle.await;
            *fetch = None;
            match result {
                Ok(result) => result,
                Err(err) => Err(SupportApiError::Task(err.to_string())),
            }
        },
        None => std::future::pending().await,
    }
}
