//! Session runtime for the Tripline client messaging layer.
//!
//! Wires the Sans-IO state machines from [`tripline_core`] to real I/O:
//! an injectable [`Transport`] for the persistent channel, a
//! [`SupportApi`] collaborator for thread reloads, and a tokio driver
//! loop that owns all timers.
//!
//! # Architecture
//!
//! - [`Session`]: the explicit session-scoped context object. One per
//!   logged-in user, constructed at login, dropped at logout. Consumes
//!   transport events and ticks, returns [`SessionAction`]s.
//! - [`SessionDriver`]: tokio event loop executing those actions and
//!   publishing [`SessionSnapshot`]s on a watch channel for presentation
//!   subscribers.
//! - [`SessionHandle`]: cloneable front for user operations (sends,
//!   read-state changes, dismissals, shutdown).
//!
//! # Transports
//!
//! With the `websocket` feature enabled, [`ws::WsTransport`] provides the
//! production WebSocket transport. With the `http` feature,
//! [`http::HttpSupportApi`] provides the production history collaborator.
//! Tests substitute fakes; nothing in the runtime knows the difference.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod api;
mod driver;
mod error;
mod session;
mod system_env;
mod transport;

#[cfg(feature = "http")]
pub mod http;
#[cfg(feature = "websocket")]
pub mod ws;

pub use api::SupportApi;
pub use driver::{SessionCommand, SessionDriver, SessionHandle};
pub use error::{SessionClosed, SupportApiError, TransportError};
pub use session::{Session, SessionAction, SessionConfig, SessionSnapshot};
pub use system_env::SystemEnv;
pub use transport::{Transport, TransportEvent};
pub use tripline_core::{
    Channel, ChannelError, Environment, EventKind, Identity, InboundEvent, LinkState, Severity,
    Ticket, TicketLine, Toast,
};
