//! Core state machines for the Tripline client messaging layer.
//!
//! Everything here is Sans-IO and follows the action pattern: methods take
//! the current time as input and return actions (or plain values) for the
//! runtime to execute. No state machine touches a clock, a socket, or a
//! timer itself, which keeps the whole layer deterministic under test.
//!
//! # Components
//!
//! - [`Channel`]: connection lifecycle (connect, reconnect backoff,
//!   send gating, frozen disconnect)
//! - [`classify`]: raw frame to [`InboundEvent`] mapping
//! - [`MessageStore`]: append-only id-keyed event log with derived
//!   unread count
//! - [`ReloadCoordinator`]: trailing-edge debounce for support-data
//!   refreshes
//! - [`TicketBoard`]: support-thread aggregation from wholesale snapshots
//! - [`NotificationDispatcher`]: transient toast presentations
//! - [`Environment`]: time/randomness injection boundary

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod channel;
mod classify;
pub mod env;
mod error;
mod event;
mod notify;
mod reload;
mod store;
mod ticket;

pub use channel::{Channel, ChannelAction, ChannelConfig, Identity, LinkState};
pub use classify::classify;
pub use env::Environment;
pub use error::ChannelError;
pub use event::InboundEvent;
pub use notify::{NotificationDispatcher, NotifyConfig, Severity, Toast};
pub use reload::{ReloadConfig, ReloadCoordinator};
pub use store::MessageStore;
pub use ticket::{Ticket, TicketBoard, TicketLine};
pub use tripline_proto::EventKind;
