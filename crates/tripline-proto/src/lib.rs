//! Wire model for the Tripline real-time channel.
//!
//! Inbound frames are JSON objects carrying a `type` discriminator. This
//! crate provides:
//!
//! - [`EventKind`]: the typed discriminator, with a lossless `unknown`
//!   fallback for unrecognized wire strings
//! - [`Payload`]: typed views over raw frames. Parsing is infallible at the
//!   frame level - a frame that does not match any known shape degrades to
//!   [`Payload::Unknown`] with the raw value preserved
//! - [`Envelope`]: outbound frame construction with client-generated ids
//!   and timestamps
//! - [`ThreadRecord`]: the support-thread snapshot returned by the message
//!   history collaborator, accepting both the structured and the legacy
//!   field sets
//!
//! Protocol logic (classification, stores, debounce) lives in
//! `tripline-core`; this crate is shape-only.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod envelope;
mod kind;
mod payload;
mod thread;

pub use envelope::Envelope;
pub use kind::EventKind;
pub use payload::{
    BookingNotification, ChannelNotice, ChatMessage, OrderUpdate, Payload, SendReceipt,
    SupportUpdate, SystemMessage,
};
pub use thread::ThreadRecord;
