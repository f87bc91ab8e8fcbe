//! Runtime error types.
//!
//! Transport and fetch failures are recovered locally (backoff, retained
//! state); nothing here is fatal to the enclosing application.

use thiserror::Error;

/// Transport-level errors.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Transport setup failed.
    #[error("connection failed: {0}")]
    Connect(String),

    /// An open transport failed mid-stream.
    #[error("stream error: {0}")]
    Stream(String),
}

/// Errors from the message-history collaborator.
#[derive(Debug, Error)]
pub enum SupportApiError {
    /// The fetch request itself failed.
    #[error("support thread fetch failed: {0}")]
    Http(String),

    /// The response body did not decode.
    #[error("support thread response malformed: {0}")]
    Decode(String),

    /// The background fetch task aborted or panicked.
    #[error("support thread fetch task failed: {0}")]
    Task(String),
}

/// The session driver has shut down; no further commands are accepted.
#[derive(Debug, Error)]
#[error("session driver has shut down")]
pub struct SessionClosed;
