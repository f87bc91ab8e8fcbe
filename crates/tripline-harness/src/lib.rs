//! Deterministic test harness for the Tripline messaging layer.
//!
//! Fake implementations of the Environment, Transport, and SupportApi
//! seams so session behavior (debounce windows, retry backoff, toast
//! expiry) can be driven with virtual time and scripted I/O instead of
//! sleeps and servers.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod fake_transport;
pub mod sim_env;
pub mod stub_api;

pub use fake_transport::{FakeTransport, FakeTransportHandle};
pub use sim_env::{SimEnv, SimInstant};
pub use stub_api::StubSupportApi;
