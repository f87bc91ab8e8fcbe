//! Canned message-history collaborator.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use tripline_client::{SupportApi, SupportApiError};
use tripline_proto::ThreadRecord;

/// [`SupportApi`] stub serving canned thread snapshots and counting
/// fetches, so tests can assert on debounce behavior.
#[derive(Default)]
pub struct StubSupportApi {
    threads: Mutex<Vec<ThreadRecord>>,
    calls: AtomicUsize,
    failing: AtomicBool,
}

impl StubSupportApi {
    /// Create a stub serving an empty snapshot.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the snapshot served by subsequent fetches.
    #[allow(clippy::unwrap_used)]
    pub fn set_threads(&self, threads: Vec<ThreadRecord>) {
        *self.threads.lock().unwrap() = threads;
    }

    /// Make subsequent fetches fail (or succeed again).
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Number of fetches performed so far.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SupportApi for StubSupportApi {
    #[allow(clippy::unwrap_used)]
    async fn fetch_support_threads(
        &self,
        _user_id: &str,
    ) -> Result<Vec<ThreadRecord>, SupportApiError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(SupportApiError::Http("stubbed failure".to_owned()));
        }
        Ok(self.threads.lock().unwrap().clone())
    }
}
