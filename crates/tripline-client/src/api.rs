//! Message-history collaborator interface.

use async_trait::async_trait;
use tripline_proto::ThreadRecord;

use crate::error::SupportApiError;

/// External collaborator serving the authoritative per-user support
/// thread snapshot, invoked by the reload coordinator's execution step.
///
/// Dyn-compatible so the driver can hold any backend; tests use a
/// counting stub.
#[async_trait]
pub trait SupportApi: Send + Sync {
    /// Fetch all support threads for the given user.
    ///
    /// The result replaces the in-memory ticket board wholesale. Failure
    /// retains the last-known board and the next trigger retries.
    async fn fetch_support_threads(
        &self,
        user_id: &str,
    ) -> Result<Vec<ThreadRecord>, SupportApiError>;
}
