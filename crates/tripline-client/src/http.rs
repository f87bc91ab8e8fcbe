//! Production HTTP message-history collaborator.

use async_trait::async_trait;
use tripline_proto::ThreadRecord;

use crate::api::SupportApi;
use crate::error::SupportApiError;

/// [`SupportApi`] backed by the booking server's REST endpoint.
pub struct HttpSupportApi {
    base_url: String,
    client: reqwest::Client,
    bearer_token: Option<String>,
}

impl HttpSupportApi {
    /// Create a collaborator for the given server base URL, e.g.
    /// `https://example.com`.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self { base_url: base_url.into(), client: reqwest::Client::new(), bearer_token: None }
    }

    /// Attach a bearer token to every request.
    #[must_use]
    pub fn with_bearer_token(mut self, token: impl Into<String>) -> Self {
        self.bearer_token = Some(token.into());
        self
    }
}

#[async_trait]
impl SupportApi for HttpSupportApi {
    async fn fetch_support_threads(
        &self,
        user_id: &str,
    ) -> Result<Vec<ThreadRecord>, SupportApiError> {
        let url = format!("{}/api/support/threads/{user_id}", self.base_url);
        let mut request = self.client.get(&url);
        if let Some(token) = &self.bearer_token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|err| SupportApiError::Http(err.to_string()))?;

        response
            .json::<Vec<ThreadRecord>>()
            .await
            .map_err(|err| SupportApiError::Decode(err.to_string()))
    }
}
