use std::time::Duration;

use tracing::debug;

use crate::errors::ClientError;
use crate::model::Credential;

const API_KEY_HEADER: &str = "x-goog-api-key";

/// A completed request/response exchange, whatever its status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpReply {
    pub status: u16,
    /// Canonical reason phrase for `status`, possibly empty.
    pub status_text: String,
    pub body: String,
}

impl HttpReply {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Request/response channel to the remote service.
///
/// Implementations return `Ok` for every exchange that produced a response
/// (including error statuses) and `ClientError::Transport` when no response
/// was obtained.
#[async_trait::async_trait]
pub trait HttpTransport: Send + Sync {
    async fn get(&self, url: &str, credential: &Credential) -> Result<HttpReply, ClientError>;

    async fn post_json(
        &self,
        url: &str,
        credential: &Credential,
        body: &serde_json::Value,
    ) -> Result<HttpReply, ClientError>;
}

/// Default transport backed by a shared `reqwest::Client`.
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("storyteller/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ClientError::Config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client })
    }

    async fn into_reply(response: reqwest::Response) -> Result<HttpReply, ClientError> {
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ClientError::Transport(format!("failed to read response body: {e}")))?;
        Ok(HttpReply {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or_default().to_string(),
            body,
        })
    }
}

#[async_trait::async_trait]
impl HttpTransport for ReqwestTransport {
    async fn get(&self, url: &str, credential: &Credential) -> Result<HttpReply, ClientError> {
        debug!(event = "http.get", url = %url);
        let response = self
            .client
            .get(url)
            .header(API_KEY_HEADER, credential.as_str())
            .send()
            .await
            .map_err(|e| ClientError::Transport(format!("request failed: {e}")))?;
        Self::into_reply(response).await
    }

    async fn post_json(
        &self,
        url: &str,
        credential: &Credential,
        body: &serde_json::Value,
    ) -> Result<HttpReply, ClientError> {
        debug!(event = "http.post", url = %url);
        let response = self
            .client
            .post(url)
            .header(API_KEY_HEADER, credential.as_str())
            .json(body)
            .send()
            .await
            .map_err(|e| ClientError::Transport(format!("request failed: {e}")))?;
        Self::into_reply(response).await
    }
}
