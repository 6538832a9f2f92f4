//! # HTTP Transport
//!
//! A reqwest client wrapped in `reqwest_middleware` with exponential backoff
//! retries for transient failures. It is the production [`Transport`] the
//! upstream client talks through: relative paths are joined onto a base URL,
//! query pairs are URL-encoded, and non-2xx answers become
//! [`UpstreamError::Status`] with the server's error body attached.

use std::time::Duration;

use reqwest::header::ACCEPT;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{policies::ExponentialBackoff, RetryTransientMiddleware};
use serde_json::Value;
use url::Url;

use crate::error::UpstreamError;
use crate::upstream::Transport;

/// User agent sent with every request.
const USER_AGENT: &str = "lib_trials/0.1";

/// A flexible asynchronous JSON-over-HTTP transport.
pub struct HttpTransport {
    /// The underlying middleware-enabled client.
    inner: ClientWithMiddleware,
    /// The base URL to which all relative paths are joined.
    base_url: Url,
}

impl HttpTransport {
    /// Creates a transport with a retry policy.
    ///
    /// # Arguments
    /// * `base_url` - Absolute base URL, e.g. `https://clinicaltrials.gov/api/v2/`.
    ///   A missing trailing slash is added so relative joins keep the last segment.
    /// * `max_retries` - Transient-failure retries performed by the middleware.
    /// * `timeout` - Per-request timeout.
    ///
    /// # Errors
    /// [`UpstreamError::InvalidUrl`] when the base URL is not absolute, or
    /// [`UpstreamError::Transport`] when the client cannot be built.
    pub fn new(base_url: &str, max_retries: u32, timeout: Duration) -> Result<Self, UpstreamError> {
        let mut base = base_url.trim().to_string();
        if !base.ends_with('/') {
            base.push('/');
        }
        let url = Url::parse(&base).map_err(|e| UpstreamError::InvalidUrl(format!("{base}: {e}")))?;

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| UpstreamError::Transport(e.to_string()))?;

        // Configure an exponential backoff policy for transient failures
        let retry_policy = ExponentialBackoff::builder().build_with_max_retries(max_retries);
        let inner = ClientBuilder::new(client)
            .with(RetryTransientMiddleware::new_with_policy(retry_policy))
            .build();

        Ok(Self { inner, base_url: url })
    }

    /// The base URL every path is joined onto.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }
}

impl Transport for HttpTransport {
    async fn get_json(
        &self,
        path: &str,
        params: &[(&'static str, String)],
    ) -> Result<Value, UpstreamError> {
        let full_url = self
            .base_url
            .join(path)
            .map_err(|e| UpstreamError::InvalidUrl(e.to_string()))?;

        tracing::debug!(url = %full_url, "GET");
        let response = self
            .inner
            .get(full_url)
            .query(params)
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| UpstreamError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            // Capture the error body as a string for debugging
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(status = status.as_u16(), path, "upstream returned an error status");
            return Err(UpstreamError::Status {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| UpstreamError::Decode(e.to_string()))
    }
}
