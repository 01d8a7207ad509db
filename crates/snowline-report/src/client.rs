//! HTTP transport for catalog and report fetches.

use std::time::Duration;

use reqwest::Client;

use crate::error::FetchError;
use crate::retry::retry_with_backoff;

/// Thin wrapper over `reqwest::Client` with bounded timeouts and a retry
/// policy for transient failures.
///
/// The contract is deliberately narrow: `fetch(url)` returns the body of a
/// 2xx response as text, or a typed [`FetchError`]. Nothing above this layer
/// assumes more than "bytes plus a success/failure status".
pub struct HttpClient {
    client: Client,
    /// Maximum number of retry attempts after the first failure.
    max_retries: u32,
    /// Base delay in milliseconds for exponential backoff.
    backoff_base_ms: u64,
}

impl HttpClient {
    /// Creates an `HttpClient` with configured timeout, `User-Agent`, and
    /// retry policy.
    ///
    /// `max_retries` is the number of additional attempts after the first
    /// failure for retriable errors (timeouts, connect failures, 5xx). Set to
    /// `0` to disable retries.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed (e.g., invalid TLS config).
    pub fn new(
        timeout_secs: u64,
        user_agent: &str,
        max_retries: u32,
        backoff_base_ms: u64,
    ) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;
        Ok(Self {
            client,
            max_retries,
            backoff_base_ms,
        })
    }

    /// Fetches `url` and returns the response body, retrying transient
    /// failures.
    ///
    /// # Errors
    ///
    /// - [`FetchError::NotFound`] — HTTP 404 (not retried).
    /// - [`FetchError::UnexpectedStatus`] — any other non-2xx status (5xx
    ///   retried, 4xx not).
    /// - [`FetchError::Http`] — network or TLS failure after all retries
    ///   exhausted.
    pub async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        retry_with_backoff(self.max_retries, self.backoff_base_ms, || {
            let url = url.to_owned();
            async move {
                let response = self.client.get(&url).send().await?;
                let status = response.status();

                if status == reqwest::StatusCode::NOT_FOUND {
                    return Err(FetchError::NotFound { url });
                }

                if !status.is_success() {
                    return Err(FetchError::UnexpectedStatus {
                        status: status.as_u16(),
                        url,
                    });
                }

                Ok(response.text().await?)
            }
        })
        .await
    }
}
