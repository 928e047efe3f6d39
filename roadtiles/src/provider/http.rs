//! HTTP client abstraction for testability

use std::future::Future;
use std::time::Duration;

use bytes::{Bytes, BytesMut};
use tracing::{debug, trace, warn};

use super::types::ProviderError;

/// Response body ceiling (5 MiB).
pub const DEFAULT_MAX_BODY_BYTES: usize = 5 * 1024 * 1024;

/// Default per-request timeout (10 seconds).
pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;

/// Default User-Agent string for HTTP requests.
/// The upstream portal rejects requests without a browser-like User-Agent.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36";

/// Status, content type and body of a completed request.
///
/// Non-success statuses are returned as responses, not errors, so callers
/// can apply their own status policy (e.g. 404 is terminal).
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Bytes,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Trait for asynchronous HTTP client operations.
///
/// This abstraction allows for dependency injection and easier testing
/// by enabling mock HTTP clients in tests.
pub trait AsyncHttpClient: Send + Sync {
    /// Performs an async HTTP GET request with custom headers.
    ///
    /// # Arguments
    ///
    /// * `url` - The URL to request
    /// * `headers` - Slice of (header_name, header_value) pairs
    ///
    /// # Returns
    ///
    /// The response for any HTTP status, or a transport error.
    fn get(
        &self,
        url: &str,
        headers: &[(String, String)],
    ) -> impl Future<Output = Result<HttpResponse, ProviderError>> + Send;
}

/// Real HTTP client implementation using reqwest.
#[derive(Clone)]
pub struct AsyncReqwestClient {
    client: reqwest::Client,
    max_body_bytes: usize,
}

impl AsyncReqwestClient {
    /// Creates a client with the given request timeout and User-Agent.
    pub fn new(timeout: Duration, user_agent: &str) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_keepalive(Duration::from_secs(30))
            .build()
            .map_err(|e| ProviderError::ClientInit(e.to_string()))?;

        Ok(Self {
            client,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        })
    }

    /// Creates a client with the default 10 s timeout and User-Agent.
    pub fn with_defaults() -> Result<Self, ProviderError> {
        Self::new(Duration::from_millis(DEFAULT_TIMEOUT_MS), DEFAULT_USER_AGENT)
    }

    /// Overrides the response body ceiling.
    pub fn with_max_body_bytes(mut self, max_body_bytes: usize) -> Self {
        self.max_body_bytes = max_body_bytes;
        self
    }
}

impl AsyncHttpClient for AsyncReqwestClient {
    async fn get(
        &self,
        url: &str,
        headers: &[(String, String)],
    ) -> Result<HttpResponse, ProviderError> {
        trace!(url = url, "HTTP GET request starting");

        let mut request = self.client.get(url);
        for (name, value) in headers {
            request = request.header(name.as_str(), value.as_str());
        }

        let mut response = match request.send().await {
            Ok(resp) => {
                debug!(
                    url = url,
                    status = resp.status().as_u16(),
                    "HTTP response received"
                );
                resp
            }
            Err(e) => {
                warn!(
                    url = url,
                    error = %e,
                    is_connect = e.is_connect(),
                    is_timeout = e.is_timeout(),
                    "HTTP request failed"
                );
                return Err(ProviderError::Transport(e.to_string()));
            }
        };

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        if let Some(len) = response.content_length() {
            if len as usize > self.max_body_bytes {
                warn!(url = url, bytes = len, "Response body exceeds size limit");
                return Err(ProviderError::InvalidResponse(format!(
                    "body of {} bytes exceeds limit of {}",
                    len, self.max_body_bytes
                )));
            }
        }

        // Stream the body so an unannounced oversize payload is cut off early.
        let mut body = BytesMut::new();
        loop {
            match response.chunk().await {
                Ok(Some(chunk)) => {
                    if body.len() + chunk.len() > self.max_body_bytes {
                        warn!(url = url, "Response body exceeds size limit");
                        return Err(ProviderError::InvalidResponse(format!(
                            "body exceeds limit of {} bytes",
                            self.max_body_bytes
                        )));
                    }
                    body.extend_from_slice(&chunk);
                }
                Ok(None) => break,
                Err(e) => {
                    warn!(url = url, error = %e, "Failed to read response body");
                    return Err(ProviderError::Transport(format!(
                        "failed to read response: {}",
                        e
                    )));
                }
            }
        }

        trace!(url = url, bytes = body.len(), "HTTP response body read");
        Ok(HttpResponse {
            status,
            content_type,
            body: body.freeze(),
        })
    }
}
