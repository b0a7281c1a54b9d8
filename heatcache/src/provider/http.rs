//! HTTP client abstraction for testability

use std::future::Future;
use std::time::Duration;

use tracing::{debug, trace, warn};

use super::types::{TileRequest, TransportError};

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// User-Agent sent with every request. The heatmap CDN rejects requests
/// without one.
const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64; rv:128.0) Gecko/20100101 Firefox/128.0";

/// Status and body of a completed HTTP exchange.
///
/// Any status is a completed exchange; only failures to get a response at
/// all are reported as [`TransportError`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// First bytes of the body as lossy UTF-8, for log messages.
    pub fn body_excerpt(&self, max_len: usize) -> String {
        let end = self.body.len().min(max_len);
        String::from_utf8_lossy(&self.body[..end]).into_owned()
    }
}

/// Trait for asynchronous HTTP client operations.
///
/// This abstraction allows for dependency injection and easier testing
/// by enabling mock HTTP clients in tests.
pub trait AsyncHttpClient: Send + Sync {
    /// Performs an async HTTP GET request.
    ///
    /// # Arguments
    ///
    /// * `request` - URL and query parameters to send
    ///
    /// # Returns
    ///
    /// The response status and body, or a transport error if no response
    /// was received.
    fn get(
        &self,
        request: &TileRequest,
    ) -> impl Future<Output = Result<HttpResponse, TransportError>> + Send;
}

/// Async HTTP client implementation using reqwest.
#[derive(Clone)]
pub struct ReqwestClient {
    client: reqwest::Client,
}

impl ReqwestClient {
    /// Creates a new ReqwestClient with default configuration.
    pub fn new() -> Result<Self, TransportError> {
        Self::with_timeout(DEFAULT_TIMEOUT_SECS)
    }

    /// Creates a new ReqwestClient with custom timeout.
    ///
    /// Keeps idle connections alive so a batch of tile requests reuses them.
    pub fn with_timeout(timeout_secs: u64) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent(DEFAULT_USER_AGENT)
            .pool_max_idle_per_host(32)
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_keepalive(Duration::from_secs(30))
            .tcp_nodelay(true)
            .build()
            .map_err(|e| {
                TransportError::Client(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self { client })
    }
}

impl AsyncHttpClient for ReqwestClient {
    async fn get(&self, request: &TileRequest) -> Result<HttpResponse, TransportError> {
        trace!(url = %request.url, "HTTP GET request starting");

        let response = match self
            .client
            .get(&request.url)
            .query(&request.query)
            .send()
            .await
        {
            Ok(resp) => resp,
            Err(e) => {
                // The full URL carries the signed query string
                let e = e.without_url();
                warn!(
                    url = %request.url,
                    error = %e,
                    is_connect = e.is_connect(),
                    is_timeout = e.is_timeout(),
                    is_request = e.is_request(),
                    "HTTP request failed"
                );
                return Err(TransportError::from(e));
            }
        };

        let status = response.status().as_u16();
        debug!(url = %request.url, status, "HTTP response received");

        match response.bytes().await {
            Ok(bytes) => {
                trace!(url = %request.url, bytes = bytes.len(), "HTTP response body read");
                Ok(HttpResponse::new(status, bytes.to_vec()))
            }
            Err(e) => {
                let e = e.without_url();
                warn!(url = %request.url, error = %e, "Failed to read response body");
                Err(TransportError::from(e))
            }
        }
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            TransportError::Timeout(e.to_string())
        } else if e.is_connect() {
            TransportError::Connect(e.to_string())
        } else {
            TransportError::Other(e.to_string())
        }
    }
}
