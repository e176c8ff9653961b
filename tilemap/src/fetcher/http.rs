//! HTTP client abstraction for testability

use std::sync::Arc;
use std::time::Duration;

use super::error::FetchError;

/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Raw HTTP response: status code and body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// A `200 OK` response with `body`.
    pub fn ok(body: impl Into<Vec<u8>>) -> Self {
        Self {
            status: 200,
            body: body.into(),
        }
    }
}

/// Trait for HTTP client operations.
///
/// Every fetch worker owns one client. The abstraction lets tests replace the
/// network with scripted responses.
pub trait HttpClient: Send + Sync {
    /// Performs an HTTP GET request.
    ///
    /// Non-200 statuses are returned as a response, not an error; only
    /// transport failures are errors.
    fn get(&self, url: &str) -> Result<HttpResponse, FetchError>;
}

impl<T: HttpClient + ?Sized> HttpClient for Arc<T> {
    fn get(&self, url: &str) -> Result<HttpResponse, FetchError> {
        (**self).get(url)
    }
}

/// Real HTTP client implementation using reqwest.
pub struct ReqwestClient {
    client: reqwest::blocking::Client,
}

impl ReqwestClient {
    /// Creates a client keeping at most `max_connections` idle connections
    /// per host.
    pub fn new(max_connections: usize, timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .pool_max_idle_per_host(max_connections.max(1))
            .user_agent(concat!("tilemap/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| FetchError::ClientBuild(e.to_string()))?;

        Ok(Self { client })
    }
}

impl HttpClient for ReqwestClient {
    fn get(&self, url: &str) -> Result<HttpResponse, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|e| FetchError::Http {
                url: url.to_string(),
                reason: e.to_string(),
            })?;

        let status = response.status().as_u16();

        // Read response body
        let body = response
            .bytes()
            .map(|b| b.to_vec())
            .map_err(|e| FetchError::Http {
                url: url.to_string(),
                reason: format!("failed to read response: {}", e),
            })?;

        Ok(HttpResponse { status, body })
    }
}
