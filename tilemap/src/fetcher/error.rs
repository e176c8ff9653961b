//! Fetch error types.

use thiserror::Error;

/// Why a single fetch attempt, or the fetcher itself, failed.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The request never produced a response (DNS, connect, timeout, ...).
    #[error("Request to {url} failed: {reason}")]
    Http { url: String, reason: String },

    /// The server answered with something other than 200.
    #[error("HTTP {status} from {url}")]
    Status { status: u16, url: String },

    /// The server answered 200 with an HTML error page.
    #[error("HTML error page instead of a tile from {url}")]
    HtmlErrorPage { url: String },

    /// The body is not a decodable image.
    #[error("Undecodable tile from {url}: {reason}")]
    Decode { url: String, reason: String },

    /// Failed to build the HTTP client.
    #[error("Failed to create HTTP client: {0}")]
    ClientBuild(String),

    /// I/O error, e.g. while spawning worker threads.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
