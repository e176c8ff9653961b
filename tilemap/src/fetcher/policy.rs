//! Retry policy and response classification.
//!
//! A fetch attempt succeeds only when the server answers `200` with a body
//! that is not an HTML error page and decodes as an image. Anything else is
//! a failed attempt, retried immediately until the policy's budget is spent.

use image::DynamicImage;

use super::error::FetchError;
use super::http::HttpResponse;

// =============================================================================
// Retry Policy Constants
// =============================================================================

/// Default total attempts per tile, first try included.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Marker whose presence in a body identifies an HTML error page.
const HTML_MARKER: &[u8] = b"<html";

/// How many times a tile fetch is tried before the tile is given up.
///
/// Retries happen immediately, without backoff.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
}

impl RetryPolicy {
    /// Policy trying each fetch `max_attempts` times in total.
    ///
    /// At least one attempt is always made.
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
        }
    }

    /// Total attempts per fetch, first try included.
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Whether another attempt follows a failed attempt number `attempt`
    /// (1-based).
    pub fn should_retry(&self, attempt: u32) -> bool {
        attempt < self.max_attempts
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::immediate(DEFAULT_MAX_ATTEMPTS)
    }
}

/// Classifies a response, decoding the tile image on success.
///
/// # Arguments
///
/// * `url` - Requested URL, for error reporting
/// * `response` - Status and body returned by the server
///
/// # Returns
///
/// The decoded image, or the reason the attempt counts as failed.
pub fn classify(url: &str, response: &HttpResponse) -> Result<DynamicImage, FetchError> {
    if response.status != 200 {
        return Err(FetchError::Status {
            status: response.status,
            url: url.to_string(),
        });
    }

    if looks_like_html(&response.body) {
        return Err(FetchError::HtmlErrorPage {
            url: url.to_string(),
        });
    }

    image::load_from_memory(&response.body).map_err(|e| FetchError::Decode {
        url: url.to_string(),
        reason: e.to_string(),
    })
}

/// Case-insensitive search for the HTML marker anywhere in the body.
fn looks_like_html(body: &[u8]) -> bool {
    body.windows(HTML_MARKER.len())
        .any(|window| window.eq_ignore_ascii_case(HTML_MARKER))
}
