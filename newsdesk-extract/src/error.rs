//! Error types for article extraction

use thiserror::Error;

/// Errors that can occur while fetching an article page
#[derive(Debug, Error)]
pub enum ExtractError {
    /// The candidate URL could not be parsed or has a non-HTTP scheme
    #[error("Invalid URL '{0}'")]
    InvalidUrl(String),

    /// The HTTP request failed (network error, timeout, TLS failure)
    #[error("Request failed: {0}")]
    RequestFailed(String),

    /// The server answered with a non-success status
    #[error("Unexpected status {status} from {url}")]
    Status {
        /// HTTP status code
        status: u16,
        /// URL that was requested
        url: String,
    },

    /// The response body could not be read
    #[error("Failed to read response body: {0}")]
    Body(String),
}
