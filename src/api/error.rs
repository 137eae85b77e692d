//! API error taxonomy

use thiserror::Error;

/// Failure talking to the remote instance
///
/// The inbox layer does not interpret these; it wraps and propagates them.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Transport failure (DNS, TLS, connection, timeout)
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Missing, expired or rejected token
    #[error("not authorized (log in again)")]
    Unauthorized,

    /// Response body did not match the expected shape
    #[error("failed to decode response: {0}")]
    Decode(String),

    /// Non-success status from the server
    #[error("server error {status}: {body}")]
    Server {
        /// HTTP status code
        status: u16,
        /// Response body (usually `{"error": "..."}`)
        body: String,
    },
}
