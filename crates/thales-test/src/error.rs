//! Test error types.

use thiserror::Error;

/// Errors raised while building requests or reading responses.
#[derive(Debug, Error)]
pub enum TestError {
    /// A request could not be assembled.
    #[error("request build error: {0}")]
    RequestBuild(String),

    /// The response body could not be read.
    #[error("body read error: {0}")]
    BodyRead(String),

    /// JSON encoding or decoding failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A header name or value is not valid.
    #[error("invalid header: {0}")]
    InvalidHeader(String),
}
