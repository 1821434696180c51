//! Storage Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction. Callers branch on [`ErrorKind`],
//! never on message content.

use derive_more::{Display, Error};

/// A storage error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for storage operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// Transport-level failure (DNS, connection reset, truncated body).
    #[display("network error: {_0}")]
    Network(#[error(not(source))] String),
    /// The server answered with a non-2xx status.
    #[display("HTTP error {status} from {url}")]
    HttpStatus {
        /// Status code of the failed response.
        status: u16,
        /// URL that was requested.
        url: String,
    },
    /// The server answered 404/410: the asset does not exist.
    #[display("resource not found: {_0}")]
    NotFound(#[error(not(source))] String),
    /// Bucket key contains invalid characters or escapes the bucket root.
    #[display("invalid key: {_0}")]
    InvalidKey(#[error(not(source))] String),
    /// Base URL is not an absolute http(s) URL.
    #[display("invalid URL: {_0}")]
    InvalidUrl(#[error(not(source))] String),
    /// Response body could not be decoded into the requested shape.
    #[display("invalid response body from {_0}")]
    InvalidBody(#[error(not(source))] String),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Network(_) => true,
            Self::HttpStatus { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }

    /// Returns `true` for failures that happened on the wire (and are
    /// therefore subject to [`fetch_with_retry`](crate::fetch_with_retry)).
    pub fn is_request_failure(&self) -> bool {
        matches!(self, Self::Network(_) | Self::HttpStatus { .. } | Self::NotFound(_))
    }

    /// Classify a non-2xx status code.
    pub fn from_status(status: u16, url: impl Into<String>) -> Self {
        match status {
            404 | 410 => Self::NotFound(url.into()),
            _ => Self::HttpStatus { status, url: url.into() },
        }
    }
}
