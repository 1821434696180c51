//! Cache Error Types
//!
//! Structured errors using `exn` for automatic location tracking and error
//! tree construction.

use derive_more::{Display, Error};

/// A cache error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for cache and model operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// Book or unit identifier is empty or not alphanumeric.
    #[display("invalid unit key: {_0}")]
    InvalidKey(#[error(not(source))] String),
    /// A resource record violates the model (e.g. two locations at once).
    #[display("invalid resource: {_0}")]
    InvalidResource(#[error(not(source))] String),
    /// Unknown resource type name.
    #[display("unknown resource type: {_0}")]
    UnknownResourceType(#[error(not(source))] String),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        false
    }
}
