//! Library Error Types
//!
//! Resolution itself never fails: loader errors are logged, published as
//! events and treated as a miss. These errors surface from module sources
//! and from loading module files at start-up.

use derive_more::{Display, Error};

/// A library error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for library operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The module source could not be reached.
    #[display("module source unavailable: {_0}")]
    SourceUnavailable(#[error(not(source))] String),
    /// A module directory or file could not be read.
    #[display("cannot read module path: {_0}")]
    Read(#[error(not(source))] String),
    /// A module file is not a JSON object of named exports.
    #[display("malformed module: {_0}")]
    MalformedModule(#[error(not(source))] String),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::SourceUnavailable(_) | Self::Read(_) => true,
            Self::MalformedModule(_) => false,
        }
    }
}
