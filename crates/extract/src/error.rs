//! Extraction Error Types
//!
//! Heuristic extraction never fails, it returns `None` or an empty list. Only
//! building a [`PatternSet`](crate::PatternSet) from authored definitions can
//! go wrong.

use derive_more::{Display, Error};

/// An extraction error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for extraction operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// A pattern's regular expression does not compile.
    #[display("invalid regex in pattern '{id}': {reason}")]
    InvalidPattern { id: String, reason: String },
    /// A pattern defines neither a direct answer nor a template.
    #[display("pattern '{_0}' has no question/answer")]
    IncompletePattern(#[error(not(source))] String),
    /// A collection with this id is already registered.
    #[display("duplicate pattern collection: {_0}")]
    DuplicateCollection(#[error(not(source))] String),
    /// No collection with this id is registered.
    #[display("unknown pattern collection: {_0}")]
    UnknownCollection(#[error(not(source))] String),
    /// Pattern definitions could not be parsed.
    #[display("malformed pattern definitions")]
    MalformedDefinitions,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        // Definitions are static; the same input fails the same way.
        false
    }
}
