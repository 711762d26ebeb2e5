//! Error types for the Document Q&A core

use thiserror::Error;

/// Result type alias using the crate Error
pub type Result<T> = std::result::Result<T, Error>;

/// Document Q&A error types
#[derive(Error, Debug)]
pub enum Error {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("A submission is already in flight")]
    Busy,

    #[error("Upload failed: {0}")]
    Upload(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Credit refresh failed: {0}")]
    Credits(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Operation cancelled")]
    Cancelled,
}

impl Error {
    /// True for errors the caller can recover from by fixing its input
    /// and resubmitting (no session state was changed).
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Error::Validation(_) | Error::Busy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recoverable_classification() {
        assert!(Error::Validation("empty query".into()).is_recoverable());
        assert!(Error::Busy.is_recoverable());
        assert!(!Error::Upload("network".into()).is_recoverable());
        assert!(!Error::Query("network".into()).is_recoverable());
        assert!(!Error::Cancelled.is_recoverable());
    }
}
