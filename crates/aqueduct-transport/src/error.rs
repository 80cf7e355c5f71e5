//! Transport error types.

use thiserror::Error;

/// Errors surfaced by a transport or connector.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TransportError {
    /// A new link could not be established.
    #[error("connect failed: {0}")]
    Connect(String),

    /// The link was severed mid-operation.
    #[error("connection closed")]
    Closed,

    /// Query execution failed.
    #[error("query error: {0}")]
    Query(String),

    /// A begin/commit/rollback operation failed.
    #[error("transaction error: {0}")]
    Transaction(String),

    /// IO error on the underlying link.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl TransportError {
    /// Check if this error is transient and may succeed on retry.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Connect(_) | Self::Closed | Self::Io(_))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(TransportError::Closed.is_transient());
        assert!(TransportError::Connect("refused".into()).is_transient());
        assert!(!TransportError::Query("syntax".into()).is_transient());
        assert!(!TransportError::Transaction("deadlock victim".into()).is_transient());
    }

    #[test]
    fn test_display() {
        let err = TransportError::Connect("refused".into());
        assert_eq!(err.to_string(), "connect failed: refused");
    }
}
