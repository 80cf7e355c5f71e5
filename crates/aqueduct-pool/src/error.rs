//! Pool error types.

use std::time::Duration;

use aqueduct_transport::TransportError;
use thiserror::Error;

/// Errors that can occur during pool operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum PoolError {
    /// No connection became available within the acquire timeout.
    ///
    /// Retryable: the caller should retry or fail the enclosing request.
    #[error("no connection became available within {waited:?}")]
    PoolExhausted {
        /// How long the acquire waited before giving up.
        waited: Duration,
    },

    /// The pool is draining and rejects new acquires.
    #[error("pool is shutting down")]
    ShutdownInProgress,

    /// The transport could not establish a new connection.
    ///
    /// Retryable: the pool's maintenance tick retries replacement on its
    /// own interval rather than hot-looping.
    #[error("failed to establish connection: {0}")]
    ConnectionCreateFailed(#[source] TransportError),

    /// A unit of work or its commit failed.
    ///
    /// Rollback has already been attempted by the time this surfaces.
    #[error("transaction failed: {0}")]
    TransactionFailed(#[source] TransportError),

    /// A transaction was started inside another on the same logical scope.
    ///
    /// This is a caller programming error, not a pool failure, and is not
    /// retryable.
    #[error("transaction already in progress on this scope")]
    NestedTransaction,

    /// Pool configuration error.
    #[error("pool configuration error: {0}")]
    Configuration(String),
}

impl PoolError {
    /// Check if this error is transient and may succeed on retry.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::PoolExhausted { .. } | Self::ConnectionCreateFailed(_)
        )
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        let exhausted = PoolError::PoolExhausted {
            waited: Duration::from_secs(30),
        };
        assert!(exhausted.is_transient());
        assert!(
            PoolError::ConnectionCreateFailed(TransportError::Connect("refused".into()))
                .is_transient()
        );
        assert!(!PoolError::NestedTransaction.is_transient());
        assert!(!PoolError::ShutdownInProgress.is_transient());
    }

    #[test]
    fn test_display_includes_wait() {
        let err = PoolError::PoolExhausted {
            waited: Duration::from_millis(250),
        };
        assert!(err.to_string().contains("250ms"));
    }
}
