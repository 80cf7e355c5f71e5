//! Connection state and metadata tracked by the pool.

use aqueduct_transport::Transport;
// tokio's Instant respects the paused test clock, which std's does not.
use tokio::time::Instant;

/// Connection state tracked by the pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Connection is idle and available for acquire.
    Idle,
    /// Connection is currently held by exactly one caller.
    Active,
    /// Connection is closed and no longer usable.
    Closed,
}

impl ConnectionState {
    /// Check if the connection is available for checkout.
    #[must_use]
    pub fn is_available(&self) -> bool {
        matches!(self, Self::Idle)
    }
}

/// Metadata about a pooled connection.
#[derive(Debug, Clone)]
pub struct ConnectionMetadata {
    /// Unique identifier for this connection.
    pub id: u64,
    /// When the connection was created.
    pub created_at: Instant,
    /// When the connection was last used.
    pub last_used_at: Instant,
    /// Number of times the connection has been checked out.
    pub checkout_count: u64,
    /// Current state of the connection.
    pub state: ConnectionState,
}

impl ConnectionMetadata {
    /// Create metadata for a new connection.
    #[must_use]
    pub fn new(id: u64) -> Self {
        let now = Instant::now();
        Self {
            id,
            created_at: now,
            last_used_at: now,
            checkout_count: 0,
            state: ConnectionState::Idle,
        }
    }

    /// Check if the connection has exceeded its maximum lifetime.
    #[must_use]
    pub fn is_expired(&self, max_lifetime: std::time::Duration) -> bool {
        self.created_at.elapsed() > max_lifetime
    }

    /// Check if the connection has been idle too long.
    #[must_use]
    pub fn is_idle_expired(&self, idle_timeout: std::time::Duration) -> bool {
        self.last_used_at.elapsed() > idle_timeout
    }

    /// Mark the connection as checked out.
    pub fn mark_checkout(&mut self) {
        self.last_used_at = Instant::now();
        self.checkout_count += 1;
        self.state = ConnectionState::Active;
    }

    /// Mark the connection as returned to idle.
    pub fn mark_checkin(&mut self) {
        self.last_used_at = Instant::now();
        self.state = ConnectionState::Idle;
    }
}

/// A live connection plus its bookkeeping, owned by the pool while idle and
/// by a [`PooledConnection`](crate::pool::PooledConnection) while active.
pub(crate) struct Conn {
    pub(crate) transport: Box<dyn Transport>,
    pub(crate) meta: ConnectionMetadata,
    /// Set between a transaction's begin and its commit/rollback. A
    /// connection released with this still set was abandoned mid-transaction
    /// and must be closed, not re-idled.
    pub(crate) tx_open: bool,
}

impl Conn {
    pub(crate) fn new(id: u64, transport: Box<dyn Transport>) -> Self {
        Self {
            transport,
            meta: ConnectionMetadata::new(id),
            tx_open: false,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_connection_state_availability() {
        assert!(ConnectionState::Idle.is_available());
        assert!(!ConnectionState::Active.is_available());
        assert!(!ConnectionState::Closed.is_available());
    }

    #[test]
    fn test_metadata_new() {
        let meta = ConnectionMetadata::new(7);
        assert_eq!(meta.id, 7);
        assert_eq!(meta.checkout_count, 0);
        assert_eq!(meta.state, ConnectionState::Idle);
    }

    #[test]
    fn test_metadata_checkout_checkin() {
        let mut meta = ConnectionMetadata::new(1);
        meta.mark_checkout();
        assert_eq!(meta.checkout_count, 1);
        assert_eq!(meta.state, ConnectionState::Active);

        meta.mark_checkin();
        assert_eq!(meta.state, ConnectionState::Idle);
    }

    #[test]
    fn test_metadata_not_expired_when_fresh() {
        let meta = ConnectionMetadata::new(1);
        assert!(!meta.is_expired(Duration::from_secs(60)));
        assert!(!meta.is_idle_expired(Duration::from_secs(60)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_metadata_expires_past_lifetime() {
        let meta = ConnectionMetadata::new(1);
        tokio::time::advance(Duration::from_secs(31)).await;
        assert!(meta.is_expired(Duration::from_secs(30)));
        assert!(meta.is_idle_expired(Duration::from_secs(30)));
        assert!(!meta.is_expired(Duration::from_secs(60)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_checkout_refreshes_last_used() {
        let mut meta = ConnectionMetadata::new(1);
        tokio::time::advance(Duration::from_secs(31)).await;
        meta.mark_checkout();
        assert!(!meta.is_idle_expired(Duration::from_secs(30)));
        // Lifetime is measured from creation, not last use.
        assert!(meta.is_expired(Duration::from_secs(30)));
    }
}
