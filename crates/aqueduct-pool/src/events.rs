//! Pool lifecycle notifications.
//!
//! Observers subscribe through [`Pool::subscribe`](crate::Pool::subscribe)
//! and receive events on a broadcast channel, decoupled from the
//! acquire/release hot path. Sends never block; a lagging subscriber misses
//! events rather than stalling the pool.

use crate::health::HealthStatus;

/// Why a connection was closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum CloseReason {
    /// The connection exceeded its maximum lifetime.
    Expired,
    /// The connection sat idle past the idle timeout.
    IdleTimeout,
    /// The connection failed a probe or was abandoned mid-transaction.
    Broken,
    /// The pool is shutting down.
    Shutdown,
}

/// A pool lifecycle notification.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub enum PoolEvent {
    /// A new connection was established.
    ConnectionCreated {
        /// Connection identity.
        id: u64,
    },
    /// A connection was closed.
    ConnectionClosed {
        /// Connection identity.
        id: u64,
        /// Why it was closed.
        reason: CloseReason,
    },
    /// An acquire gave up after its timeout.
    AcquireTimedOut,
    /// The pool's health classification changed.
    HealthChanged {
        /// The new status.
        status: HealthStatus,
    },
    /// Shutdown was initiated.
    ShutdownStarted,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_events_are_cloneable() {
        let ev = PoolEvent::ConnectionClosed {
            id: 3,
            reason: CloseReason::Expired,
        };
        let copy = ev.clone();
        assert!(matches!(
            copy,
            PoolEvent::ConnectionClosed {
                id: 3,
                reason: CloseReason::Expired,
            }
        ));
    }
}
