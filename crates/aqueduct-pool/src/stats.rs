//! Pool occupancy snapshots and cumulative metrics.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use crate::health::HealthStatus;

/// A point-in-time snapshot of pool occupancy.
///
/// Produced by [`Pool::snapshot`](crate::Pool::snapshot) from the pool's
/// current counters under a single short lock, so the numbers are mutually
/// consistent. Always available, including while the pool is degraded or
/// draining.
#[derive(Debug, Clone, Copy)]
pub struct PoolStats {
    /// Total connections managed by the pool (idle + active).
    pub total: u32,
    /// Connections currently unassigned and eligible for acquire.
    pub idle: u32,
    /// Connections currently held by callers.
    pub active: u32,
    /// Acquire calls queued because the pool was at capacity.
    pub waiting: u32,
    /// Maximum allowed connections.
    pub max: u32,
    /// Current health classification.
    pub health: HealthStatus,
}

impl PoolStats {
    /// Calculate the utilization percentage.
    #[must_use]
    pub fn utilization(&self) -> f64 {
        if self.max == 0 {
            return 0.0;
        }
        (f64::from(self.active) / f64::from(self.max)) * 100.0
    }

    /// Check if the pool is at capacity.
    #[must_use]
    pub fn is_at_capacity(&self) -> bool {
        self.total >= self.max
    }
}

/// Cumulative counters maintained off the hot-path lock.
#[derive(Debug, Default)]
pub(crate) struct Counters {
    pub(crate) connections_created: AtomicU64,
    pub(crate) connections_closed: AtomicU64,
    pub(crate) checkouts_successful: AtomicU64,
    pub(crate) checkouts_failed: AtomicU64,
    pub(crate) waiter_handoffs: AtomicU64,
    pub(crate) create_failures: AtomicU64,
    pub(crate) probes_performed: AtomicU64,
    pub(crate) probes_failed: AtomicU64,
    pub(crate) force_closed: AtomicU64,
}

impl Counters {
    pub(crate) fn inc(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn add(counter: &AtomicU64, n: u64) {
        counter.fetch_add(n, Ordering::Relaxed);
    }
}

/// Metrics collected from the pool since construction.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct PoolMetrics {
    /// Total connections created.
    pub connections_created: u64,
    /// Total connections closed.
    pub connections_closed: u64,
    /// Successful connection checkouts.
    pub checkouts_successful: u64,
    /// Failed connection checkouts (timeouts, shutdown, create failures).
    pub checkouts_failed: u64,
    /// Released connections handed directly to a queued waiter.
    pub waiter_handoffs: u64,
    /// Connection establishment attempts that failed.
    pub create_failures: u64,
    /// Health probes performed.
    pub probes_performed: u64,
    /// Health probes that failed.
    pub probes_failed: u64,
    /// Connections still outstanding when the shutdown grace period ended.
    pub force_closed: u64,
    /// Time since pool creation.
    pub uptime: Duration,
}

impl PoolMetrics {
    /// Calculate checkout success rate (0.0 to 1.0).
    #[must_use]
    pub fn checkout_success_rate(&self) -> f64 {
        let total = self.checkouts_successful + self.checkouts_failed;
        if total == 0 {
            return 1.0;
        }
        self.checkouts_successful as f64 / total as f64
    }

    /// Calculate health probe success rate (0.0 to 1.0).
    #[must_use]
    pub fn probe_success_rate(&self) -> f64 {
        if self.probes_performed == 0 {
            return 1.0;
        }
        let successful = self.probes_performed - self.probes_failed;
        successful as f64 / self.probes_performed as f64
    }
}

impl Counters {
    pub(crate) fn snapshot(&self, uptime: Duration) -> PoolMetrics {
        PoolMetrics {
            connections_created: self.connections_created.load(Ordering::Relaxed),
            connections_closed: self.connections_closed.load(Ordering::Relaxed),
            checkouts_successful: self.checkouts_successful.load(Ordering::Relaxed),
            checkouts_failed: self.checkouts_failed.load(Ordering::Relaxed),
            waiter_handoffs: self.waiter_handoffs.load(Ordering::Relaxed),
            create_failures: self.create_failures.load(Ordering::Relaxed),
            probes_performed: self.probes_performed.load(Ordering::Relaxed),
            probes_failed: self.probes_failed.load(Ordering::Relaxed),
            force_closed: self.force_closed.load(Ordering::Relaxed),
            uptime,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_utilization() {
        let stats = PoolStats {
            total: 10,
            idle: 5,
            active: 5,
            waiting: 0,
            max: 20,
            health: HealthStatus::Healthy,
        };
        assert!((stats.utilization() - 25.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_stats_at_capacity() {
        let stats = PoolStats {
            total: 10,
            idle: 0,
            active: 10,
            waiting: 3,
            max: 10,
            health: HealthStatus::Healthy,
        };
        assert!(stats.is_at_capacity());

        let stats2 = PoolStats {
            total: 10,
            idle: 5,
            active: 5,
            waiting: 0,
            max: 20,
            health: HealthStatus::Healthy,
        };
        assert!(!stats2.is_at_capacity());
    }

    #[test]
    fn test_metrics_success_rates() {
        let counters = Counters::default();
        Counters::add(&counters.checkouts_successful, 90);
        Counters::add(&counters.checkouts_failed, 10);
        Counters::add(&counters.probes_performed, 100);
        Counters::add(&counters.probes_failed, 5);

        let metrics = counters.snapshot(Duration::from_secs(3600));
        assert!((metrics.checkout_success_rate() - 0.9).abs() < f64::EPSILON);
        assert!((metrics.probe_success_rate() - 0.95).abs() < f64::EPSILON);
    }

    #[test]
    fn test_metrics_rates_with_no_activity() {
        let metrics = Counters::default().snapshot(Duration::ZERO);
        assert!((metrics.checkout_success_rate() - 1.0).abs() < f64::EPSILON);
        assert!((metrics.probe_success_rate() - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_zero_max_utilization() {
        let stats = PoolStats {
            total: 0,
            idle: 0,
            active: 0,
            waiting: 0,
            max: 0,
            health: HealthStatus::Healthy,
        };
        assert!((stats.utilization() - 0.0).abs() < f64::EPSILON);
    }
}
