//! Background health monitoring.
//!
//! The monitor is an explicit, cancellable task owned by the pool's
//! lifecycle: spawned at construction, signalled and joined during shutdown.
//! Each tick it sweeps expired idle connections, replenishes toward the
//! configured minimum, then borrows one connection through the ordinary
//! acquire path (bounded by its own short timeout) and runs the configured
//! probe query against it.
//!
//! Probe failures change the reported health status and are logged; they are
//! never raised to callers and never cancel in-flight acquires.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::events::PoolEvent;
use crate::pool::PoolInner;
use crate::stats::Counters;

/// Health classification of the pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HealthStatus {
    /// Recent probes are succeeding.
    #[default]
    Healthy,
    /// The configured number of consecutive probes have failed.
    Degraded,
}

impl std::fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Healthy => f.write_str("healthy"),
            Self::Degraded => f.write_str("degraded"),
        }
    }
}

/// A point-in-time view of probe history.
#[derive(Debug, Clone, Default)]
pub struct HealthReport {
    /// Current classification.
    pub status: HealthStatus,
    /// Consecutive probe failures so far.
    pub consecutive_failures: u32,
    /// Round-trip latency of the most recent successful probe.
    pub last_latency: Option<Duration>,
    /// Error message from the most recent failed probe.
    pub last_error: Option<String>,
}

/// Probe history, updated only by the monitor task.
#[derive(Debug, Default)]
pub(crate) struct HealthState {
    inner: Mutex<HealthReport>,
}

impl HealthState {
    pub(crate) fn status(&self) -> HealthStatus {
        self.inner.lock().status
    }

    pub(crate) fn report(&self) -> HealthReport {
        self.inner.lock().clone()
    }

    /// Record a successful probe. Returns the new status if it changed.
    pub(crate) fn record_success(&self, latency: Duration) -> Option<HealthStatus> {
        let mut inner = self.inner.lock();
        inner.consecutive_failures = 0;
        inner.last_latency = Some(latency);
        inner.last_error = None;
        if inner.status == HealthStatus::Degraded {
            inner.status = HealthStatus::Healthy;
            return Some(HealthStatus::Healthy);
        }
        None
    }

    /// Record a failed probe. Returns the new status if it changed.
    pub(crate) fn record_failure(&self, error: String, threshold: u32) -> Option<HealthStatus> {
        let mut inner = self.inner.lock();
        inner.consecutive_failures = inner.consecutive_failures.saturating_add(1);
        inner.last_error = Some(error);
        if inner.status == HealthStatus::Healthy && inner.consecutive_failures >= threshold {
            inner.status = HealthStatus::Degraded;
            return Some(HealthStatus::Degraded);
        }
        None
    }
}

/// Spawn the monitor task. Ticks until the shutdown signal flips.
pub(crate) fn spawn_monitor(
    inner: Arc<PoolInner>,
    mut stop: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(inner.config.health_check_interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        // The first tick completes immediately; consume it so probes land on
        // interval boundaries after construction.
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    inner.sweep_idle();
                    inner.replenish_to_min();
                    probe(&inner).await;
                }
                _ = stop.changed() => break,
            }
        }
        tracing::debug!("health monitor stopped");
    })
}

/// Run one probe round-trip against a transiently borrowed connection.
async fn probe(inner: &Arc<PoolInner>) {
    // Borrowed through the ordinary acquire path and released promptly; a
    // fully busy pool skips the probe rather than contending further.
    let mut conn = match inner
        .acquire_with_timeout(inner.config.health_probe_timeout)
        .await
    {
        Ok(conn) => conn,
        Err(err) => {
            tracing::trace!(error = %err, "skipping probe, no connection available");
            return;
        }
    };

    let started = Instant::now();
    let outcome = tokio::time::timeout(
        inner.config.health_probe_timeout,
        conn.execute(&inner.config.health_check_query),
    )
    .await;

    Counters::inc(&inner.metrics.probes_performed);
    let status_change = match outcome {
        Ok(Ok(_)) => {
            let latency = started.elapsed();
            tracing::trace!(latency = ?latency, "health probe succeeded");
            inner.health.record_success(latency)
        }
        Ok(Err(err)) => {
            // The probed link is presumed dead; close it rather than
            // returning it to the idle set.
            Counters::inc(&inner.metrics.probes_failed);
            tracing::warn!(error = %err, "health probe failed");
            conn.discard();
            inner
                .health
                .record_failure(err.to_string(), inner.config.health_failure_threshold)
        }
        Err(_) => {
            Counters::inc(&inner.metrics.probes_failed);
            tracing::warn!(
                timeout = ?inner.config.health_probe_timeout,
                "health probe timed out"
            );
            conn.discard();
            inner.health.record_failure(
                "probe timed out".to_owned(),
                inner.config.health_failure_threshold,
            )
        }
    };

    if let Some(status) = status_change {
        tracing::info!(status = %status, "pool health changed");
        inner.emit(PoolEvent::HealthChanged { status });
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_degrades_after_threshold() {
        let state = HealthState::default();
        assert!(state.record_failure("boom".into(), 3).is_none());
        assert!(state.record_failure("boom".into(), 3).is_none());
        assert_eq!(
            state.record_failure("boom".into(), 3),
            Some(HealthStatus::Degraded)
        );
        assert_eq!(state.status(), HealthStatus::Degraded);
        assert_eq!(state.report().consecutive_failures, 3);
    }

    #[test]
    fn test_single_success_recovers() {
        let state = HealthState::default();
        for _ in 0..5 {
            state.record_failure("boom".into(), 3);
        }
        assert_eq!(state.status(), HealthStatus::Degraded);

        assert_eq!(
            state.record_success(Duration::from_millis(2)),
            Some(HealthStatus::Healthy)
        );
        assert_eq!(state.status(), HealthStatus::Healthy);
        assert_eq!(state.report().consecutive_failures, 0);
        assert!(state.report().last_error.is_none());
    }

    #[test]
    fn test_success_while_healthy_reports_no_change() {
        let state = HealthState::default();
        assert!(state.record_success(Duration::from_millis(1)).is_none());
        assert_eq!(state.report().last_latency, Some(Duration::from_millis(1)));
    }

    #[test]
    fn test_failures_below_threshold_stay_healthy() {
        let state = HealthState::default();
        assert!(state.record_failure("boom".into(), 5).is_none());
        assert_eq!(state.status(), HealthStatus::Healthy);
        assert_eq!(state.report().last_error.as_deref(), Some("boom"));
    }
}
