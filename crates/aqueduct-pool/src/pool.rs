//! Connection pool implementation.
//!
//! All mutations to the idle set, active count, and waiter queue happen
//! under one mutex held only for short critical sections, never across an
//! await point. Connection establishment and closing happen outside the
//! lock. A released connection is handed to the longest-queued live waiter
//! while the lock is held, so a waiter timing out at the same instant either
//! finds its queue entry (and fails) or finds the handoff already delivered
//! (and claims it); a connection is never lost between the two.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use aqueduct_transport::{Connector, Transport};
use parking_lot::Mutex;
use tokio::sync::{Notify, broadcast, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::config::PoolConfig;
use crate::connection::{Conn, ConnectionMetadata};
use crate::error::PoolError;
use crate::events::{CloseReason, PoolEvent};
use crate::health::{HealthReport, HealthState};
use crate::stats::{Counters, PoolMetrics, PoolStats};

/// Capacity of the event broadcast channel. A subscriber that lags behind
/// misses events rather than stalling the pool.
const EVENT_CHANNEL_CAPACITY: usize = 64;

/// A managed connection pool.
///
/// The pool owns a bounded set of live datastore connections, pre-warmed to
/// a configured minimum and grown lazily to a maximum. Callers acquire a
/// connection, use it, and drop it to return it; callers that arrive while
/// the pool is at capacity queue in FIFO order up to the acquire timeout.
///
/// `Pool` is a cheap handle: clone it and pass it to every collaborator
/// that needs it. Construct one instance at process start and tear it down
/// with [`Pool::shutdown`].
///
/// # Example
///
/// ```rust,ignore
/// use aqueduct_pool::{Pool, PoolConfig};
///
/// let pool = Pool::builder()
///     .connector(my_connector)
///     .min_connections(2)
///     .max_connections(10)
///     .build()
///     .await?;
///
/// let mut conn = pool.acquire().await?;
/// let rows = conn.execute("SELECT id FROM bookings").await?;
/// // Connection is returned to the pool on drop.
/// ```
#[derive(Clone)]
pub struct Pool {
    inner: Arc<PoolInner>,
}

/// Shared pool internals.
pub(crate) struct PoolInner {
    pub(crate) config: PoolConfig,
    pub(crate) connector: Arc<dyn Connector>,
    pub(crate) state: Mutex<PoolState>,
    pub(crate) metrics: Counters,
    pub(crate) health: HealthState,
    events: broadcast::Sender<PoolEvent>,
    /// Signalled by a release that brings the active count to zero while
    /// the pool is shutting down.
    drained: Notify,
    next_connection_id: AtomicU64,
    next_waiter_id: AtomicU64,
    created_at: Instant,
    monitor: Mutex<Option<JoinHandle<()>>>,
    monitor_stop: watch::Sender<bool>,
}

/// Mutable pool state, protected by `PoolInner::state`.
#[derive(Default)]
pub(crate) struct PoolState {
    /// Idle connections, unordered.
    idle: Vec<Conn>,
    /// Connections currently held by callers.
    active: usize,
    /// Slots reserved for in-flight connection establishment.
    creating: usize,
    /// Callers blocked on acquire, oldest first.
    waiters: VecDeque<Waiter>,
    /// No new acquire succeeds once set.
    shutdown: bool,
}

impl PoolState {
    /// Connections the pool is responsible for, including in-flight creates.
    fn total(&self) -> usize {
        self.idle.len() + self.active + self.creating
    }
}

/// A pending acquire, parked until a connection is handed to it.
struct Waiter {
    id: u64,
    tx: oneshot::Sender<PooledConnection>,
}

enum Plan {
    Ready(Conn),
    Create,
    Wait(oneshot::Receiver<PooledConnection>, u64),
}

impl Pool {
    /// Create a new pool builder.
    #[must_use]
    pub fn builder() -> PoolBuilder {
        PoolBuilder::new()
    }

    /// Create a new pool with the given configuration and connector.
    ///
    /// Validates the configuration, pre-warms up to `min_connections`, and
    /// starts the health monitor. Pre-warm failures are logged and counted
    /// rather than failing construction; the monitor's maintenance tick
    /// retries on its own interval.
    pub async fn new<C>(config: PoolConfig, connector: C) -> Result<Self, PoolError>
    where
        C: Connector + 'static,
    {
        Self::with_connector(config, Arc::new(connector)).await
    }

    async fn with_connector(
        config: PoolConfig,
        connector: Arc<dyn Connector>,
    ) -> Result<Self, PoolError> {
        config.validate()?;

        let (stop_tx, stop_rx) = watch::channel(false);
        let inner = Arc::new(PoolInner {
            config: config.clone(),
            connector,
            state: Mutex::new(PoolState::default()),
            metrics: Counters::default(),
            health: HealthState::default(),
            events: broadcast::channel(EVENT_CHANNEL_CAPACITY).0,
            drained: Notify::new(),
            next_connection_id: AtomicU64::new(1),
            next_waiter_id: AtomicU64::new(1),
            created_at: Instant::now(),
            monitor: Mutex::new(None),
            monitor_stop: stop_tx,
        });

        for _ in 0..config.min_connections {
            match inner.connector.connect().await {
                Ok(transport) => {
                    let id = inner.next_conn_id();
                    inner.state.lock().idle.push(Conn::new(id, transport));
                    Counters::inc(&inner.metrics.connections_created);
                    inner.emit(PoolEvent::ConnectionCreated { id });
                }
                Err(err) => {
                    Counters::inc(&inner.metrics.create_failures);
                    tracing::warn!(error = %err, "pre-warm connection failed");
                }
            }
        }

        let handle = crate::health::spawn_monitor(Arc::clone(&inner), stop_rx);
        *inner.monitor.lock() = Some(handle);

        tracing::info!(
            min = config.min_connections,
            max = config.max_connections,
            "connection pool created"
        );
        Ok(Self { inner })
    }

    /// Get a connection from the pool.
    ///
    /// Returns an idle connection if one exists, creates a new one if the
    /// pool is below capacity, and otherwise queues until a connection is
    /// released or the acquire timeout elapses
    /// ([`PoolError::PoolExhausted`]).
    pub async fn acquire(&self) -> Result<PooledConnection, PoolError> {
        tracing::trace!("acquiring connection from pool");
        self.inner
            .acquire_with_timeout(self.inner.config.acquire_timeout)
            .await
    }

    /// Try to get an idle connection without waiting.
    ///
    /// Returns `None` when no idle connection is immediately available;
    /// never establishes a new one.
    pub fn try_acquire(&self) -> Result<Option<PooledConnection>, PoolError> {
        let mut expired = Vec::new();
        let mut replacements = 0;
        let got = {
            let mut state = self.inner.state.lock();
            if state.shutdown {
                return Err(PoolError::ShutdownInProgress);
            }
            let got = loop {
                match state.idle.pop() {
                    Some(conn) if conn.meta.is_expired(self.inner.config.max_lifetime) => {
                        expired.push(conn);
                    }
                    Some(mut conn) => {
                        conn.meta.mark_checkout();
                        state.active += 1;
                        break Some(conn);
                    }
                    None => break None,
                }
            };
            if !expired.is_empty() {
                replacements = self.inner.reserve_min_replacements(&mut state);
            }
            got
        };
        for conn in expired {
            self.inner.close_conn(conn, CloseReason::Expired);
        }
        for _ in 0..replacements {
            self.inner.spawn_replenish();
        }
        Ok(got.map(|conn| {
            Counters::inc(&self.inner.metrics.checkouts_successful);
            PooledConnection::new(conn, Arc::clone(&self.inner))
        }))
    }

    /// Get the current pool occupancy.
    #[must_use]
    pub fn snapshot(&self) -> PoolStats {
        let (total, idle, active, waiting) = {
            let state = self.inner.state.lock();
            (
                (state.idle.len() + state.active) as u32,
                state.idle.len() as u32,
                state.active as u32,
                state.waiters.len() as u32,
            )
        };
        PoolStats {
            total,
            idle,
            active,
            waiting,
            max: self.inner.config.max_connections,
            health: self.inner.health.status(),
        }
    }

    /// Get cumulative pool metrics.
    #[must_use]
    pub fn metrics(&self) -> PoolMetrics {
        self.inner.metrics.snapshot(self.inner.created_at.elapsed())
    }

    /// Get the current health report.
    #[must_use]
    pub fn health(&self) -> HealthReport {
        self.inner.health.report()
    }

    /// Subscribe to pool lifecycle events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<PoolEvent> {
        self.inner.events.subscribe()
    }

    /// Check if the pool is shutting down.
    #[must_use]
    pub fn is_shutdown(&self) -> bool {
        self.inner.state.lock().shutdown
    }

    /// Get the pool configuration.
    #[must_use]
    pub fn config(&self) -> &PoolConfig {
        &self.inner.config
    }

    /// Shut the pool down.
    ///
    /// Sets the shutdown flag (subsequent acquires fail with
    /// [`PoolError::ShutdownInProgress`]), fails all queued waiters, closes
    /// idle connections, stops and joins the health monitor, then waits up
    /// to `grace_period` for active connections to be released, returning
    /// as soon as the last one comes back. Connections still outstanding
    /// when the grace period ends are closed when their holders release
    /// them. Idempotent; a second call just waits for the drain.
    pub async fn shutdown(&self, grace_period: Duration) {
        let idle = {
            let mut state = self.inner.state.lock();
            if state.shutdown {
                None
            } else {
                state.shutdown = true;
                // Dropping the senders fails every queued waiter with
                // ShutdownInProgress.
                state.waiters.clear();
                Some(std::mem::take(&mut state.idle))
            }
        };

        if let Some(idle) = idle {
            tracing::info!(grace = ?grace_period, "pool shutdown started");
            self.inner.emit(PoolEvent::ShutdownStarted);
            for conn in idle {
                self.inner.close_conn(conn, CloseReason::Shutdown);
            }
            let _ = self.inner.monitor_stop.send(true);
            let handle = self.inner.monitor.lock().take();
            if let Some(handle) = handle {
                let _ = handle.await;
            }
        }

        let drain = async {
            loop {
                if self.inner.state.lock().active == 0 {
                    // Cascade so concurrent shutdown callers also observe
                    // the drain.
                    self.inner.drained.notify_one();
                    break;
                }
                self.inner.drained.notified().await;
            }
        };

        match tokio::time::timeout(grace_period, drain).await {
            Ok(()) => tracing::info!("pool drained"),
            Err(_) => {
                let outstanding = self.inner.state.lock().active as u64;
                Counters::add(&self.inner.metrics.force_closed, outstanding);
                tracing::warn!(
                    outstanding,
                    "grace period elapsed, outstanding connections are closed on release"
                );
            }
        }
    }
}

impl PoolInner {
    pub(crate) fn next_conn_id(&self) -> u64 {
        self.next_connection_id.fetch_add(1, Ordering::Relaxed)
    }

    pub(crate) fn emit(&self, event: PoolEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }

    /// Close a connection that is not currently accounted as active.
    pub(crate) fn close_conn(&self, conn: Conn, reason: CloseReason) {
        Counters::inc(&self.metrics.connections_closed);
        tracing::debug!(connection_id = conn.meta.id, reason = ?reason, "closing connection");
        self.emit(PoolEvent::ConnectionClosed {
            id: conn.meta.id,
            reason,
        });
        // Dropping the transport severs the link.
        drop(conn);
    }

    /// Close an active connection, releasing its capacity slot.
    pub(crate) fn close_active(self: &Arc<Self>, conn: Conn, reason: CloseReason) {
        let (drained, replacements) = {
            let mut state = self.state.lock();
            state.active -= 1;
            let drained = state.shutdown && state.active == 0;
            let replacements = self.reserve_min_replacements(&mut state);
            (drained, replacements)
        };
        self.close_conn(conn, reason);
        if drained {
            self.drained.notify_one();
        }
        for _ in 0..replacements {
            self.spawn_replenish();
        }
    }

    /// Reserve creation slots to bring the pool back up to its minimum.
    /// Returns how many were reserved; the caller must spawn that many
    /// replenish tasks after dropping the lock.
    fn reserve_min_replacements(&self, state: &mut PoolState) -> usize {
        if state.shutdown {
            return 0;
        }
        let needed = (self.config.min_connections as usize).saturating_sub(state.total());
        state.creating += needed;
        needed
    }

    pub(crate) async fn acquire_with_timeout(
        self: &Arc<Self>,
        timeout: Duration,
    ) -> Result<PooledConnection, PoolError> {
        let started = Instant::now();
        let mut expired = Vec::new();
        let mut replacements = 0;

        let plan = {
            let mut state = self.state.lock();
            if state.shutdown {
                Counters::inc(&self.metrics.checkouts_failed);
                return Err(PoolError::ShutdownInProgress);
            }
            let plan = loop {
                match state.idle.pop() {
                    Some(conn) if conn.meta.is_expired(self.config.max_lifetime) => {
                        expired.push(conn);
                    }
                    Some(mut conn) => {
                        conn.meta.mark_checkout();
                        state.active += 1;
                        break Plan::Ready(conn);
                    }
                    None => {
                        if state.total() < self.config.max_connections as usize {
                            state.creating += 1;
                            break Plan::Create;
                        }
                        let id = self.next_waiter_id.fetch_add(1, Ordering::Relaxed);
                        let (tx, rx) = oneshot::channel();
                        state.waiters.push_back(Waiter { id, tx });
                        break Plan::Wait(rx, id);
                    }
                }
            };
            if !expired.is_empty() {
                replacements = self.reserve_min_replacements(&mut state);
            }
            plan
        };

        for conn in expired {
            self.close_conn(conn, CloseReason::Expired);
        }
        for _ in 0..replacements {
            self.spawn_replenish();
        }

        match plan {
            Plan::Ready(conn) => {
                Counters::inc(&self.metrics.checkouts_successful);
                tracing::trace!(connection_id = conn.meta.id, "acquired idle connection");
                Ok(PooledConnection::new(conn, Arc::clone(self)))
            }
            Plan::Create => {
                let remaining = timeout.saturating_sub(started.elapsed());
                match tokio::time::timeout(remaining, self.connector.connect()).await {
                    Ok(Ok(transport)) => {
                        let id = self.next_conn_id();
                        let mut conn = Conn::new(id, transport);
                        conn.meta.mark_checkout();
                        {
                            let mut state = self.state.lock();
                            state.creating -= 1;
                            if state.shutdown {
                                drop(state);
                                self.close_conn(conn, CloseReason::Shutdown);
                                Counters::inc(&self.metrics.checkouts_failed);
                                return Err(PoolError::ShutdownInProgress);
                            }
                            state.active += 1;
                        }
                        Counters::inc(&self.metrics.connections_created);
                        Counters::inc(&self.metrics.checkouts_successful);
                        self.emit(PoolEvent::ConnectionCreated { id });
                        tracing::debug!(connection_id = id, "created connection");
                        Ok(PooledConnection::new(conn, Arc::clone(self)))
                    }
                    Ok(Err(err)) => {
                        self.state.lock().creating -= 1;
                        Counters::inc(&self.metrics.create_failures);
                        Counters::inc(&self.metrics.checkouts_failed);
                        tracing::warn!(error = %err, "connection establishment failed");
                        Err(PoolError::ConnectionCreateFailed(err))
                    }
                    Err(_) => {
                        self.state.lock().creating -= 1;
                        Counters::inc(&self.metrics.checkouts_failed);
                        self.emit(PoolEvent::AcquireTimedOut);
                        Err(PoolError::PoolExhausted {
                            waited: started.elapsed(),
                        })
                    }
                }
            }
            Plan::Wait(mut rx, waiter_id) => {
                let remaining = timeout.saturating_sub(started.elapsed());
                match tokio::time::timeout(remaining, &mut rx).await {
                    Ok(Ok(conn)) => {
                        Counters::inc(&self.metrics.checkouts_successful);
                        Ok(conn)
                    }
                    Ok(Err(_)) => {
                        // Sender dropped: shutdown cleared the waiter queue.
                        Counters::inc(&self.metrics.checkouts_failed);
                        Err(PoolError::ShutdownInProgress)
                    }
                    Err(_) => {
                        let removed = {
                            let mut state = self.state.lock();
                            match state.waiters.iter().position(|w| w.id == waiter_id) {
                                Some(pos) => {
                                    state.waiters.remove(pos);
                                    true
                                }
                                None => false,
                            }
                        };
                        if removed {
                            Counters::inc(&self.metrics.checkouts_failed);
                            self.emit(PoolEvent::AcquireTimedOut);
                            tracing::debug!(waited = ?started.elapsed(), "acquire timed out");
                            Err(PoolError::PoolExhausted {
                                waited: started.elapsed(),
                            })
                        } else {
                            // The handoff landed at the same instant the
                            // timeout fired; claim it.
                            match rx.try_recv() {
                                Ok(conn) => {
                                    Counters::inc(&self.metrics.checkouts_successful);
                                    Ok(conn)
                                }
                                Err(_) => {
                                    Counters::inc(&self.metrics.checkouts_failed);
                                    Err(PoolError::ShutdownInProgress)
                                }
                            }
                        }
                    }
                }
            }
        }
    }

    /// Return a connection to the pool.
    pub(crate) fn release(self: &Arc<Self>, mut conn: Conn) {
        if conn.tx_open {
            tracing::warn!(
                connection_id = conn.meta.id,
                "connection released with open transaction, closing"
            );
            return self.close_active(conn, CloseReason::Broken);
        }
        if conn.meta.is_expired(self.config.max_lifetime) {
            return self.close_active(conn, CloseReason::Expired);
        }

        let mut state = self.state.lock();
        if state.shutdown {
            state.active -= 1;
            let drained = state.active == 0;
            drop(state);
            self.close_conn(conn, CloseReason::Shutdown);
            if drained {
                self.drained.notify_one();
            }
            return;
        }

        if !state.waiters.is_empty() {
            conn.meta.mark_checkout();
            let mut guard = PooledConnection::new(conn, Arc::clone(self));
            while let Some(waiter) = state.waiters.pop_front() {
                match waiter.tx.send(guard) {
                    Ok(()) => {
                        drop(state);
                        Counters::inc(&self.metrics.waiter_handoffs);
                        return;
                    }
                    // The waiter gave up; skip it and try the next one.
                    Err(returned) => guard = returned,
                }
            }
            conn = guard.into_conn();
        }
        conn.meta.mark_checkin();
        state.active -= 1;
        state.idle.push(conn);
    }

    /// Spawn a task to establish one replacement connection. The caller has
    /// already reserved the creation slot under the lock.
    pub(crate) fn spawn_replenish(self: &Arc<Self>) {
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let inner = Arc::clone(self);
                handle.spawn(async move { inner.replenish_one().await });
            }
            Err(_) => {
                self.state.lock().creating -= 1;
                tracing::warn!("runtime unavailable, skipping connection replacement");
            }
        }
    }

    async fn replenish_one(self: Arc<Self>) {
        let transport = match self.connector.connect().await {
            Ok(transport) => transport,
            Err(err) => {
                self.state.lock().creating -= 1;
                Counters::inc(&self.metrics.create_failures);
                tracing::warn!(error = %err, "replacement connection failed");
                return;
            }
        };
        let id = self.next_conn_id();
        Counters::inc(&self.metrics.connections_created);
        self.emit(PoolEvent::ConnectionCreated { id });
        tracing::debug!(connection_id = id, "created replacement connection");
        let mut conn = Conn::new(id, transport);

        let mut state = self.state.lock();
        state.creating -= 1;
        if state.shutdown {
            drop(state);
            self.close_conn(conn, CloseReason::Shutdown);
            return;
        }
        if !state.waiters.is_empty() {
            conn.meta.mark_checkout();
            state.active += 1;
            let mut guard = PooledConnection::new(conn, Arc::clone(&self));
            while let Some(waiter) = state.waiters.pop_front() {
                match waiter.tx.send(guard) {
                    Ok(()) => {
                        drop(state);
                        Counters::inc(&self.metrics.waiter_handoffs);
                        return;
                    }
                    Err(returned) => guard = returned,
                }
            }
            let mut conn = guard.into_conn();
            conn.meta.mark_checkin();
            state.active -= 1;
            state.idle.push(conn);
            return;
        }
        state.idle.push(conn);
    }

    /// Close idle connections past their lifetime, and past the idle
    /// timeout while the pool stays at or above its minimum.
    pub(crate) fn sweep_idle(self: &Arc<Self>) {
        let min = self.config.min_connections as usize;
        let mut closed = Vec::new();
        {
            let mut state = self.state.lock();
            if state.shutdown {
                return;
            }
            let mut i = 0;
            while i < state.idle.len() {
                if state.idle[i].meta.is_expired(self.config.max_lifetime) {
                    closed.push((state.idle.swap_remove(i), CloseReason::Expired));
                } else {
                    i += 1;
                }
            }
            let mut i = 0;
            while i < state.idle.len() && state.total() > min {
                if state.idle[i].meta.is_idle_expired(self.config.idle_timeout) {
                    closed.push((state.idle.swap_remove(i), CloseReason::IdleTimeout));
                } else {
                    i += 1;
                }
            }
        }
        for (conn, reason) in closed {
            self.close_conn(conn, reason);
        }
    }

    /// Establish replacements until the pool is back at its minimum.
    pub(crate) fn replenish_to_min(self: &Arc<Self>) {
        let needed = {
            let mut state = self.state.lock();
            self.reserve_min_replacements(&mut state)
        };
        for _ in 0..needed {
            self.spawn_replenish();
        }
    }
}

/// A connection checked out of the pool.
///
/// Dereferences to the underlying [`Transport`]. Dropping the guard returns
/// the connection to the pool: straight to the longest-queued waiter if any,
/// otherwise to the idle set. Use [`discard`](Self::discard) for a
/// connection known to be broken, or [`detach`](Self::detach) to take the
/// transport out of the pool's management entirely.
pub struct PooledConnection {
    conn: Option<Conn>,
    pool: Arc<PoolInner>,
}

impl PooledConnection {
    pub(crate) fn new(conn: Conn, pool: Arc<PoolInner>) -> Self {
        Self {
            conn: Some(conn),
            pool,
        }
    }

    /// Take the connection back out of the guard without releasing it.
    pub(crate) fn into_conn(mut self) -> Conn {
        self.conn.take().expect("connection should be present")
    }

    /// The pool-assigned connection identity.
    #[must_use]
    pub fn id(&self) -> u64 {
        self.metadata().id
    }

    /// Get the connection metadata.
    #[must_use]
    pub fn metadata(&self) -> &ConnectionMetadata {
        &self
            .conn
            .as_ref()
            .expect("connection should be present")
            .meta
    }

    pub(crate) fn set_tx_open(&mut self, open: bool) {
        if let Some(conn) = self.conn.as_mut() {
            conn.tx_open = open;
        }
    }

    /// Close this connection instead of returning it to the pool.
    ///
    /// Use this when the link is known to be broken. The capacity slot is
    /// freed and, if the pool has fallen below its minimum, a replacement
    /// is established in the background.
    pub fn discard(mut self) {
        if let Some(conn) = self.conn.take() {
            self.pool.close_active(conn, CloseReason::Broken);
        }
    }

    /// Detach the connection from the pool.
    ///
    /// The transport is handed to the caller and no longer counts against
    /// pool capacity; it will not be returned on drop.
    #[must_use]
    pub fn detach(mut self) -> Box<dyn Transport> {
        let conn = self.conn.take().expect("connection should be present");
        let drained = {
            let mut state = self.pool.state.lock();
            state.active -= 1;
            state.shutdown && state.active == 0
        };
        if drained {
            self.pool.drained.notify_one();
        }
        tracing::debug!(connection_id = conn.meta.id, "connection detached from pool");
        conn.transport
    }
}

impl std::ops::Deref for PooledConnection {
    type Target = dyn Transport;

    fn deref(&self) -> &Self::Target {
        self.conn
            .as_ref()
            .expect("connection should be present")
            .transport
            .as_ref()
    }
}

impl std::ops::DerefMut for PooledConnection {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.conn
            .as_mut()
            .expect("connection should be present")
            .transport
            .as_mut()
    }
}

impl Drop for PooledConnection {
    fn drop(&mut self) {
        if let Some(conn) = self.conn.take() {
            tracing::trace!(connection_id = conn.meta.id, "returning connection to pool");
            self.pool.release(conn);
        }
    }
}

/// Builder for creating a connection pool.
///
/// # Example
///
/// ```rust,ignore
/// let pool = Pool::builder()
///     .connector(my_connector)
///     .max_connections(20)
///     .build()
///     .await?;
/// ```
pub struct PoolBuilder {
    config: PoolConfig,
    connector: Option<Arc<dyn Connector>>,
}

impl PoolBuilder {
    /// Create a new pool builder with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: PoolConfig::default(),
            connector: None,
        }
    }

    /// Set the full pool configuration.
    #[must_use]
    pub fn config(mut self, config: PoolConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the connector used to establish new connections.
    #[must_use]
    pub fn connector<C>(mut self, connector: C) -> Self
    where
        C: Connector + 'static,
    {
        self.connector = Some(Arc::new(connector));
        self
    }

    /// Set the minimum number of connections.
    #[must_use]
    pub fn min_connections(mut self, count: u32) -> Self {
        self.config.min_connections = count;
        self
    }

    /// Set the maximum number of connections.
    #[must_use]
    pub fn max_connections(mut self, count: u32) -> Self {
        self.config.max_connections = count;
        self
    }

    /// Set the connection acquisition timeout.
    #[must_use]
    pub fn acquire_timeout(mut self, timeout: Duration) -> Self {
        self.config.acquire_timeout = timeout;
        self
    }

    /// Set the idle connection timeout.
    #[must_use]
    pub fn idle_timeout(mut self, timeout: Duration) -> Self {
        self.config.idle_timeout = timeout;
        self
    }

    /// Set the maximum connection lifetime.
    #[must_use]
    pub fn max_lifetime(mut self, lifetime: Duration) -> Self {
        self.config.max_lifetime = lifetime;
        self
    }

    /// Build the pool.
    pub async fn build(self) -> Result<Pool, PoolError> {
        let connector = self
            .connector
            .ok_or_else(|| PoolError::Configuration("connector is required".into()))?;
        Pool::with_connector(self.config, connector).await
    }
}

impl Default for PoolBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_default() {
        let builder = PoolBuilder::new();
        assert_eq!(builder.config.min_connections, 1);
        assert_eq!(builder.config.max_connections, 10);
        assert!(builder.connector.is_none());
    }

    #[test]
    fn test_builder_fluent() {
        let builder = Pool::builder()
            .min_connections(5)
            .max_connections(50)
            .acquire_timeout(Duration::from_secs(3));

        assert_eq!(builder.config.min_connections, 5);
        assert_eq!(builder.config.max_connections, 50);
        assert_eq!(builder.config.acquire_timeout, Duration::from_secs(3));
    }

    #[tokio::test]
    async fn test_build_without_connector_fails() {
        let result = Pool::builder().build().await;
        assert!(matches!(result, Err(PoolError::Configuration(_))));
    }

    #[test]
    fn test_state_total_includes_in_flight_creates() {
        let mut state = PoolState::default();
        state.active = 2;
        state.creating = 1;
        assert_eq!(state.total(), 3);
    }
}
