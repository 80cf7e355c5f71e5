//! # aqueduct-testing
//!
//! Test infrastructure for pool development.
//!
//! Provides an in-memory [`MockConnector`]/[`MockTransport`] pair so the
//! pool's concurrency behavior can be exercised without a datastore. Every
//! transport operation is recorded in a journal, and failures can be
//! injected at each seam: connect, query, begin, commit, and rollback.
//!
//! ## Example
//!
//! ```rust,ignore
//! use aqueduct_testing::MockConnector;
//!
//! #[tokio::test]
//! async fn test_with_mock() {
//!     let connector = MockConnector::builder()
//!         .with_response("SELECT 1", vec![Row::new(vec![Value::Int(1)])])
//!         .build();
//!
//!     let pool = Pool::new(PoolConfig::default(), connector.clone()).await?;
//!     // ...
//!     assert!(connector.journal().iter().any(|e| e.starts_with("commit")));
//! }
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use aqueduct_transport::{Connector, Row, Transport, TransportError};
use parking_lot::Mutex;

#[derive(Default)]
struct MockShared {
    journal: Mutex<Vec<String>>,
    responses: HashMap<String, Vec<Row>>,
    connect_delay: Duration,
    query_delay: Duration,
    fail_next_connects: AtomicUsize,
    fail_next_begins: AtomicUsize,
    fail_next_commits: AtomicUsize,
    fail_next_rollbacks: AtomicUsize,
    fail_queries: AtomicBool,
    connects: AtomicUsize,
    open_transports: AtomicUsize,
    next_id: AtomicUsize,
}

impl MockShared {
    fn record(&self, entry: String) {
        self.journal.lock().push(entry);
    }

    fn take_failure(&self, counter: &AtomicUsize) -> bool {
        counter
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

/// Builder for a [`MockConnector`].
#[derive(Default)]
pub struct MockConnectorBuilder {
    responses: HashMap<String, Vec<Row>>,
    connect_delay: Duration,
    query_delay: Duration,
}

impl MockConnectorBuilder {
    /// Script the rows returned for an exact query string. Unscripted
    /// queries return no rows.
    #[must_use]
    pub fn with_response(mut self, query: impl Into<String>, rows: Vec<Row>) -> Self {
        self.responses.insert(query.into(), rows);
        self
    }

    /// Delay applied to every connect.
    #[must_use]
    pub fn connect_delay(mut self, delay: Duration) -> Self {
        self.connect_delay = delay;
        self
    }

    /// Delay applied to every query.
    #[must_use]
    pub fn query_delay(mut self, delay: Duration) -> Self {
        self.query_delay = delay;
        self
    }

    /// Build the connector.
    #[must_use]
    pub fn build(self) -> MockConnector {
        MockConnector {
            shared: Arc::new(MockShared {
                responses: self.responses,
                connect_delay: self.connect_delay,
                query_delay: self.query_delay,
                ..MockShared::default()
            }),
        }
    }
}

/// An in-memory connector producing [`MockTransport`]s.
///
/// Clone handles freely: all clones share the same journal, counters, and
/// failure toggles, so a test can keep one handle for assertions while the
/// pool owns another.
#[derive(Clone, Default)]
pub struct MockConnector {
    shared: Arc<MockShared>,
}

impl MockConnector {
    /// Create a connector with no scripted responses or delays.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a builder.
    #[must_use]
    pub fn builder() -> MockConnectorBuilder {
        MockConnectorBuilder::default()
    }

    /// Make the next `n` connect attempts fail.
    pub fn fail_next_connects(&self, n: usize) {
        self.shared.fail_next_connects.store(n, Ordering::SeqCst);
    }

    /// Make the next `n` begins fail.
    pub fn fail_next_begins(&self, n: usize) {
        self.shared.fail_next_begins.store(n, Ordering::SeqCst);
    }

    /// Make the next `n` commits fail.
    pub fn fail_next_commits(&self, n: usize) {
        self.shared.fail_next_commits.store(n, Ordering::SeqCst);
    }

    /// Make the next `n` rollbacks fail.
    pub fn fail_next_rollbacks(&self, n: usize) {
        self.shared.fail_next_rollbacks.store(n, Ordering::SeqCst);
    }

    /// Make every query fail (or succeed again) until toggled.
    pub fn set_fail_queries(&self, fail: bool) {
        self.shared.fail_queries.store(fail, Ordering::SeqCst);
    }

    /// Ordered journal of every transport operation so far, formatted as
    /// `op#transport_id` (e.g. `execute#2:SELECT 1`).
    #[must_use]
    pub fn journal(&self) -> Vec<String> {
        self.shared.journal.lock().clone()
    }

    /// Total successful connects.
    #[must_use]
    pub fn connects(&self) -> usize {
        self.shared.connects.load(Ordering::SeqCst)
    }

    /// Transports currently alive (not yet dropped).
    #[must_use]
    pub fn open_transports(&self) -> usize {
        self.shared.open_transports.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl Connector for MockConnector {
    async fn connect(&self) -> Result<Box<dyn Transport>, TransportError> {
        if !self.shared.connect_delay.is_zero() {
            tokio::time::sleep(self.shared.connect_delay).await;
        }
        if self.shared.take_failure(&self.shared.fail_next_connects) {
            return Err(TransportError::Connect("injected connect failure".into()));
        }
        let id = self.shared.next_id.fetch_add(1, Ordering::SeqCst);
        self.shared.connects.fetch_add(1, Ordering::SeqCst);
        self.shared.open_transports.fetch_add(1, Ordering::SeqCst);
        self.shared.record(format!("connect#{id}"));
        Ok(Box::new(MockTransport {
            id,
            shared: Arc::clone(&self.shared),
        }))
    }
}

/// A single mock link produced by [`MockConnector`].
pub struct MockTransport {
    id: usize,
    shared: Arc<MockShared>,
}

impl MockTransport {
    /// The mock-assigned transport identity.
    #[must_use]
    pub fn id(&self) -> usize {
        self.id
    }
}

#[async_trait::async_trait]
impl Transport for MockTransport {
    async fn execute(&mut self, query: &str) -> Result<Vec<Row>, TransportError> {
        if !self.shared.query_delay.is_zero() {
            tokio::time::sleep(self.shared.query_delay).await;
        }
        self.shared.record(format!("execute#{}:{query}", self.id));
        if self.shared.fail_queries.load(Ordering::SeqCst) {
            return Err(TransportError::Query("injected query failure".into()));
        }
        Ok(self.shared.responses.get(query).cloned().unwrap_or_default())
    }

    async fn begin(&mut self) -> Result<(), TransportError> {
        self.shared.record(format!("begin#{}", self.id));
        if self.shared.take_failure(&self.shared.fail_next_begins) {
            return Err(TransportError::Transaction("injected begin failure".into()));
        }
        Ok(())
    }

    async fn commit(&mut self) -> Result<(), TransportError> {
        self.shared.record(format!("commit#{}", self.id));
        if self.shared.take_failure(&self.shared.fail_next_commits) {
            return Err(TransportError::Transaction(
                "injected commit failure".into(),
            ));
        }
        Ok(())
    }

    async fn rollback(&mut self) -> Result<(), TransportError> {
        self.shared.record(format!("rollback#{}", self.id));
        if self.shared.take_failure(&self.shared.fail_next_rollbacks) {
            return Err(TransportError::Transaction(
                "injected rollback failure".into(),
            ));
        }
        Ok(())
    }
}

impl Drop for MockTransport {
    fn drop(&mut self) {
        self.shared.open_transports.fetch_sub(1, Ordering::SeqCst);
        self.shared.record(format!("drop#{}", self.id));
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use aqueduct_transport::Value;

    #[tokio::test]
    async fn test_scripted_response() {
        let connector = MockConnector::builder()
            .with_response("SELECT 1", vec![Row::new(vec![Value::Int(1)])])
            .build();

        let mut transport = connector.connect().await.unwrap();
        let rows = transport.execute("SELECT 1").await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get(0), Some(&Value::Int(1)));

        let rows = transport.execute("SELECT 2").await.unwrap();
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn test_connect_failure_injection() {
        let connector = MockConnector::new();
        connector.fail_next_connects(1);

        assert!(connector.connect().await.is_err());
        assert!(connector.connect().await.is_ok());
        assert_eq!(connector.connects(), 1);
    }

    #[tokio::test]
    async fn test_journal_records_operations() {
        let connector = MockConnector::new();
        let mut transport = connector.connect().await.unwrap();
        transport.begin().await.unwrap();
        transport.execute("SELECT 1").await.unwrap();
        transport.commit().await.unwrap();
        drop(transport);

        let journal = connector.journal();
        let entries: Vec<&str> = journal.iter().map(String::as_str).collect();
        assert_eq!(
            entries,
            vec![
                "connect#0",
                "begin#0",
                "execute#0:SELECT 1",
                "commit#0",
                "drop#0"
            ]
        );
        assert_eq!(connector.open_transports(), 0);
    }

    #[tokio::test]
    async fn test_query_failure_toggle() {
        let connector = MockConnector::new();
        let mut transport = connector.connect().await.unwrap();

        connector.set_fail_queries(true);
        assert!(transport.execute("SELECT 1").await.is_err());

        connector.set_fail_queries(false);
        assert!(transport.execute("SELECT 1").await.is_ok());
    }
}
