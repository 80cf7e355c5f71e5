//! # aqueduct-pool
//!
//! Managed connection pool with health monitoring and transactional scoping.
//!
//! The pool safely shares a bounded set of live datastore connections across
//! many concurrent tasks: no two callers ever hold the same connection,
//! capacity is never exceeded, and failures neither leak nor deadlock
//! connections.
//!
//! ## Features
//!
//! - Bounded min/max capacity with lazy growth and pre-warming
//! - FIFO waiter queue with acquire timeout
//! - Max-lifetime and idle-timeout connection recycling
//! - Background health probes with healthy/degraded classification
//! - Commit-or-rollback transaction scoping with guaranteed release
//! - Occupancy snapshots, cumulative metrics, and broadcast lifecycle events
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::time::Duration;
//! use aqueduct_pool::{Pool, PoolConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let pool = Pool::builder()
//!         .connector(my_connector)
//!         .min_connections(2)
//!         .max_connections(10)
//!         .acquire_timeout(Duration::from_secs(5))
//!         .build()
//!         .await?;
//!
//!     // Raw connection use
//!     let mut conn = pool.acquire().await?;
//!     let rows = conn.execute("SELECT id FROM bookings").await?;
//!     drop(conn); // back to the pool
//!
//!     // Transactional scope
//!     pool.run_in_transaction(|conn| {
//!         Box::pin(async move {
//!             conn.execute("INSERT INTO bookings (room) VALUES ('12A')").await?;
//!             Ok(())
//!         })
//!     })
//!     .await?;
//!
//!     pool.shutdown(Duration::from_secs(2)).await;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod config;
pub mod connection;
pub mod error;
pub mod events;
pub mod health;
pub mod pool;
pub mod stats;
pub mod transaction;

// Re-export commonly used types
pub use aqueduct_transport::{Connector, Row, Transport, TransportError, Value};
pub use config::{DEFAULT_HEALTH_CHECK_QUERY, PoolConfig};
pub use connection::{ConnectionMetadata, ConnectionState};
pub use error::PoolError;
pub use events::{CloseReason, PoolEvent};
pub use health::{HealthReport, HealthStatus};
pub use pool::{Pool, PoolBuilder, PooledConnection};
pub use stats::{PoolMetrics, PoolStats};
