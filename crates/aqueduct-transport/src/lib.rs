//! # aqueduct-transport
//!
//! The opaque datastore capability consumed by the aqueduct connection pool.
//!
//! The pool does not define the wire protocol to the datastore. It sees a
//! connection as a [`Transport`]: something that can execute a query and
//! return rows, and that can begin, commit, or roll back a transaction.
//! New links are established through a [`Connector`], the factory the pool
//! calls when it needs to grow.
//!
//! Driver crates implement both traits; the pool stays driver-agnostic.
//!
//! ## Example
//!
//! ```rust,ignore
//! use aqueduct_transport::{Connector, Transport, TransportError, Row};
//!
//! struct PgConnector { dsn: String }
//!
//! #[async_trait::async_trait]
//! impl Connector for PgConnector {
//!     async fn connect(&self) -> Result<Box<dyn Transport>, TransportError> {
//!         let link = pg_connect(&self.dsn).await?;
//!         Ok(Box::new(link))
//!     }
//! }
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod error;
pub mod value;

pub use error::TransportError;
pub use value::{Row, Value};

/// A single live link to the datastore.
///
/// Dropping a transport severs the link; there is no separate close
/// operation. An open transaction on a dropped link is aborted by the
/// datastore.
///
/// `#[async_trait]` is used (rather than native async-in-trait) because the
/// pool holds transports as `Box<dyn Transport>` and needs object safety.
#[async_trait::async_trait]
pub trait Transport: Send {
    /// Execute a query and return the resulting rows.
    async fn execute(&mut self, query: &str) -> Result<Vec<Row>, TransportError>;

    /// Begin a transaction on this link.
    async fn begin(&mut self) -> Result<(), TransportError>;

    /// Commit the current transaction.
    async fn commit(&mut self) -> Result<(), TransportError>;

    /// Roll back the current transaction.
    async fn rollback(&mut self) -> Result<(), TransportError>;
}

/// Factory that establishes new transports.
///
/// The pool calls [`Connector::connect`] when it pre-warms to its minimum
/// size, when it grows toward its maximum, and when it replaces an expired
/// or broken connection.
#[async_trait::async_trait]
pub trait Connector: Send + Sync {
    /// Establish a new live link to the datastore.
    async fn connect(&self) -> Result<Box<dyn Transport>, TransportError>;
}
