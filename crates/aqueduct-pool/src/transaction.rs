//! Transactional scoping.
//!
//! [`Pool::run_in_transaction`] binds one connection to one atomic unit of
//! work: begin, run the work, then commit on success or roll back on any
//! failure. The connection is released exactly once on every exit path,
//! including cancellation: a unit of work whose future is dropped leaves
//! the connection flagged mid-transaction, and the release path closes such
//! a connection instead of re-idling it (severing the link aborts the
//! transaction on the datastore side).

use aqueduct_transport::TransportError;
use futures_util::future::BoxFuture;

use crate::error::PoolError;
use crate::pool::{Pool, PooledConnection};

tokio::task_local! {
    /// Marker present while the current task is inside a transaction scope.
    static IN_TRANSACTION: ();
}

impl Pool {
    /// Run a unit of work inside a transaction.
    ///
    /// Acquires a connection subject to the same acquire-timeout semantics
    /// as [`Pool::acquire`], begins a transaction on it, and invokes `work`
    /// with the connection. On success the transaction is committed; on any
    /// failure (work error or commit failure) it is rolled back before the
    /// error surfaces as [`PoolError::TransactionFailed`].
    ///
    /// Transactions never nest: calling `run_in_transaction` from inside a
    /// unit of work on the same task fails with
    /// [`PoolError::NestedTransaction`] rather than silently reusing the
    /// outer scope.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// let inserted = pool
    ///     .run_in_transaction(|conn| {
    ///         Box::pin(async move {
    ///             conn.execute("INSERT INTO bookings (room) VALUES ('12A')").await?;
    ///             conn.execute("UPDATE rooms SET held = 1 WHERE id = '12A'").await?;
    ///             Ok(())
    ///         })
    ///     })
    ///     .await?;
    /// ```
    pub async fn run_in_transaction<T, F>(&self, work: F) -> Result<T, PoolError>
    where
        T: Send,
        F: for<'c> FnOnce(&'c mut PooledConnection) -> BoxFuture<'c, Result<T, TransportError>>
            + Send,
    {
        if IN_TRANSACTION.try_with(|_| ()).is_ok() {
            return Err(PoolError::NestedTransaction);
        }
        let conn = self.acquire().await?;
        IN_TRANSACTION.scope((), run_scoped(conn, work)).await
    }
}

async fn run_scoped<T, F>(mut conn: PooledConnection, work: F) -> Result<T, PoolError>
where
    T: Send,
    F: for<'c> FnOnce(&'c mut PooledConnection) -> BoxFuture<'c, Result<T, TransportError>> + Send,
{
    if let Err(err) = conn.begin().await {
        tracing::warn!(connection_id = conn.id(), error = %err, "begin failed");
        conn.discard();
        return Err(PoolError::TransactionFailed(err));
    }
    conn.set_tx_open(true);

    match work(&mut conn).await {
        Ok(value) => match conn.commit().await {
            Ok(()) => {
                conn.set_tx_open(false);
                tracing::trace!(connection_id = conn.id(), "transaction committed");
                Ok(value)
            }
            Err(err) => {
                tracing::warn!(
                    connection_id = conn.id(),
                    error = %err,
                    "commit failed, rolling back"
                );
                rollback_and_release(conn).await;
                Err(PoolError::TransactionFailed(err))
            }
        },
        Err(err) => {
            tracing::debug!(
                connection_id = conn.id(),
                error = %err,
                "unit of work failed, rolling back"
            );
            rollback_and_release(conn).await;
            Err(PoolError::TransactionFailed(err))
        }
    }
}

/// Roll back and release. The connection goes back to the pool when the
/// rollback succeeds; a connection that cannot roll back is closed, which
/// still frees its capacity slot.
async fn rollback_and_release(mut conn: PooledConnection) {
    match conn.rollback().await {
        Ok(()) => {
            conn.set_tx_open(false);
            tracing::trace!(connection_id = conn.id(), "transaction rolled back");
        }
        Err(err) => {
            tracing::warn!(
                connection_id = conn.id(),
                error = %err,
                "rollback failed, closing connection"
            );
            conn.discard();
        }
    }
}
