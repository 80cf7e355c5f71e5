//! Connection pool demo with metrics.
//!
//! Runs the pool against the in-memory mock transport, exercising
//! concurrent checkouts, a transaction, and graceful shutdown while
//! printing occupancy and metrics along the way.
//!
//! # Running
//!
//! ```bash
//! cargo run -p aqueduct-pool --example pool_demo
//! ```

// Allow common patterns in example code
#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::time::Duration;

use aqueduct_pool::{Pool, PoolConfig};
use aqueduct_testing::MockConnector;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    println!("=== Connection Pool Demo ===\n");

    let config = PoolConfig::new()
        .min_connections(2)
        .max_connections(5)
        .acquire_timeout(Duration::from_secs(5))
        .health_check_interval(Duration::from_secs(1));

    println!("Pool configuration:");
    println!("  Min connections: {}", config.min_connections);
    println!("  Max connections: {}", config.max_connections);
    println!("  Acquire timeout: {:?}", config.acquire_timeout);
    println!();

    let connector = MockConnector::new();
    let pool = Pool::new(config, connector.clone()).await?;
    print_pool_status(&pool);

    // 1. Basic usage
    println!("\n1. Basic pool usage:");
    {
        let mut conn = pool.acquire().await?;
        let rows = conn.execute("SELECT 1").await?;
        println!("  Executed probe query, {} row(s) back", rows.len());
        // Connection is returned to the pool when dropped
    }

    // 2. Concurrent usage
    println!("\n2. Concurrent pool usage (10 parallel checkouts):");
    let mut handles = Vec::new();
    for i in 0..10 {
        let pool = pool.clone();
        handles.push(tokio::spawn(async move {
            let mut conn = pool.acquire().await?;
            conn.execute(&format!("SELECT {i}")).await?;
            tokio::time::sleep(Duration::from_millis(50)).await;
            Ok::<_, Box<dyn std::error::Error + Send + Sync>>(())
        }));
    }
    let mut completed = 0;
    for handle in handles {
        if handle.await?.is_ok() {
            completed += 1;
        }
    }
    println!("  Completed {completed} checkouts");
    print_pool_status(&pool);

    // 3. Transaction scope
    println!("\n3. Transaction scope:");
    pool.run_in_transaction(|conn| {
        Box::pin(async move {
            conn.execute("INSERT INTO bookings (room) VALUES ('12A')")
                .await?;
            conn.execute("UPDATE rooms SET held = 1 WHERE id = '12A'")
                .await?;
            Ok(())
        })
    })
    .await?;
    println!("  Committed a two-statement unit of work");

    // 4. Health
    println!("\n4. Pool health:");
    tokio::time::sleep(Duration::from_millis(1200)).await;
    let report = pool.health();
    println!("  Status: {}", report.status);
    if let Some(latency) = report.last_latency {
        println!("  Last probe latency: {latency:?}");
    }

    // 5. Metrics
    println!("\n5. Pool metrics:");
    print_pool_metrics(&pool);

    // 6. Graceful shutdown
    println!("\n6. Graceful shutdown:");
    pool.shutdown(Duration::from_secs(2)).await;
    println!(
        "  Pool closed, {} transport(s) still open",
        connector.open_transports()
    );

    Ok(())
}

fn print_pool_status(pool: &Pool) {
    let stats = pool.snapshot();
    println!(
        "  Status: {}/{} connections in use, {} idle ({:.1}% utilization)",
        stats.active,
        stats.max,
        stats.idle,
        stats.utilization()
    );
}

fn print_pool_metrics(pool: &Pool) {
    let metrics = pool.metrics();
    println!("  Connections created: {}", metrics.connections_created);
    println!("  Connections closed: {}", metrics.connections_closed);
    println!(
        "  Checkout success rate: {:.2}%",
        metrics.checkout_success_rate() * 100.0
    );
    println!(
        "  Probes: {} performed, {} failed",
        metrics.probes_performed, metrics.probes_failed
    );
}
