//! Pool configuration.

use std::sync::Arc;
use std::time::Duration;

/// Default health check query.
pub const DEFAULT_HEALTH_CHECK_QUERY: &str = "SELECT 1";

/// Configuration for the connection pool.
///
/// All settings are immutable once the pool has been constructed.
///
/// This struct is marked `#[non_exhaustive]` to allow adding new fields
/// in future minor versions without breaking changes. Use the builder
/// pattern methods or [`Default::default()`] to construct instances.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct PoolConfig {
    /// Minimum number of connections to maintain.
    pub min_connections: u32,

    /// Maximum number of connections allowed.
    pub max_connections: u32,

    /// Time to wait for a connection before acquire fails.
    pub acquire_timeout: Duration,

    /// Time a connection can sit idle before being closed (above the
    /// minimum pool size).
    pub idle_timeout: Duration,

    /// Maximum lifetime of a connection. Connections older than this are
    /// never handed out again.
    pub max_lifetime: Duration,

    /// Interval between health probe ticks.
    pub health_check_interval: Duration,

    /// Bound on a single probe's acquire-plus-round-trip, so a slow probe
    /// cannot stall caller-visible latency.
    pub health_probe_timeout: Duration,

    /// Consecutive probe failures before the pool is reported degraded.
    pub health_failure_threshold: u32,

    /// Query executed by the health probe (defaults to "SELECT 1").
    ///
    /// The query should be lightweight and return quickly.
    pub health_check_query: Arc<str>,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            min_connections: 1,
            max_connections: 10,
            acquire_timeout: Duration::from_secs(30),
            idle_timeout: Duration::from_secs(600),
            max_lifetime: Duration::from_secs(1800),
            health_check_interval: Duration::from_secs(30),
            health_probe_timeout: Duration::from_secs(5),
            health_failure_threshold: 3,
            health_check_query: Arc::from(DEFAULT_HEALTH_CHECK_QUERY),
        }
    }
}

impl PoolConfig {
    /// Create a new pool configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the minimum number of connections.
    #[must_use]
    pub fn min_connections(mut self, count: u32) -> Self {
        self.min_connections = count;
        self
    }

    /// Set the maximum number of connections.
    #[must_use]
    pub fn max_connections(mut self, count: u32) -> Self {
        self.max_connections = count;
        self
    }

    /// Set the connection acquisition timeout.
    #[must_use]
    pub fn acquire_timeout(mut self, timeout: Duration) -> Self {
        self.acquire_timeout = timeout;
        self
    }

    /// Set the idle connection timeout.
    #[must_use]
    pub fn idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = timeout;
        self
    }

    /// Set the maximum connection lifetime.
    #[must_use]
    pub fn max_lifetime(mut self, lifetime: Duration) -> Self {
        self.max_lifetime = lifetime;
        self
    }

    /// Set the health probe interval.
    #[must_use]
    pub fn health_check_interval(mut self, interval: Duration) -> Self {
        self.health_check_interval = interval;
        self
    }

    /// Set the per-probe timeout.
    #[must_use]
    pub fn health_probe_timeout(mut self, timeout: Duration) -> Self {
        self.health_probe_timeout = timeout;
        self
    }

    /// Set the number of consecutive probe failures that mark the pool
    /// degraded.
    #[must_use]
    pub fn health_failure_threshold(mut self, threshold: u32) -> Self {
        self.health_failure_threshold = threshold;
        self
    }

    /// Set a custom health check query.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use aqueduct_pool::PoolConfig;
    ///
    /// // Simple ping (default)
    /// let config = PoolConfig::new();
    ///
    /// // Check the server can execute functions
    /// let config = PoolConfig::new().health_check_query("SELECT NOW()");
    /// ```
    #[must_use]
    pub fn health_check_query(mut self, query: impl Into<Arc<str>>) -> Self {
        self.health_check_query = query.into();
        self
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), crate::error::PoolError> {
        if self.max_connections == 0 {
            return Err(crate::error::PoolError::Configuration(
                "max_connections must be greater than 0".into(),
            ));
        }
        if self.min_connections > self.max_connections {
            return Err(crate::error::PoolError::Configuration(
                "min_connections cannot be greater than max_connections".into(),
            ));
        }
        if self.health_failure_threshold == 0 {
            return Err(crate::error::PoolError::Configuration(
                "health_failure_threshold must be greater than 0".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = PoolConfig::default();
        assert_eq!(config.min_connections, 1);
        assert_eq!(config.max_connections, 10);
        assert_eq!(config.health_failure_threshold, 3);
        assert_eq!(&*config.health_check_query, DEFAULT_HEALTH_CHECK_QUERY);
    }

    #[test]
    fn test_config_builder_methods() {
        let config = PoolConfig::new()
            .min_connections(5)
            .max_connections(50)
            .acquire_timeout(Duration::from_secs(60))
            .idle_timeout(Duration::from_secs(120))
            .max_lifetime(Duration::from_secs(3600))
            .health_check_interval(Duration::from_secs(10))
            .health_probe_timeout(Duration::from_secs(2))
            .health_failure_threshold(5);

        assert_eq!(config.min_connections, 5);
        assert_eq!(config.max_connections, 50);
        assert_eq!(config.acquire_timeout, Duration::from_secs(60));
        assert_eq!(config.idle_timeout, Duration::from_secs(120));
        assert_eq!(config.max_lifetime, Duration::from_secs(3600));
        assert_eq!(config.health_check_interval, Duration::from_secs(10));
        assert_eq!(config.health_probe_timeout, Duration::from_secs(2));
        assert_eq!(config.health_failure_threshold, 5);
    }

    #[test]
    fn test_custom_health_check_query() {
        let config = PoolConfig::new().health_check_query("SELECT NOW()");
        assert_eq!(&*config.health_check_query, "SELECT NOW()");

        // Also test with String
        let config2 = PoolConfig::new().health_check_query(String::from("SELECT 2"));
        assert_eq!(&*config2.health_check_query, "SELECT 2");
    }

    #[test]
    fn test_config_validation_success() {
        let config = PoolConfig::new().min_connections(1).max_connections(10);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation_min_greater_than_max() {
        let config = PoolConfig::new().min_connections(20).max_connections(10);

        let result = config.validate();
        assert!(result.is_err());
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("min_connections cannot be greater than max_connections")
        );
    }

    #[test]
    fn test_config_validation_zero_max() {
        let mut config = PoolConfig::new();
        config.max_connections = 0;

        let result = config.validate();
        assert!(result.is_err());
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("max_connections must be greater than 0")
        );
    }

    #[test]
    fn test_config_validation_zero_threshold() {
        let mut config = PoolConfig::new();
        config.health_failure_threshold = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_equal_min_max() {
        let config = PoolConfig::new().min_connections(5).max_connections(5);
        assert!(config.validate().is_ok());
    }
}
