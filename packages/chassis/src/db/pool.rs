//! Connection pool establishment.
//!
//! The pool is opened lazily (no physical connection exists until first
//! use), then probed once with an explicit round trip. A failed probe is
//! fatal to the call: a service with no reachable store must not start
//! claiming to be healthy, so the caller aborts startup instead of
//! retrying.

use std::time::Duration;

use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::debug;

use crate::config::DatabaseConfig;
use crate::error::{ChassisError, Result};

/// Maps the pool-sizing knobs onto driver pool options.
///
/// A `max_connections` of 0 keeps the driver default; a zero lifetime or
/// idle timeout disables that form of eviction.
#[must_use]
pub fn pool_options(config: &DatabaseConfig) -> PgPoolOptions {
    let mut options = PgPoolOptions::new().min_connections(config.min_connections);

    if config.max_connections > 0 {
        options = options.max_connections(config.max_connections);
    }

    options = options.max_lifetime(if config.max_lifetime_secs > 0 {
        Some(Duration::from_secs(config.max_lifetime_secs))
    } else {
        None
    });

    options.idle_timeout(if config.idle_timeout_secs > 0 {
        Some(Duration::from_secs(config.idle_timeout_secs))
    } else {
        None
    })
}

/// Opens the pooled store handle and verifies liveness.
///
/// # Errors
///
/// Returns a configuration error when the connection string cannot be
/// parsed, and a connectivity error when the liveness probe fails. Probe
/// failure is not retried here.
pub async fn connect(config: &DatabaseConfig) -> Result<PgPool> {
    let pool = pool_options(config)
        .connect_lazy(&config.url)
        .map_err(|e| ChassisError::config(format!("invalid connection string: {e}")))?;

    probe(&pool).await?;
    debug!("store liveness probe succeeded");

    Ok(pool)
}

/// Issues one liveness round trip against the pool.
///
/// # Errors
///
/// Returns a connectivity error when the store does not answer.
pub async fn probe(pool: &PgPool) -> Result<()> {
    sqlx::query("SELECT 1")
        .execute(pool)
        .await
        .map(|_| ())
        .map_err(|e| ChassisError::Connectivity {
            context: "liveness probe",
            source: e,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn options_map_all_four_knobs() {
        let config = DatabaseConfig {
            max_connections: 7,
            min_connections: 2,
            max_lifetime_secs: 120,
            idle_timeout_secs: 60,
            ..DatabaseConfig::default()
        };

        let options = pool_options(&config);
        assert_eq!(options.get_max_connections(), 7);
        assert_eq!(options.get_min_connections(), 2);
        assert_eq!(options.get_max_lifetime(), Some(Duration::from_secs(120)));
        assert_eq!(options.get_idle_timeout(), Some(Duration::from_secs(60)));
    }

    #[test]
    fn zero_disables_expiry() {
        let config = DatabaseConfig {
            max_lifetime_secs: 0,
            idle_timeout_secs: 0,
            ..DatabaseConfig::default()
        };

        let options = pool_options(&config);
        assert_eq!(options.get_max_lifetime(), None);
        assert_eq!(options.get_idle_timeout(), None);
    }

    #[test]
    fn zero_max_connections_keeps_driver_default() {
        let config = DatabaseConfig {
            max_connections: 0,
            ..DatabaseConfig::default()
        };

        let options = pool_options(&config);
        assert_eq!(
            options.get_max_connections(),
            PgPoolOptions::new().get_max_connections()
        );
    }

    #[tokio::test]
    async fn malformed_url_is_a_configuration_error() {
        let config = DatabaseConfig {
            url: "not a connection string".to_string(),
            ..DatabaseConfig::default()
        };

        let err = connect(&config).await.unwrap_err();
        assert!(matches!(err, ChassisError::Config { .. }));
    }
}
