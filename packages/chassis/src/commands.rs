//! Command handlers for the chassis binary.
//!
//! Each handler receives the already-resolved configuration snapshot; no
//! ambient state is consulted. Handlers return errors instead of exiting,
//! so the entry point alone decides process termination.

use tracing::info;

use crate::config::{MigrateDirection, ServiceConfig};
use crate::db;
use crate::db::MigrateOutcome;
use crate::error::{ChassisError, Result};
use crate::service::Service;

/// Runs the full serve lifecycle: pool, routes, then the blocking serve
/// loop until Ctrl-C.
///
/// # Errors
///
/// Propagates any failed lifecycle step; nothing is retried.
pub async fn serve(config: ServiceConfig) -> Result<()> {
    let mut service = Service::new(config);
    service.initialize().await?;
    service.serve(shutdown_signal()).await
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("shutdown signal received");
}

/// Runs the migration runner against the configured store and exits.
///
/// A store already at the target is a success, reported identically to a
/// run that applied steps.
///
/// # Errors
///
/// Propagates connectivity, source, and step-application failures; on a
/// failed step the persisted version stays at the last success.
pub async fn migrate(config: ServiceConfig) -> Result<MigrateOutcome> {
    let pool = db::pool::connect(&config.database).await?;

    let current = db::migrate::current_version(&pool).await?;
    check_direction(config.migration.direction, current, config.migration.target)?;

    let outcome =
        db::migrate::migrate_to(&pool, &config.migration.source, config.migration.target).await?;
    match outcome {
        MigrateOutcome::Applied(count) => info!("migration complete: {count} step(s) applied"),
        MigrateOutcome::NoChange => info!("migration complete: no change"),
    }

    pool.close().await;
    Ok(outcome)
}

/// The declared direction must match the movement the target implies.
///
/// The runner derives movement from the current and target versions; a
/// declared direction that contradicts it is rejected rather than
/// silently ignored.
fn check_direction(declared: MigrateDirection, current: i64, target: i64) -> Result<()> {
    match db::migrate::derive_direction(current, target) {
        None => Ok(()),
        Some(derived) if derived == declared => Ok(()),
        Some(_) => Err(ChassisError::config(format!(
            "direction '{}' conflicts with moving from version {current} to {target}",
            direction_str(declared)
        ))),
    }
}

fn direction_str(direction: MigrateDirection) -> &'static str {
    match direction {
        MigrateDirection::Up => "up",
        MigrateDirection::Down => "down",
    }
}
