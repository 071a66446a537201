//! Targeted, versioned schema migrations.
//!
//! Steps live in a source directory as `{version}_{name}.up.sql` /
//! `{version}_{name}.down.sql` pairs with strictly increasing (not
//! necessarily contiguous) versions. The store keeps a single-row
//! `schema_version` table recording the version of the last successfully
//! applied step; an absent row means version 0.
//!
//! A run applies steps strictly in order between the current and target
//! versions, committing each step's SQL together with its version update
//! in one transaction. Runs are not atomic across steps: the first failing
//! step stops the run and the recorded version stays at the last success,
//! so a retry resumes from the failed step.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use sqlx::postgres::PgPool;
use sqlx::Postgres;
use tracing::{debug, info};

use crate::config::MigrateDirection;
use crate::db::pool::probe;
use crate::error::{ChassisError, Result};

const CREATE_VERSION_TABLE: &str =
    "CREATE TABLE IF NOT EXISTS schema_version (version BIGINT NOT NULL)";
const SELECT_VERSION: &str = "SELECT version FROM schema_version LIMIT 1";
const CLEAR_VERSION: &str = "DELETE FROM schema_version";
const INSERT_VERSION: &str = "INSERT INTO schema_version (version) VALUES ($1)";

/// Postgres error code for "relation does not exist".
const UNDEFINED_TABLE: &str = "42P01";

/// Outcome of a migration run.
///
/// Both variants are success. `NoChange` is distinguishable so callers can
/// log what happened, but it is reported identically at the CLI boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrateOutcome {
    /// The given number of steps were applied.
    Applied(usize),
    /// The store was already at the target version.
    NoChange,
}

/// One versioned step discovered in the migration source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationStep {
    /// Step version; versions are unique and strictly increasing.
    pub version: i64,
    /// Descriptive name from the file stem.
    pub name: String,
    /// Path of the up action, when present.
    pub up: Option<PathBuf>,
    /// Path of the down action, when present.
    pub down: Option<PathBuf>,
}

/// A step scheduled for application, with the version the store records
/// once the step commits.
#[derive(Debug, Clone, PartialEq, Eq)]
struct PlannedStep {
    version: i64,
    path: PathBuf,
    next_version: i64,
}

enum Action {
    Up,
    Down,
}

/// Splits `0001_create_users.up.sql` into version, name, and action.
fn parse_file_name(file_name: &str) -> Option<(i64, String, Action)> {
    let (stem, action) = if let Some(stem) = file_name.strip_suffix(".up.sql") {
        (stem, Action::Up)
    } else if let Some(stem) = file_name.strip_suffix(".down.sql") {
        (stem, Action::Down)
    } else {
        return None;
    };

    let (version, name) = stem.split_once('_')?;
    let version: i64 = version.parse().ok()?;
    Some((version, name.to_string(), action))
}

/// Discovers the ordered set of migration steps at `dir`.
///
/// Files that do not match the step naming convention are ignored.
///
/// # Errors
///
/// Returns a migration-source error when the directory is unreadable, a
/// version appears twice for the same action or under two names, or a
/// version is not positive.
pub fn discover(dir: &Path) -> Result<Vec<MigrationStep>> {
    let entries = std::fs::read_dir(dir)
        .map_err(|e| ChassisError::migration_source(dir, format!("unreadable: {e}")))?;

    let mut by_version: BTreeMap<i64, MigrationStep> = BTreeMap::new();

    for entry in entries {
        let entry =
            entry.map_err(|e| ChassisError::migration_source(dir, format!("unreadable: {e}")))?;
        let file_name = entry.file_name();
        let Some((version, name, action)) = file_name.to_str().and_then(parse_file_name) else {
            debug!("ignoring non-step file {:?}", file_name);
            continue;
        };

        if version <= 0 {
            return Err(ChassisError::migration_source(
                dir,
                format!("step versions must be positive, got {version}"),
            ));
        }

        let step = by_version.entry(version).or_insert_with(|| MigrationStep {
            version,
            name: name.clone(),
            up: None,
            down: None,
        });
        if step.name != name {
            return Err(ChassisError::migration_source(
                dir,
                format!("version {version} appears under two names: {} and {name}", step.name),
            ));
        }

        let slot = match action {
            Action::Up => &mut step.up,
            Action::Down => &mut step.down,
        };
        if slot.is_some() {
            return Err(ChassisError::migration_source(
                dir,
                format!("duplicate step for version {version}"),
            ));
        }
        *slot = Some(entry.path());
    }

    Ok(by_version.into_values().collect())
}

/// Reads the persisted schema version. An absent table or row is version 0.
///
/// # Errors
///
/// Returns a connectivity error on any other store failure.
pub async fn current_version(pool: &PgPool) -> Result<i64> {
    match sqlx::query_scalar::<_, i64>(SELECT_VERSION)
        .fetch_optional(pool)
        .await
    {
        Ok(row) => Ok(row.unwrap_or(0)),
        Err(e) => {
            let undefined_table = e
                .as_database_error()
                .and_then(|db| db.code())
                .is_some_and(|code| code == UNDEFINED_TABLE);
            if undefined_table {
                Ok(0)
            } else {
                Err(ChassisError::Connectivity {
                    context: "version bookkeeping",
                    source: e,
                })
            }
        }
    }
}

/// Plans the ordered steps between `current` and `target`.
///
/// Movement is derived from the comparison: ascending up-steps when the
/// target is above the current version, descending down-steps when below.
/// The caller has already handled the equal case.
fn plan(steps: &[MigrationStep], current: i64, target: i64, dir: &Path) -> Result<Vec<PlannedStep>> {
    if target != 0 && !steps.iter().any(|s| s.version == target) {
        return Err(ChassisError::migration_source(
            dir,
            format!("target version {target} not found"),
        ));
    }

    let mut planned = Vec::new();

    if target > current {
        for step in steps.iter().filter(|s| s.version > current && s.version <= target) {
            let path = step.up.clone().ok_or_else(|| {
                ChassisError::migration_source(
                    dir,
                    format!("version {} has no up step", step.version),
                )
            })?;
            planned.push(PlannedStep {
                version: step.version,
                path,
                next_version: step.version,
            });
        }
    } else {
        for idx in (0..steps.len()).rev() {
            let step = &steps[idx];
            if step.version <= target || step.version > current {
                continue;
            }
            let path = step.down.clone().ok_or_else(|| {
                ChassisError::migration_source(
                    dir,
                    format!("version {} has no down step", step.version),
                )
            })?;
            let next_version = if idx == 0 { 0 } else { steps[idx - 1].version };
            planned.push(PlannedStep {
                version: step.version,
                path,
                next_version,
            });
        }
    }

    Ok(planned)
}

/// Derives the movement a run from `current` to `target` would take.
///
/// Returns `None` when the store is already at the target.
#[must_use]
pub fn derive_direction(current: i64, target: i64) -> Option<MigrateDirection> {
    match target.cmp(&current) {
        std::cmp::Ordering::Greater => Some(MigrateDirection::Up),
        std::cmp::Ordering::Less => Some(MigrateDirection::Down),
        std::cmp::Ordering::Equal => None,
    }
}

/// Migrates the store to `target`, applying steps from `source` in order.
///
/// Probes store liveness first; a store already at the target is a
/// successful no-op. Each step commits its SQL together with the version
/// update; the first failure stops the run with the recorded version at
/// the last success, and a retry resumes from the failed step. Repeated
/// invocations at the target are safe no-ops.
///
/// # Errors
///
/// Connectivity errors for the probe and bookkeeping, migration-source
/// errors for discovery and planning problems, and a migration error
/// naming the failed step's version.
pub async fn migrate_to(pool: &PgPool, source: &Path, target: i64) -> Result<MigrateOutcome> {
    if target < 0 {
        return Err(ChassisError::config(format!(
            "migration target must be non-negative, got {target}"
        )));
    }

    probe(pool).await?;

    let steps = discover(source)?;
    ensure_version_table(pool).await?;
    let current = current_version(pool).await?;

    if current == target {
        info!("schema already at version {target}, nothing to apply");
        return Ok(MigrateOutcome::NoChange);
    }

    let planned = plan(&steps, current, target, source)?;
    info!(
        "migrating schema from version {current} to {target} ({} step(s))",
        planned.len()
    );

    let mut applied = 0usize;
    for step in &planned {
        apply_step(pool, step).await?;
        applied += 1;
        debug!("applied step {} -> version {}", step.version, step.next_version);
    }

    Ok(MigrateOutcome::Applied(applied))
}

async fn ensure_version_table(pool: &PgPool) -> Result<()> {
    sqlx::query(CREATE_VERSION_TABLE)
        .execute(pool)
        .await
        .map(|_| ())
        .map_err(|e| ChassisError::Connectivity {
            context: "version bookkeeping",
            source: e,
        })
}

/// Applies one step: its SQL and the version update commit atomically.
async fn apply_step(pool: &PgPool, step: &PlannedStep) -> Result<()> {
    let sql = std::fs::read_to_string(&step.path).map_err(|e| {
        ChassisError::migration_source(&step.path, format!("unreadable step: {e}"))
    })?;

    let failed = |source| ChassisError::Migration {
        version: step.version,
        source,
    };

    let mut tx = pool.begin().await.map_err(failed)?;
    sqlx::raw_sql(&sql)
        .execute(&mut *tx)
        .await
        .map_err(failed)?;
    set_version(&mut tx, step.next_version).await.map_err(failed)?;
    tx.commit().await.map_err(failed)?;

    Ok(())
}

async fn set_version(
    tx: &mut sqlx::Transaction<'_, Postgres>,
    version: i64,
) -> std::result::Result<(), sqlx::Error> {
    sqlx::query(CLEAR_VERSION).execute(&mut **tx).await?;
    sqlx::query(INSERT_VERSION)
        .bind(version)
        .execute(&mut **tx)
        .await?;
    Ok(())
}
