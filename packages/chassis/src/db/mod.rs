//! Pooled store access and schema migrations.

pub mod migrate;
pub mod pool;

pub use migrate::{current_version, discover, migrate_to, MigrateOutcome, MigrationStep};
pub use pool::{connect, pool_options, probe};
