//! HTTP handler definitions for the chassis.
//!
//! This module defines `AppState` (the shared state carried through axum
//! extractors) and re-exports the handler functions used when building the
//! routing surface.

pub mod health;

pub use health::health_ping_handler;

use std::sync::Arc;

use sqlx::postgres::PgPool;

use crate::config::ServiceConfig;
use crate::identity::ServiceIdentity;

/// Shared application state passed to all axum handlers via `State` extraction.
///
/// Holds `Arc` references (and the internally shared pool) so cloning is
/// cheap. The snapshot and identity are read-only once serving begins.
#[derive(Clone)]
pub struct AppState {
    /// Identity of this service instance.
    pub identity: Arc<ServiceIdentity>,
    /// Pooled store handle, safe for concurrent checkout.
    pub db: PgPool,
    /// Resolved configuration snapshot.
    pub config: Arc<ServiceConfig>,
    /// Host name reported by the health endpoint.
    pub hostname: String,
}
