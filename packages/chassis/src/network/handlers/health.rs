//! Health endpoint handler.
//!
//! `GET /health/ping` reports instance identity for orchestration systems;
//! it doubles as a liveness/readiness probe and is the only route the
//! chassis registers unconditionally.

use axum::extract::State;
use axum::Json;
use serde::Serialize;
use uuid::Uuid;

use super::AppState;

/// Body returned by the health endpoint.
#[derive(Debug, Serialize)]
pub struct HealthBody {
    pub status: &'static str,
    pub instance: String,
    pub instance_id: Uuid,
    pub version: String,
    pub executable: String,
    pub hostname: String,
}

/// Returns instance identity as JSON with status 200.
///
/// Always 200: the process answering at all is the signal. Downstream
/// dependencies are deliberately not checked here, since a failed probe
/// triggers restarts in most orchestrators.
pub async fn health_ping_handler(State(state): State<AppState>) -> Json<HealthBody> {
    Json(HealthBody {
        status: "ok",
        instance: state.identity.instance_name.clone(),
        instance_id: state.identity.instance_id,
        version: state.identity.version.clone(),
        executable: state.identity.executable.clone(),
        hostname: state.hostname.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServiceConfig;
    use crate::identity::ServiceIdentity;
    use std::sync::Arc;

    fn test_state() -> AppState {
        let pool = sqlx::postgres::PgPoolOptions::new()
            .connect_lazy("postgres://localhost/unused")
            .unwrap();
        AppState {
            identity: Arc::new(ServiceIdentity::generate().with_version("9.9.9")),
            db: pool,
            config: Arc::new(ServiceConfig::default()),
            hostname: "test-host".to_string(),
        }
    }

    #[tokio::test]
    async fn health_ping_reports_identity() {
        let state = test_state();
        let expected_name = state.identity.instance_name.clone();
        let expected_id = state.identity.instance_id;

        let response = health_ping_handler(State(state)).await;
        let body = response.0;

        assert_eq!(body.status, "ok");
        assert_eq!(body.instance, expected_name);
        assert_eq!(body.instance_id, expected_id);
        assert_eq!(body.version, "9.9.9");
        assert!(!body.executable.is_empty());
        assert_eq!(body.hostname, "test-host");
    }

    #[test]
    fn health_body_serializes_every_field() {
        let body = HealthBody {
            status: "ok",
            instance: "brisk-falcon".to_string(),
            instance_id: Uuid::new_v4(),
            version: "0.1.0".to_string(),
            executable: "chassis".to_string(),
            hostname: "node-1".to_string(),
        };

        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["status"], "ok");
        assert_eq!(json["instance"], "brisk-falcon");
        assert!(json["instance_id"].is_string());
        assert_eq!(json["version"], "0.1.0");
        assert_eq!(json["executable"], "chassis");
        assert_eq!(json["hostname"], "node-1");
    }
}
