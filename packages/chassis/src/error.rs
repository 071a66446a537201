//! Error taxonomy for the chassis.
//!
//! Fatal setup conditions are modeled as error returns rather than direct
//! process termination; only the binary entry point decides to exit.

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ChassisError>;

/// Errors surfaced by the chassis lifecycle.
#[derive(Debug, thiserror::Error)]
pub enum ChassisError {
    /// A resolved value or call ordering violates the lifecycle contract.
    #[error("invalid configuration: {message}")]
    Config { message: String },

    /// The store was unreachable or a bookkeeping statement failed.
    ///
    /// Raised by the startup liveness probe and by the migration runner's
    /// version bookkeeping. Never retried by the chassis; the caller is
    /// expected to abort startup.
    #[error("store error during {context}: {source}")]
    Connectivity {
        context: &'static str,
        #[source]
        source: sqlx::Error,
    },

    /// A migration step failed to apply.
    ///
    /// The persisted schema version remains at the last successful step.
    #[error("migration step {version} failed: {source}")]
    Migration {
        version: i64,
        #[source]
        source: sqlx::Error,
    },

    /// The migration source directory is unreadable or inconsistent
    /// (duplicate versions, missing step action, unknown target).
    #[error("migration source {path}: {message}")]
    MigrationSource { path: String, message: String },

    /// The listen address could not be bound.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// TLS material could not be loaded.
    #[error("TLS setup failed: {source}")]
    Tls {
        #[source]
        source: std::io::Error,
    },

    /// The serve loop terminated with a fatal I/O error.
    #[error("server terminated abnormally: {source}")]
    Serve {
        #[source]
        source: std::io::Error,
    },
}

impl ChassisError {
    /// Shorthand for a [`ChassisError::Config`] with a formatted message.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Shorthand for a [`ChassisError::MigrationSource`] anchored at `path`.
    pub fn migration_source(path: &std::path::Path, message: impl Into<String>) -> Self {
        Self::MigrationSource {
            path: path.display().to_string(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_display_includes_message() {
        let err = ChassisError::config("TLS requires both --cert and --key");
        assert_eq!(
            err.to_string(),
            "invalid configuration: TLS requires both --cert and --key"
        );
    }

    #[test]
    fn migration_source_error_display_includes_path() {
        let err =
            ChassisError::migration_source(std::path::Path::new("./migrations"), "no steps");
        assert!(err.to_string().contains("./migrations"));
        assert!(err.to_string().contains("no steps"));
    }
}
