//! CLI structure and command definitions.
//!
//! Defines the operational surface of the chassis binary with clap's
//! derive macros: a persistent connection-string flag, a persistent debug
//! flag, and the `serve` / `migrate` subcommands. Flags the caller did not
//! set stay `None` so they never override a lower-precedence source.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::config::{ConfigOverrides, MigrateDirection};

/// Service chassis: pooled Postgres, schema migrations, HTTP serving.
#[derive(Parser)]
#[command(name = "chassis", version, about, long_about = None)]
pub struct Cli {
    /// Postgres connection string (env: POSTGRES_URI, flag wins)
    #[arg(long, short = 'P', global = true, value_name = "URI")]
    pub postgres: Option<String>,

    /// Enable debug logging
    #[arg(long, short = 'D', global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands.
#[derive(Subcommand)]
pub enum Command {
    /// Start the HTTP server
    Serve(ServeArgs),

    /// Apply schema migrations and exit
    Migrate(MigrateArgs),
}

/// Flags for the `serve` command.
#[derive(Args)]
pub struct ServeArgs {
    /// Host to listen on
    #[arg(long, short = 'H', value_name = "HOST")]
    pub host: Option<String>,

    /// Port to listen on
    #[arg(long, short = 'p', value_name = "PORT")]
    pub port: Option<u16>,

    /// Path to the TLS certificate file
    #[arg(long, short = 'c', value_name = "PATH")]
    pub cert: Option<PathBuf>,

    /// Path to the TLS private key file
    #[arg(long, short = 'k', value_name = "PATH")]
    pub key: Option<PathBuf>,

    /// Path to the TLS CA file
    #[arg(long, short = 'a', value_name = "PATH")]
    pub ca: Option<PathBuf>,
}

/// Flags for the `migrate` command.
#[derive(Args)]
pub struct MigrateArgs {
    /// Direction to migrate
    #[arg(long, short = 'd', value_enum)]
    pub direction: Option<MigrateDirection>,

    /// Target schema level to migrate to
    #[arg(long, short = 't', value_name = "LEVEL")]
    pub target: Option<i64>,

    /// Directory containing migration step files
    #[arg(long, value_name = "DIR")]
    pub source: Option<PathBuf>,
}

impl Cli {
    /// Collapses every flag the caller actually set into one overlay.
    ///
    /// Unset flags stay `None`, so the overlay only overrides what was
    /// explicitly given on the command line.
    #[must_use]
    pub fn overrides(&self) -> ConfigOverrides {
        let mut overlay = ConfigOverrides {
            database_url: self.postgres.clone(),
            ..ConfigOverrides::default()
        };

        match &self.command {
            Command::Serve(args) => {
                overlay.host = args.host.clone();
                overlay.port = args.port;
                overlay.cert_path = args.cert.clone();
                overlay.key_path = args.key.clone();
                overlay.ca_path = args.ca.clone();
            }
            Command::Migrate(args) => {
                overlay.migrate_direction = args.direction;
                overlay.migrate_target = args.target;
                overlay.migrate_source = args.source.clone();
            }
        }

        overlay
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn serve_flags_flow_into_the_overlay() {
        let cli = Cli::try_parse_from([
            "chassis", "serve", "--host", "10.0.0.1", "--port", "9090", "--cert", "/tls/c.pem",
            "--key", "/tls/k.pem",
        ])
        .unwrap();

        let overlay = cli.overrides();
        assert_eq!(overlay.host.as_deref(), Some("10.0.0.1"));
        assert_eq!(overlay.port, Some(9090));
        assert_eq!(overlay.cert_path, Some(PathBuf::from("/tls/c.pem")));
        assert_eq!(overlay.key_path, Some(PathBuf::from("/tls/k.pem")));
        assert!(overlay.ca_path.is_none());
        assert!(overlay.database_url.is_none());
    }

    #[test]
    fn unset_flags_do_not_enter_the_overlay() {
        let cli = Cli::try_parse_from(["chassis", "serve"]).unwrap();
        let overlay = cli.overrides();
        assert!(overlay.host.is_none());
        assert!(overlay.port.is_none());
        assert!(overlay.cert_path.is_none());
    }

    #[test]
    fn persistent_flag_is_accepted_after_the_subcommand() {
        let cli =
            Cli::try_parse_from(["chassis", "serve", "--postgres", "postgres://db/x"]).unwrap();
        assert_eq!(cli.postgres.as_deref(), Some("postgres://db/x"));
    }

    #[test]
    fn migrate_flags_flow_into_the_overlay() {
        let cli = Cli::try_parse_from([
            "chassis", "migrate", "--direction", "down", "--target", "0", "--source", "./steps",
        ])
        .unwrap();

        let overlay = cli.overrides();
        assert_eq!(overlay.migrate_direction, Some(MigrateDirection::Down));
        assert_eq!(overlay.migrate_target, Some(0));
        assert_eq!(overlay.migrate_source, Some(PathBuf::from("./steps")));
    }

    #[test]
    fn non_numeric_port_is_rejected_at_parse_time() {
        let result = Cli::try_parse_from(["chassis", "serve", "--port", "http"]);
        assert!(result.is_err());
    }

    #[test]
    fn negative_target_parses_and_is_left_to_the_runner_guard() {
        let cli = Cli::try_parse_from(["chassis", "migrate", "--target=-1"]).unwrap();
        assert_eq!(cli.overrides().migrate_target, Some(-1));
    }
}
