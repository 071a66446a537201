//! Binary entry point for the chassis.
//!
//! Resolves the configuration snapshot exactly once, then hands it to the
//! selected command. This is the only place that terminates the process:
//! every fatal condition below is logged with its cause, then mapped to a
//! non-zero exit code.

use clap::Parser;
use tracing::error;
use tracing_subscriber::EnvFilter;

use chassis::cli::{Cli, Command};
use chassis::commands;
use chassis::config::{resolve, ConfigOverrides, ServiceConfig};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.debug);

    let config = resolve(
        ServiceConfig::default(),
        &ConfigOverrides::from_env(),
        &cli.overrides(),
    );

    let result = match cli.command {
        Command::Serve(_) => commands::serve(config).await,
        Command::Migrate(_) => commands::migrate(config).await.map(|_| ()),
    };

    if let Err(e) = result {
        error!("fatal: {e}");
        std::process::exit(1);
    }
}

fn init_tracing(debug: bool) {
    let default_directive = if debug { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
