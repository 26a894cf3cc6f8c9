//! # Roster Main Entry Point
//!
//! Loads configuration, installs logging and dispatches the CLI command.

use clap::Parser;
use roster::{cli::Cli, config::ConfigLoader, telemetry};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration from layered env files and variables
    let config = ConfigLoader::new().load()?;
    telemetry::init_tracing(&config)?;

    tracing::info!(profile = %config.profile, "Loaded configuration");
    if let Ok(redacted_json) = config.redacted_json() {
        tracing::debug!("Configuration: {}", redacted_json);
    }

    roster::cli::run(cli, config).await
}
