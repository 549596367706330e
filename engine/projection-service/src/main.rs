//! Projection service entry point

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use projection_service::cli::{Cli, CliHandler};
use projection_service::{initialize_logging, load_configuration};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    let cli = Cli::parse();

    let config = load_configuration(cli.config.as_deref())?;
    initialize_logging(&config.logging.level, &config.logging.format)
        .context("Failed to initialize logging")?;

    info!("Starting projection service v{} for season {}", env!("CARGO_PKG_VERSION"), cli.season);

    let handler = CliHandler::new(&cli, config).await?;
    handler.handle_command(cli.command).await?;

    info!("Projection service finished");
    Ok(())
}
