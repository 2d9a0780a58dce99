use anyhow::{anyhow, Result};
use clap::Parser;

use cycle::cli::{self, Cli};
use cycle::config::AppConfig;
use cycle::App;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_path = cycle::logging::init_logging(cli.verbose)?;
    tracing::info!("Logging to {}", log_path.display());

    let config = AppConfig::load()?;
    config.validate().map_err(|e| anyhow!("Invalid configuration: {}", e))?;

    let app = App::from_config(&config)?;
    cli::run(cli.command, &app).await
}
