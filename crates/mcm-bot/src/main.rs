//! Market contract maker - entry point.

use anyhow::Result;
use clap::Parser;
use tracing::info;

/// Automated maker for market contract position tokens.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Configuration file path (can also be set via MCM_CONFIG env var)
    #[arg(short, long)]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    mcm_telemetry::init_logging()?;

    info!("Starting mcm-bot v{}", env!("CARGO_PKG_VERSION"));

    // CLI arg > MCM_CONFIG env var > default
    let config_path = args
        .config
        .or_else(|| std::env::var("MCM_CONFIG").ok())
        .unwrap_or_else(|| "config/default.toml".to_string());

    info!(config_path = %config_path, "Loading configuration");
    let config = mcm_bot::AppConfig::from_file(&config_path)?;

    let app = mcm_bot::Application::new(config)?;
    app.run().await?;

    Ok(())
}
