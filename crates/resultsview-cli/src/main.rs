//! Results View CLI - line-delimited JSON bridge entry point

use clap::Parser;
use tokio::io::{stdin, stdout, BufReader};
use tracing::{error, info};

use resultsview_cli::{app::BridgeApp, cli::Cli, config::AppConfig, error::Result};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let cli = Cli::parse();

    // Initialize logging
    setup_logging(cli.verbose);

    // Load configuration
    let mut config = load_configuration(&cli)?;
    if let Some(width) = cli.width {
        config.headless.width = width;
    }

    let app = BridgeApp::new(config).await?;

    if let Err(e) = app.run(BufReader::new(stdin()), stdout()).await {
        error!("Bridge stopped: {}", e);
        std::process::exit(1);
    }

    info!("Results view bridge exited successfully");
    Ok(())
}

/// Setup logging based on verbosity level; stdout carries the protocol
fn setup_logging(verbose: bool) {
    let log_level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();
}

/// Load configuration from file or use defaults
fn load_configuration(cli: &Cli) -> Result<AppConfig> {
    if let Some(config_path) = &cli.config {
        info!("Loading configuration from: {}", config_path);
        AppConfig::load_from_file(config_path)
    } else {
        info!("Using default configuration");
        Ok(AppConfig::default())
    }
}
