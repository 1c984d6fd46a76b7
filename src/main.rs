use anyhow::{Context, Result};
use clap::Parser;
use hr_copilot::cli::{handle_command, Cli};
use hr_copilot::core::config_manager::LoggingConfig;
use hr_copilot::core::ConfigManager;
use hr_copilot::session::Session;
use std::fs::OpenOptions;
use std::sync::Arc;
use tracing::info;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

fn init_logging(config: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .with_context(|| format!("Invalid log level: {}", config.level))?;

    let file_layer = match &config.file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file: {}", path.display()))?;
            Some(
                fmt::layer()
                    .json()
                    .with_writer(Arc::new(file))
                    .with_current_span(false)
                    .with_span_list(false),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .with(file_layer)
        .try_init()
        .context("Failed to initialize logging")
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = ConfigManager::load()?;
    if let Some(url) = cli.api_url {
        config.service.api_url = url;
    }
    if let Some(timeout) = cli.timeout {
        config.service.timeout_seconds = timeout;
    }
    config.service.validate().context("Invalid command line override")?;

    init_logging(&config.logging)?;
    info!("Environment: {}", config.environment);
    info!("Backend: {}", config.service.api_url);

    let session = Session::from_config(&config)?;
    let result = handle_command(cli.command, &session).await;

    for notification in session.notifications().list() {
        eprintln!("[{}] {}", notification.kind.title(), notification.message);
    }
    session.shutdown();

    result
}
