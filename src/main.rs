use env_logger::{Builder, WriteStyle};
use log::{error, info};
use soilmon::config::{AppConfig, DEFAULT_CONFIG_FILE};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration first (without logging)
    let config_file = std::env::args().nth(1);
    let loaded = match &config_file {
        Some(path) => AppConfig::from_file(path),
        None => AppConfig::new(),
    };
    let config = loaded.unwrap_or_else(|e| {
        eprintln!(
            "Failed to load configuration from {}: {:#}",
            config_file.as_deref().unwrap_or(DEFAULT_CONFIG_FILE),
            e
        );
        // Fall back to default configuration
        AppConfig::default()
    });

    // Initialise logger with a configured log level
    Builder::new()
        .filter_level(config.get_log_level())
        .write_style(WriteStyle::Always)
        .format_timestamp_secs()
        .init();

    info!(
        "Access the dashboard at: http://{}:{}",
        config.server.host, config.server.port
    );

    if let Err(e) = soilmon::run(config).await {
        error!("Application error: {}", e);
        return Err(e);
    }
    Ok(())
}
