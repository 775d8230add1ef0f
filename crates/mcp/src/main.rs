//! Storeagent MCP Server Binary
//!
//! ## Usage
//!
//! ```bash
//! # Run against the configured database
//! storeagent-mcp
//!
//! # Run against a specific database
//! STOREAGENT_DATABASE_URL=sqlite://data/storeagent.db storeagent-mcp
//! ```
//!
//! Stdout carries the MCP stream, so all logs go to stderr.

use anyhow::Result;
use storeagent_core::config::{AppConfig, LoadOptions, LogFormat, LoggingConfig};
use tracing::info;

fn init_logging(config: &LoggingConfig) {
    use tracing::Level;

    let log_level = config.level.parse::<Level>().unwrap_or(Level::INFO);
    let builder = tracing_subscriber::fmt()
        .with_target(false)
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .with_ansi(false);

    match config.format {
        LogFormat::Compact => builder.compact().init(),
        LogFormat::Pretty => builder.pretty().init(),
        LogFormat::Json => builder.json().init(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::load(LoadOptions::default())?;
    init_logging(&config.logging);

    info!(
        event_name = "mcp.server.connecting",
        database_url = %config.database.url,
        "connecting to database"
    );
    let pool = storeagent_db::connect_with_settings(
        &config.database.url,
        config.database.max_connections,
        config.database.timeout_secs,
    )
    .await?;
    storeagent_db::migrations::run_pending(&pool).await?;

    storeagent_mcp::StoreMcpServer::with_pool(pool).run_stdio().await
}
