//! Toolhub server - tools and interaction logging over HTTP.

use anyhow::Result;
use axum::Router;
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use toolhub_server::{config, logging, routes, state};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use config::Config;
use logging::{LogConfig, LogFormat};
use state::AppState;

/// Toolhub server - callable tools and agent interaction analytics.
#[derive(Parser, Debug)]
#[command(name = "toolhub-server")]
#[command(about = "HTTP server exposing tools and an agent interaction log")]
#[command(version)]
struct Cli {
    /// Path to config file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Override port from config
    #[arg(short, long)]
    port: Option<u16>,

    /// Override database path from config
    #[arg(long, value_name = "FILE")]
    db: Option<PathBuf>,

    /// Enable verbose logging (INFO level for every area)
    #[arg(short, long)]
    verbose: bool,

    /// Enable debug logging (includes each store operation)
    #[arg(short, long)]
    debug: bool,

    /// Enable trace logging (TRACE level for everything)
    #[arg(long)]
    trace: bool,

    /// Quiet mode (WARN and ERROR only)
    #[arg(short, long)]
    quiet: bool,

    /// Set log level for specific targets (e.g., "store=debug").
    /// Can be specified multiple times. Targets are prefixed with "toolhub::" automatically.
    #[arg(long = "log", value_name = "TARGET=LEVEL")]
    log_overrides: Vec<String>,

    /// Log output format
    #[arg(long = "log-format", value_name = "FORMAT", default_value = "text")]
    log_format: LogFormat,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_config = LogConfig::from_cli(
        cli.verbose,
        cli.debug,
        cli.trace,
        cli.quiet,
        cli.log_overrides,
        cli.log_format,
    );
    logging::init(&log_config);

    let mut config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    if let Some(port) = cli.port {
        config.port = port;
    }
    if let Some(db) = cli.db {
        config.db_path = db;
    }

    tracing::info!(
        target: "toolhub::startup",
        "Loaded configuration (port: {}, db: {}, collection: {})",
        config.port,
        config.db_path.display(),
        config.collection
    );

    let state = Arc::new(AppState::new(config.clone()));
    tracing::info!(
        target: "toolhub::startup",
        "Registered {} tools and {} prompts",
        state.tools.tools().len(),
        state.prompts.prompts().len()
    );

    let app = Router::new()
        .nest("/api", routes::api_router())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    tracing::info!(
        target: "toolhub::startup",
        "Starting {} {} on {}",
        config.server_name,
        config.server_version,
        addr
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
