use std::path::PathBuf;

use anyhow::Result;
use atrium_infrastructure::{AtriumPaths, ConfigService};
use atrium_server::{bootstrap, logging, router};
use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "atrium-server", version, about = "Atrium chat relay server")]
struct Args {
    /// Path to config.toml (defaults to ~/.config/atrium/config.toml)
    #[arg(long, env = "ATRIUM_CONFIG")]
    config: Option<PathBuf>,

    /// Socket address to listen on, overrides the config file
    #[arg(long)]
    bind: Option<String>,

    /// Directory for rolling log files
    #[arg(long)]
    log_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config_service = match args.config {
        Some(path) => ConfigService::new(path),
        None => ConfigService::from_default_location()?,
    };
    let mut config = config_service.load()?;
    if let Some(bind) = args.bind {
        config.server.bind = bind;
    }

    let log_dir = match args.log_dir.or_else(|| config.server.log_dir.clone()) {
        Some(dir) => dir,
        None => AtriumPaths::default().logs_dir()?,
    };
    let _log_guard = logging::init(&log_dir)?;
    tracing::info!(
        config = %config_service.path().display(),
        log_dir = %log_dir.display(),
        "Starting atrium-server"
    );

    let state = bootstrap(&config).await?;
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&config.server.bind).await?;
    tracing::info!(addr = %listener.local_addr()?, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
}
