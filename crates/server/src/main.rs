//! Scout prediction server.
//!
//! Loads configuration, initializes tracing, loads the model artifact once
//! and serves `/predict` until SIGINT.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tokio::net::TcpListener;
use tokio::signal;
use tokio_util::sync::CancellationToken;

use scout_core::config::AppConfig;
use scout_ml::{ArtifactBundle, PositionPredictor};
use scout_server::server::{run_server, AppState};

/// Scout position prediction server
#[derive(Parser, Debug)]
#[command(name = "scout-server", about = "Predict a player's position from attribute ratings")]
struct Args {
    /// Path to TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Force JSON log output regardless of configuration.
    #[arg(long)]
    json_logs: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let config = AppConfig::load(args.config)?;

    scout_core::logging::init_tracing(args.json_logs || config.logging.json);

    tracing::info!(
        addr = %config.listen_addr(),
        manifest = %config.model.manifest_path.display(),
        "starting scout-server"
    );

    // A bad artifact is a deployment fault: refuse to start.
    let bundle = ArtifactBundle::load(&config.model.manifest_path)
        .context("failed to load model artifact")?;
    let state = Arc::new(AppState::new(PositionPredictor::new(Arc::new(bundle))));

    let listener = TcpListener::bind(config.listen_addr())
        .await
        .with_context(|| format!("failed to bind {}", config.listen_addr()))?;

    let cancel = CancellationToken::new();
    let mut server = tokio::spawn(run_server(state, listener, cancel.clone()));

    tokio::select! {
        _ = signal::ctrl_c() => {
            tracing::info!("received SIGINT, shutting down");
        }
        res = &mut server => {
            // Server exited on its own (bind lost, accept error).
            return res.context("server task panicked")?;
        }
    }

    cancel.cancel();

    let grace = Duration::from_millis(config.server.shutdown_grace_ms);
    match tokio::time::timeout(grace, server).await {
        Ok(res) => res.context("server task panicked")??,
        Err(_) => tracing::warn!(?grace, "in-flight requests did not drain in time"),
    }

    tracing::info!("server stopped");
    Ok(())
}
