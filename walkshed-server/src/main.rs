//! Walkshed HTTP service
//!
//! Serves reachability queries, test-road edits and network snapshots as
//! JSON. Logging is controlled through `RUST_LOG`.
//!
//! ```bash
//! walkshed-server --config walkshed.toml --snapshot data/network.json
//! ```

mod config;
mod routes;

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;
use walkshed_core::{engine::Engine, loading::Snapshot, loading::import_snapshot, model::Network};

use config::{Cli, ServerConfig};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "walkshed_server=info,walkshed_core=info,tower_http=info".into());
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();
}

fn load_network(config: &ServerConfig) -> anyhow::Result<Network> {
    let Some(path) = &config.snapshot else {
        info!("No snapshot configured, starting with an empty network");
        return Ok(Network::new());
    };
    info!("Loading network snapshot: {}", path.display());
    let snapshot = Snapshot::read(path)?;
    import_snapshot(&snapshot).with_context(|| format!("Invalid snapshot '{}'", path.display()))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {e}");
    }
    info!("Shutting down");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let config = ServerConfig::load(cli.config.as_deref())?.with_overrides(&cli);

    let network = load_network(&config)?;
    info!(
        nodes = network.node_count(),
        edges = network.edge_count(),
        "Network ready"
    );
    let engine = Arc::new(Engine::new(network, config.engine.clone()));
    let app = routes::router(engine, &config);

    let listener = TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind))?;
    info!("Listening on {}", config.bind);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}
