use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use tokio::sync::RwLock;
use tracing_subscriber::EnvFilter;

use node_api::AppState;
use node_app::{config_path, heartbeat_loop, load_config, seed_directory};
use node_fanout::TracingObserver;
use node_registry::NodeIdentity;
use node_remote::HttpClientFactory;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let path = config_path();
    let config = load_config(&path)?;
    let node_id = NodeIdentity::new(config.node_id.clone());
    tracing::info!("starting fanout node {node_id} (config {})", path.display());

    let listener = tokio::net::TcpListener::bind(&config.listen)
        .await
        .with_context(|| format!("bind to {}", config.listen))?;
    let port = listener.local_addr().context("local addr")?.port();

    let registry = Arc::new(RwLock::new(seed_directory(&config, port)));
    let factory =
        Arc::new(HttpClientFactory::new(config.call_timeout()).context("build http client")?);

    let state = Arc::new(AppState {
        node_id: node_id.clone(),
        registry: registry.clone(),
        factory: factory.clone(),
        fan_out: config.fan_out_config(),
        observer: Arc::new(TracingObserver),
        api_token: config.api_token.clone(),
        started_at: Instant::now(),
    });

    let credential = config.heartbeat_credential();
    let interval = config.heartbeat_interval();
    let alive_timeout = config.alive_timeout();
    tokio::spawn(async move {
        heartbeat_loop(node_id, registry, factory, credential, interval, alive_timeout).await;
    });

    let app = node_api::build_router(state);
    tracing::info!("HTTP API listening on {}", config.listen);
    axum::serve(listener, app).await.context("serve")?;

    Ok(())
}
