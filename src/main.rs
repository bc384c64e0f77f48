use anyhow::{anyhow, Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use ultra_router::config::AppConfig;
use ultra_router::router::api::{create_api_router, SharedNode};

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing().context("initialize tracing subscriber")?;

    if let Err(err) = run().await {
        tracing::error!(error = ?err, "fatal router node error");
        std::process::exit(1);
    }
    Ok(())
}

async fn run() -> Result<()> {
    let config = AppConfig::load().context("load configuration")?;
    let node = config.build_node().context("build node from genesis")?;

    info!(
        router = %node.router.address(),
        wrapped_native = %node.router.wrapped_native(),
        admin = %config.admin,
        block = node.chain.block_number(),
        "router node initialized"
    );

    let node: SharedNode = Arc::new(Mutex::new(node));
    let api = create_api_router(node.clone());
    let listener = tokio::net::TcpListener::bind(&config.listen_addr)
        .await
        .with_context(|| format!("bind API server address {}", config.listen_addr))?;
    info!(address = %config.listen_addr, "HTTP API server starting");
    let api_handle = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, api).await {
            warn!(error = %e, "API server error");
        }
    });

    let mut ticker = tokio::time::interval(Duration::from_secs(30));
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let guard = node.lock().await;
                info!(
                    block = guard.chain.block_number(),
                    executors = guard.router.registry().iter().count(),
                    events = guard.router.events().len(),
                    paused = guard.router.is_paused(),
                    "router heartbeat"
                );
            }
            res = tokio::signal::ctrl_c() => {
                if let Err(err) = res {
                    warn!(error = %err, "ctrl_c listener error");
                }
                info!("Shutdown signal received, exiting");
                break;
            }
        }
    }
    api_handle.abort();
    Ok(())
}

fn init_tracing() -> Result<()> {
    let env_filter =
        std::env::var("RUST_LOG").unwrap_or_else(|_| "info,hyper=warn,tower_http=info".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(env_filter))
        .with_target(false)
        .try_init()
        .map_err(|err| anyhow!("tracing subscriber init: {err}"))
}
