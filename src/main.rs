mod bootstrap;
mod bot;
mod config;
mod error;
mod notify;
mod rpc;
mod tracker;

#[cfg(test)]
mod testing;

use anyhow::Context;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// Initialize logging and tracing
fn init_tracing() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,wallet_tracker=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    init_tracing();

    info!("🚀 Starting Solana wallet tracker bot");

    let config = config::Config::from_env().context("failed to load configuration")?;

    let shutdown = CancellationToken::new();
    let state = bootstrap::initialize_app_state(&config, shutdown.clone())
        .await
        .context("failed to initialize application")?;

    let signal_token = shutdown.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("🛑 Shutdown signal received");
                signal_token.cancel();
            }
            Err(e) => error!("❌ Failed to listen for shutdown signal: {}", e),
        }
    });

    state.bot_runner().run(shutdown.clone()).await;

    state.manager.shutdown().await;
    info!(
        "👋 Wallet tracker stopped ({} cached transactions dropped)",
        state.cache.len()
    );

    Ok(())
}
