use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::bot::{BotRunner, CommandHandler, TelegramApi};
use crate::config::Config;
use crate::error::AppResult;
use crate::rpc::{ChainRpc, SolanaRpcClient};
use crate::tracker::{DetailCache, TaskManager, WalletRegistry};

/// Everything the process shares between the bot loop and the trackers
pub struct AppState {
    pub cache: Arc<DetailCache>,
    pub manager: Arc<TaskManager>,
    pub telegram: Arc<TelegramApi>,
    pub updates_timeout: Duration,
}

impl AppState {
    pub fn bot_runner(&self) -> BotRunner {
        BotRunner::new(
            self.telegram.clone(),
            CommandHandler::new(self.manager.clone()),
            self.updates_timeout,
        )
    }
}

pub async fn initialize_app_state(
    config: &Config,
    shutdown: CancellationToken,
) -> AppResult<AppState> {
    info!("Initializing application components ...");

    let solana = SolanaRpcClient::new(&config.solana_rpc_url, config.rpc_timeout())?;
    info!("✅ Solana RPC client initialized for {}", solana.rpc_url());
    let rpc: Arc<dyn ChainRpc> = Arc::new(solana);

    let updates_timeout = Duration::from_secs(config.updates_timeout_secs);
    let telegram = Arc::new(TelegramApi::new(
        &config.telegram_api_url,
        &config.telegram_bot_token,
        updates_timeout,
    )?);
    info!("✅ Telegram client initialized");

    let registry = Arc::new(WalletRegistry::new());

    let cache = Arc::new(DetailCache::new(
        rpc.clone(),
        config.cache_ttl(),
        config.cache_capacity,
    ));
    info!(
        "✅ Transaction cache initialized (ttl {}s, capacity {})",
        config.cache_ttl_secs, config.cache_capacity
    );

    let settings = config.poller_settings();
    info!(
        "⏱️  Polling every {:?}, {} signatures per window",
        settings.interval, settings.signature_limit
    );

    let manager = Arc::new(TaskManager::new(
        registry,
        cache.clone(),
        rpc,
        telegram.clone(),
        settings,
    ));

    spawn_cache_purge(cache.clone(), config.cache_purge_interval(), shutdown);
    info!("✅ Cache purge task started");

    Ok(AppState {
        cache,
        manager,
        telegram,
        updates_timeout,
    })
}

/// Periodically drops expired cache entries until shutdown
fn spawn_cache_purge(
    cache: Arc<DetailCache>,
    every: Duration,
    shutdown: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = tokio::time::sleep(every) => {}
            }

            if cache.purge_expired() == 0 && !cache.is_empty() {
                debug!("Cache purge found nothing expired ({} live)", cache.len());
            }
        }
    })
}
