use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use chrono::{FixedOffset, Offset, Utc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::error::RpcError;
use crate::notify::formatter::render_transaction;
use crate::notify::{NotificationSink, ParseMode};
use crate::rpc::ChainRpc;
use crate::tracker::cache::DetailCache;
use crate::tracker::models::{ChatId, Wallet};
use crate::tracker::registry::{BaselineUpdate, WalletRegistry};

#[derive(Debug, Clone)]
pub struct PollerSettings {
    /// Wait between two ticks
    pub interval: Duration,
    /// Size of the signature window fetched per tick
    pub signature_limit: usize,
    pub display_offset: FixedOffset,
}

impl Default for PollerSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5),
            signature_limit: 10,
            display_offset: Utc.fix(),
        }
    }
}

/// Signatures in `fetched` that are not in `baseline`, in fetched order.
///
/// The baseline is a sliding window: if more than a window's worth of
/// transactions land between two ticks, the overflow is never seen.
pub fn new_signatures(baseline: &[String], fetched: &[String]) -> Vec<String> {
    let seen: HashSet<&str> = baseline.iter().map(String::as_str).collect();
    fetched
        .iter()
        .filter(|sig| !seen.contains(sig.as_str()))
        .cloned()
        .collect()
}

/// Background loop watching one wallet on behalf of one chat
pub struct Poller {
    chat_id: ChatId,
    wallet: Wallet,
    registry: Arc<WalletRegistry>,
    cache: Arc<DetailCache>,
    rpc: Arc<dyn ChainRpc>,
    sink: Arc<dyn NotificationSink>,
    settings: PollerSettings,
    token: CancellationToken,
}

impl Poller {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        chat_id: ChatId,
        wallet: Wallet,
        registry: Arc<WalletRegistry>,
        cache: Arc<DetailCache>,
        rpc: Arc<dyn ChainRpc>,
        sink: Arc<dyn NotificationSink>,
        settings: PollerSettings,
        token: CancellationToken,
    ) -> Self {
        Self {
            chat_id,
            wallet,
            registry,
            cache,
            rpc,
            sink,
            settings,
            token,
        }
    }

    /// Runs until the token is cancelled. Cancellation is observed at the top
    /// of every tick, after each network call and during the sleep.
    pub async fn run(self) {
        info!(
            "👀 Chat {} tracking wallet {} ({})",
            self.chat_id, self.wallet.name, self.wallet.address
        );

        loop {
            if self.token.is_cancelled() {
                break;
            }

            self.tick().await;

            tokio::select! {
                _ = self.token.cancelled() => break,
                _ = tokio::time::sleep(self.settings.interval) => {}
            }
        }

        info!(
            "🛑 Tracking task for wallet {} in chat {} was cancelled",
            self.wallet.address, self.chat_id
        );
    }

    /// One poll cycle. Returns the number of notifications delivered.
    pub async fn tick(&self) -> usize {
        let address = &self.wallet.address;

        let fetched = match self
            .rpc
            .list_signatures(address, self.settings.signature_limit)
            .await
        {
            Ok(signatures) => signatures,
            Err(e) => {
                if !self.token.is_cancelled() {
                    warn!("⚠️ Failed to list signatures for {}: {}", address, e);
                    self.report(&e).await;
                }
                return 0;
            }
        };

        if self.token.is_cancelled() {
            return 0;
        }

        debug!(
            "Refreshed {} signatures for wallet {} ({})",
            fetched.len(),
            self.wallet.name,
            address
        );

        let fresh = match self.registry.advance_baseline(self.chat_id, address, fetched) {
            BaselineUpdate::Advanced(fresh) => fresh,
            BaselineUpdate::Adopted => {
                debug!("Adopted initial baseline for {}", address);
                return 0;
            }
            BaselineUpdate::Empty | BaselineUpdate::Untracked => return 0,
        };

        let mut delivered = 0;
        for signature in fresh {
            if self.token.is_cancelled() {
                break;
            }

            let detail = match self.cache.get(&signature).await {
                Ok(detail) => detail,
                Err(e) => {
                    if self.token.is_cancelled() {
                        break;
                    }
                    warn!("⚠️ Failed to fetch transaction {}: {}", signature, e);
                    self.report(&e).await;
                    continue;
                }
            };

            if self.token.is_cancelled() {
                break;
            }

            let Some(message) = render_transaction(
                &self.wallet.name,
                &signature,
                &detail,
                Utc::now(),
                &self.settings.display_offset,
            ) else {
                debug!("Skipping {}: no supported instruction", signature);
                continue;
            };

            match self.sink.send(self.chat_id, &message, ParseMode::MarkdownV2).await {
                Ok(()) => {
                    delivered += 1;
                    info!("📨 Notified chat {} of {}", self.chat_id, signature);
                }
                Err(e) => error!("❌ Failed to notify chat {}: {}", self.chat_id, e),
            }
        }

        delivered
    }

    async fn report(&self, err: &RpcError) {
        if let Err(e) = self
            .sink
            .send(self.chat_id, &err.diagnostic(), ParseMode::Plain)
            .await
        {
            error!("❌ Failed to send diagnostic to chat {}: {}", self.chat_id, e);
        }
    }
}
