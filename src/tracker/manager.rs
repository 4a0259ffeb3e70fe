use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex as AsyncMutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::error::{RegistryError, TrackingError};
use crate::notify::NotificationSink;
use crate::rpc::ChainRpc;
use crate::tracker::cache::DetailCache;
use crate::tracker::models::{ChatId, Wallet};
use crate::tracker::poller::{Poller, PollerSettings};
use crate::tracker::registry::WalletRegistry;

/// A running poller and the means to stop it
pub struct PollerHandle {
    address: String,
    token: CancellationToken,
    join: JoinHandle<()>,
}

impl PollerHandle {
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Signals the poller and returns at once. An RPC call already in flight
    /// is drained by a background task; the poller re-checks its token after
    /// every network call and drops the result.
    fn cancel(self) {
        self.token.cancel();
        tokio::spawn(drain(self.address, self.join));
    }

    /// Signals the poller and waits for it to wind down
    async fn stop(self) {
        self.token.cancel();
        drain(self.address, self.join).await;
    }
}

async fn drain(address: String, join: JoinHandle<()>) {
    if let Err(e) = join.await {
        error!("❌ Poller for {} ended abnormally: {:?}", address, e);
    }
}

type Slot = Arc<AsyncMutex<Option<PollerHandle>>>;

/// Owns at most one active poller per chat. The per-chat slot lock is held
/// for the whole cancel-then-start sequence. A cancelled poller may still be
/// finishing an RPC call, but it sends nothing once it sees the cancellation.
pub struct TaskManager {
    registry: Arc<WalletRegistry>,
    cache: Arc<DetailCache>,
    rpc: Arc<dyn ChainRpc>,
    sink: Arc<dyn NotificationSink>,
    settings: PollerSettings,
    slots: parking_lot::Mutex<HashMap<ChatId, Slot>>,
}

impl TaskManager {
    pub fn new(
        registry: Arc<WalletRegistry>,
        cache: Arc<DetailCache>,
        rpc: Arc<dyn ChainRpc>,
        sink: Arc<dyn NotificationSink>,
        settings: PollerSettings,
    ) -> Self {
        Self {
            registry,
            cache,
            rpc,
            sink,
            settings,
            slots: parking_lot::Mutex::new(HashMap::new()),
        }
    }

    pub fn registry(&self) -> &Arc<WalletRegistry> {
        &self.registry
    }

    fn slot(&self, chat_id: ChatId) -> Slot {
        self.slots.lock().entry(chat_id).or_default().clone()
    }

    fn existing_slot(&self, chat_id: ChatId) -> Option<Slot> {
        self.slots.lock().get(&chat_id).cloned()
    }

    /// Starts polling the chat's selected wallet, replacing any running poller
    pub async fn start_tracking(&self, chat_id: ChatId) -> Result<Wallet, TrackingError> {
        let slot = self.slot(chat_id);
        let mut active = slot.lock().await;

        if self.registry.list_wallets(chat_id).is_empty() {
            return Err(TrackingError::NoWalletsTracked);
        }
        let wallet = self
            .registry
            .current_selection(chat_id)
            .ok_or(TrackingError::NoWalletSelected)?;

        if let Some(previous) = active.take() {
            info!("🔄 Chat {} replacing tracker for {}", chat_id, previous.address());
            previous.cancel();
        }

        let token = CancellationToken::new();
        let poller = Poller::new(
            chat_id,
            wallet.clone(),
            self.registry.clone(),
            self.cache.clone(),
            self.rpc.clone(),
            self.sink.clone(),
            self.settings.clone(),
            token.clone(),
        );
        let join = tokio::spawn(poller.run());

        *active = Some(PollerHandle {
            address: wallet.address.clone(),
            token,
            join,
        });
        info!("✅ Chat {} started tracking {} ({})", chat_id, wallet.name, wallet.address);

        Ok(wallet)
    }

    /// Cancels the chat's poller without waiting for it. Returns whether one was running.
    pub async fn stop_tracking(&self, chat_id: ChatId) -> bool {
        let Some(slot) = self.existing_slot(chat_id) else {
            return false;
        };
        let mut active = slot.lock().await;

        match active.take() {
            Some(handle) => {
                handle.cancel();
                info!("⏹️ Chat {} stopped tracking", chat_id);
                true
            }
            None => false,
        }
    }

    pub async fn is_tracking(&self, chat_id: ChatId) -> bool {
        self.tracked_address(chat_id).await.is_some()
    }

    /// Address the chat's poller is bound to, if any
    pub async fn tracked_address(&self, chat_id: ChatId) -> Option<String> {
        let slot = self.existing_slot(chat_id)?;
        let active = slot.lock().await;
        active.as_ref().map(|h| h.address.clone())
    }

    /// Removes a wallet and stops the chat's poller if it watches that wallet
    pub async fn remove_wallet(&self, chat_id: ChatId, address: &str) -> Result<Wallet, RegistryError> {
        let slot = self.slot(chat_id);
        let mut active = slot.lock().await;

        let removed = self.registry.remove_wallet(chat_id, address)?;

        if active.as_ref().is_some_and(|h| h.address == address) {
            if let Some(handle) = active.take() {
                handle.cancel();
                info!("⏹️ Chat {} stopped tracking removed wallet {}", chat_id, address);
            }
        }

        Ok(removed)
    }

    /// Stops every poller, used on shutdown
    pub async fn shutdown(&self) {
        let slots: Vec<Slot> = self.slots.lock().values().cloned().collect();

        let stops = slots.into_iter().map(|slot| async move {
            let handle = slot.lock().await.take();
            if let Some(handle) = handle {
                handle.stop().await;
            }
        });
        futures::future::join_all(stops).await;

        info!("🛑 All trackers stopped");
    }
}
