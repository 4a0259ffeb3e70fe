use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::time::Instant;
use tracing::{debug, info};

use crate::error::RpcError;
use crate::rpc::{ChainRpc, TransactionDetail};

/// Cached transaction detail with its insertion instant
#[derive(Debug, Clone)]
pub struct CachedDetail {
    pub detail: Arc<TransactionDetail>,
    pub inserted_at: Instant,
}

struct CacheInner {
    entries: HashMap<String, CachedDetail>,
    /// Insertion order; may hold stale keys until the next purge
    order: VecDeque<(String, Instant)>,
}

/// Signature → transaction detail memo with a fixed TTL from insertion and a
/// capacity bound that evicts the oldest insertion first.
pub struct DetailCache {
    rpc: Arc<dyn ChainRpc>,
    ttl: Duration,
    capacity: usize,
    inner: Mutex<CacheInner>,
}

impl DetailCache {
    pub fn new(rpc: Arc<dyn ChainRpc>, ttl: Duration, capacity: usize) -> Self {
        Self {
            rpc,
            ttl,
            capacity: capacity.max(1),
            inner: Mutex::new(CacheInner {
                entries: HashMap::new(),
                order: VecDeque::new(),
            }),
        }
    }

    /// Cached detail if present and not expired
    pub fn lookup(&self, signature: &str) -> Option<Arc<TransactionDetail>> {
        let mut inner = self.inner.lock();

        let expired = match inner.entries.get(signature) {
            Some(entry) if entry.inserted_at.elapsed() < self.ttl => {
                debug!("✓ Detail cache hit: {}", signature);
                return Some(entry.detail.clone());
            }
            Some(_) => true,
            None => false,
        };

        if expired {
            debug!("⚠ Detail cache expired: {}", signature);
            inner.entries.remove(signature);
        }

        None
    }

    /// Always calls RPC and stores the result
    pub async fn fetch(&self, signature: &str) -> Result<Arc<TransactionDetail>, RpcError> {
        let detail = Arc::new(self.rpc.get_transaction(signature).await?);
        self.insert(signature, detail.clone());
        Ok(detail)
    }

    /// Cached detail, or a fresh fetch on miss
    pub async fn get(&self, signature: &str) -> Result<Arc<TransactionDetail>, RpcError> {
        match self.lookup(signature) {
            Some(detail) => Ok(detail),
            None => self.fetch(signature).await,
        }
    }

    fn insert(&self, signature: &str, detail: Arc<TransactionDetail>) {
        let now = Instant::now();
        let mut inner = self.inner.lock();

        inner.entries.insert(
            signature.to_string(),
            CachedDetail {
                detail,
                inserted_at: now,
            },
        );
        inner.order.push_back((signature.to_string(), now));

        while inner.entries.len() > self.capacity {
            let Some((key, at)) = inner.order.pop_front() else {
                break;
            };
            let current = inner.entries.get(&key).map(|e| e.inserted_at);
            if current == Some(at) {
                inner.entries.remove(&key);
                debug!("💾 Evicted oldest cached detail: {}", key);
            }
        }
    }

    /// Cleanup expired entries, returns how many were dropped
    pub fn purge_expired(&self) -> usize {
        let ttl = self.ttl;
        let mut inner = self.inner.lock();

        let before = inner.entries.len();
        inner.entries.retain(|_, entry| entry.inserted_at.elapsed() < ttl);
        let removed = before - inner.entries.len();

        let CacheInner { entries, order } = &mut *inner;
        order.retain(|(key, at)| entries.get(key).map_or(false, |e| e.inserted_at == *at));

        if removed > 0 {
            info!("🧹 Cleaned up {} expired transaction details", removed);
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
