//! In-memory fakes for the RPC and notification seams, shared by unit tests.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::json;

use crate::error::{AppResult, RpcError};
use crate::notify::{NotificationSink, ParseMode};
use crate::rpc::{ChainRpc, TransactionDetail};
use crate::tracker::ChatId;

pub fn transfer_detail(
    source: &str,
    destination: &str,
    lamports: u64,
    block_time: Option<i64>,
) -> TransactionDetail {
    serde_json::from_value(json!({
        "slot": 1,
        "blockTime": block_time,
        "transaction": {
            "message": {
                "instructions": [{
                    "program": "system",
                    "programId": "11111111111111111111111111111111",
                    "parsed": {
                        "type": "transfer",
                        "info": {
                            "source": source,
                            "destination": destination,
                            "lamports": lamports
                        }
                    }
                }]
            }
        }
    }))
    .expect("valid transaction fixture")
}

/// Serves a settable signature window and a fixed set of details
pub struct ScriptedRpc {
    window: Mutex<Vec<String>>,
    failures: Mutex<VecDeque<u16>>,
    delay: Mutex<Duration>,
    details: Mutex<HashMap<String, TransactionDetail>>,
    signature_calls: AtomicUsize,
    transaction_calls: AtomicUsize,
}

impl ScriptedRpc {
    pub fn new() -> Self {
        Self {
            window: Mutex::new(Vec::new()),
            failures: Mutex::new(VecDeque::new()),
            delay: Mutex::new(Duration::ZERO),
            details: Mutex::new(HashMap::new()),
            signature_calls: AtomicUsize::new(0),
            transaction_calls: AtomicUsize::new(0),
        }
    }

    /// Newest first, as the chain returns them
    pub fn set_window(&self, signatures: &[&str]) {
        *self.window.lock() = signatures.iter().map(|s| s.to_string()).collect();
    }

    /// The next `list_signatures` call fails with this HTTP status
    pub fn fail_next(&self, status: u16) {
        self.failures.lock().push_back(status);
    }

    /// Every `list_signatures` call takes this long to answer
    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock() = delay;
    }

    pub fn add_detail(&self, signature: &str, detail: TransactionDetail) {
        self.details.lock().insert(signature.to_string(), detail);
    }

    pub fn signature_calls(&self) -> usize {
        self.signature_calls.load(Ordering::SeqCst)
    }

    pub fn transaction_calls(&self) -> usize {
        self.transaction_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChainRpc for ScriptedRpc {
    async fn list_signatures(&self, _address: &str, limit: usize) -> Result<Vec<String>, RpcError> {
        self.signature_calls.fetch_add(1, Ordering::SeqCst);
        let delay = *self.delay.lock();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        if let Some(status) = self.failures.lock().pop_front() {
            return Err(RpcError::Http { status });
        }
        Ok(self.window.lock().iter().take(limit).cloned().collect())
    }

    async fn get_transaction(&self, signature: &str) -> Result<TransactionDetail, RpcError> {
        self.transaction_calls.fetch_add(1, Ordering::SeqCst);
        self.details
            .lock()
            .get(signature)
            .cloned()
            .ok_or_else(|| RpcError::NullResult {
                method: "getTransaction".to_string(),
            })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    pub chat_id: ChatId,
    pub text: String,
    pub mode: ParseMode,
}

/// Records every message instead of delivering it
#[derive(Default)]
pub struct RecordingSink {
    sent: Mutex<Vec<SentMessage>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<SentMessage> {
        self.sent.lock().clone()
    }

    pub fn count(&self) -> usize {
        self.sent.lock().len()
    }
}

#[async_trait]
impl NotificationSink for RecordingSink {
    async fn send(&self, chat_id: ChatId, text: &str, mode: ParseMode) -> AppResult<()> {
        self.sent.lock().push(SentMessage {
            chat_id,
            text: text.to_string(),
            mode,
        });
        Ok(())
    }
}
