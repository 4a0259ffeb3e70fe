use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tracing::{debug, info};

use crate::error::RegistryError;
use crate::tracker::models::{validate_address, ChatId, Wallet};
use crate::tracker::poller::new_signatures;

/// Everything the bot remembers about one chat
#[derive(Debug, Default)]
pub struct ChatState {
    wallets: Vec<Wallet>,
    /// Baseline window per wallet address, newest first
    last_seen: HashMap<String, Vec<String>>,
    awaiting_wallet_input: bool,
}

/// Outcome of feeding one fetched window into a wallet's baseline
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BaselineUpdate {
    /// No baseline existed; the fetched window became the baseline
    Adopted,
    /// The chain returned nothing; state left untouched
    Empty,
    /// The wallet is no longer tracked by this chat
    Untracked,
    /// Baseline replaced; carries the unseen signatures oldest first
    Advanced(Vec<String>),
}

/// In-memory per-chat wallet store. Each chat has its own lock; no lock is
/// ever held across an `.await`.
pub struct WalletRegistry {
    chats: RwLock<HashMap<ChatId, Arc<Mutex<ChatState>>>>,
}

impl WalletRegistry {
    pub fn new() -> Self {
        Self {
            chats: RwLock::new(HashMap::new()),
        }
    }

    fn chat(&self, chat_id: ChatId) -> Arc<Mutex<ChatState>> {
        if let Some(state) = self.chats.read().get(&chat_id) {
            return state.clone();
        }

        self.chats
            .write()
            .entry(chat_id)
            .or_insert_with(|| {
                debug!("Created state for chat {}", chat_id);
                Arc::new(Mutex::new(ChatState::default()))
            })
            .clone()
    }

    fn existing(&self, chat_id: ChatId) -> Option<Arc<Mutex<ChatState>>> {
        self.chats.read().get(&chat_id).cloned()
    }

    pub fn add_wallet(
        &self,
        chat_id: ChatId,
        address: &str,
        name: &str,
    ) -> Result<Wallet, RegistryError> {
        validate_address(address)?;

        let chat = self.chat(chat_id);
        let mut state = chat.lock();

        if state.wallets.iter().any(|w| w.address == address) {
            return Err(RegistryError::DuplicateAddress(address.to_string()));
        }

        let wallet = Wallet::new(address, name);
        state.wallets.push(wallet.clone());
        info!("➕ Chat {} added wallet {} ({})", chat_id, name, address);

        Ok(wallet)
    }

    /// Exclusive selection: every other wallet of the chat is deselected
    pub fn select_wallet(&self, chat_id: ChatId, address: &str) -> Result<Wallet, RegistryError> {
        let chat = self
            .existing(chat_id)
            .ok_or_else(|| RegistryError::NotFound(address.to_string()))?;
        let mut state = chat.lock();

        if !state.wallets.iter().any(|w| w.address == address) {
            return Err(RegistryError::NotFound(address.to_string()));
        }

        let mut selected = None;
        for wallet in state.wallets.iter_mut() {
            wallet.selected = wallet.address == address;
            if wallet.selected {
                selected = Some(wallet.clone());
            }
        }

        selected.ok_or_else(|| RegistryError::NotFound(address.to_string()))
    }

    /// Removes the wallet and its baseline window. Cancelling a poller bound
    /// to it is the caller's job, see `TaskManager::remove_wallet`.
    pub fn remove_wallet(&self, chat_id: ChatId, address: &str) -> Result<Wallet, RegistryError> {
        let chat = self
            .existing(chat_id)
            .ok_or_else(|| RegistryError::NotFound(address.to_string()))?;
        let mut state = chat.lock();

        let index = state
            .wallets
            .iter()
            .position(|w| w.address == address)
            .ok_or_else(|| RegistryError::NotFound(address.to_string()))?;

        let removed = state.wallets.remove(index);
        state.last_seen.remove(address);
        info!("➖ Chat {} removed wallet {} ({})", chat_id, removed.name, address);

        Ok(removed)
    }

    pub fn list_wallets(&self, chat_id: ChatId) -> Vec<Wallet> {
        let Some(chat) = self.existing(chat_id) else {
            return Vec::new();
        };
        let state = chat.lock();
        state.wallets.clone()
    }

    pub fn current_selection(&self, chat_id: ChatId) -> Option<Wallet> {
        let chat = self.existing(chat_id)?;
        let state = chat.lock();
        state.wallets.iter().find(|w| w.selected).cloned()
    }

    pub fn set_awaiting_input(&self, chat_id: ChatId, awaiting: bool) {
        self.chat(chat_id).lock().awaiting_wallet_input = awaiting;
    }

    /// Reads and clears the "waiting for wallet input" flag
    pub fn take_awaiting_input(&self, chat_id: ChatId) -> bool {
        let Some(chat) = self.existing(chat_id) else {
            return false;
        };
        let mut state = chat.lock();
        std::mem::take(&mut state.awaiting_wallet_input)
    }

    #[cfg(test)]
    pub fn baseline(&self, chat_id: ChatId, address: &str) -> Option<Vec<String>> {
        let chat = self.existing(chat_id)?;
        let state = chat.lock();
        state.last_seen.get(address).cloned()
    }

    /// Diffs `fetched` against the stored baseline and replaces the baseline
    /// with `fetched`, in one critical section.
    pub fn advance_baseline(
        &self,
        chat_id: ChatId,
        address: &str,
        fetched: Vec<String>,
    ) -> BaselineUpdate {
        if fetched.is_empty() {
            return BaselineUpdate::Empty;
        }

        let Some(chat) = self.existing(chat_id) else {
            return BaselineUpdate::Untracked;
        };
        let mut state = chat.lock();

        if !state.wallets.iter().any(|w| w.address == address) {
            return BaselineUpdate::Untracked;
        }

        let fresh = match state.last_seen.get(address) {
            Some(baseline) if !baseline.is_empty() => {
                let mut fresh = new_signatures(baseline, &fetched);
                fresh.reverse();
                Some(fresh)
            }
            _ => None,
        };

        state.last_seen.insert(address.to_string(), fetched);

        match fresh {
            Some(fresh) => BaselineUpdate::Advanced(fresh),
            None => BaselineUpdate::Adopted,
        }
    }
}

impl Default for WalletRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHAT: ChatId = 42;

    fn addr(c: char) -> String {
        c.to_string().repeat(44)
    }

    fn sigs(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_add_then_list() {
        let registry = WalletRegistry::new();
        registry.add_wallet(CHAT, &addr('A'), "name").unwrap();

        let wallets = registry.list_wallets(CHAT);
        assert_eq!(wallets, vec![Wallet::new(addr('A'), "name")]);
        assert!(!wallets[0].selected);
    }

    #[test]
    fn test_invalid_address_does_not_mutate() {
        let registry = WalletRegistry::new();
        let result = registry.add_wallet(CHAT, "short", "name");

        assert_eq!(result, Err(RegistryError::InvalidAddress("short".to_string())));
        assert!(registry.list_wallets(CHAT).is_empty());
    }

    #[test]
    fn test_duplicate_address_rejected() {
        let registry = WalletRegistry::new();
        registry.add_wallet(CHAT, &addr('A'), "first").unwrap();

        let result = registry.add_wallet(CHAT, &addr('A'), "second");
        assert_eq!(result, Err(RegistryError::DuplicateAddress(addr('A'))));
        assert_eq!(registry.list_wallets(CHAT).len(), 1);

        // Same address in another chat is independent
        assert!(registry.add_wallet(CHAT + 1, &addr('A'), "other").is_ok());
    }

    #[test]
    fn test_selection_is_exclusive() {
        let registry = WalletRegistry::new();
        for c in ['A', 'B', 'C'] {
            registry.add_wallet(CHAT, &addr(c), &c.to_string()).unwrap();
        }

        for c in ['B', 'A', 'C', 'C', 'B'] {
            registry.select_wallet(CHAT, &addr(c)).unwrap();
            let selected: Vec<_> = registry
                .list_wallets(CHAT)
                .into_iter()
                .filter(|w| w.selected)
                .collect();
            assert_eq!(selected.len(), 1);
            assert_eq!(selected[0].address, addr(c));
        }

        assert_eq!(registry.current_selection(CHAT).map(|w| w.address), Some(addr('B')));
    }

    #[test]
    fn test_select_unknown_wallet() {
        let registry = WalletRegistry::new();
        registry.add_wallet(CHAT, &addr('A'), "a").unwrap();
        registry.select_wallet(CHAT, &addr('A')).unwrap();

        assert_eq!(
            registry.select_wallet(CHAT, &addr('Z')),
            Err(RegistryError::NotFound(addr('Z')))
        );
        // Failed selection leaves the previous one in place
        assert_eq!(registry.current_selection(CHAT).map(|w| w.address), Some(addr('A')));
        assert!(registry.select_wallet(CHAT + 1, &addr('A')).is_err());
    }

    #[test]
    fn test_remove_wallet_drops_baseline() {
        let registry = WalletRegistry::new();
        registry.add_wallet(CHAT, &addr('A'), "a").unwrap();
        registry.add_wallet(CHAT, &addr('B'), "b").unwrap();
        registry.advance_baseline(CHAT, &addr('A'), sigs(&["s1"]));

        let removed = registry.remove_wallet(CHAT, &addr('A')).unwrap();
        assert_eq!(removed.name, "a");
        assert_eq!(registry.list_wallets(CHAT).len(), 1);
        assert!(registry.baseline(CHAT, &addr('A')).is_none());

        assert_eq!(
            registry.remove_wallet(CHAT, &addr('A')),
            Err(RegistryError::NotFound(addr('A')))
        );
    }

    #[test]
    fn test_awaiting_input_flag_is_consumed() {
        let registry = WalletRegistry::new();
        assert!(!registry.take_awaiting_input(CHAT));

        registry.set_awaiting_input(CHAT, true);
        assert!(registry.take_awaiting_input(CHAT));
        assert!(!registry.take_awaiting_input(CHAT));
    }

    #[test]
    fn test_first_window_is_adopted() {
        let registry = WalletRegistry::new();
        registry.add_wallet(CHAT, &addr('A'), "a").unwrap();

        let update = registry.advance_baseline(CHAT, &addr('A'), sigs(&["s3", "s2", "s1"]));
        assert_eq!(update, BaselineUpdate::Adopted);
        assert_eq!(registry.baseline(CHAT, &addr('A')), Some(sigs(&["s3", "s2", "s1"])));
    }

    #[test]
    fn test_baseline_advances_to_latest_window() {
        let registry = WalletRegistry::new();
        registry.add_wallet(CHAT, &addr('A'), "a").unwrap();
        registry.advance_baseline(CHAT, &addr('A'), sigs(&["s1", "s2", "s3"]));

        let update = registry.advance_baseline(CHAT, &addr('A'), sigs(&["s0", "s1", "s2"]));
        assert_eq!(update, BaselineUpdate::Advanced(sigs(&["s0"])));
        assert_eq!(registry.baseline(CHAT, &addr('A')), Some(sigs(&["s0", "s1", "s2"])));
    }

    #[test]
    fn test_new_signatures_come_out_oldest_first() {
        let registry = WalletRegistry::new();
        registry.add_wallet(CHAT, &addr('A'), "a").unwrap();
        registry.advance_baseline(CHAT, &addr('A'), sigs(&["s1", "s2"]));

        let update = registry.advance_baseline(CHAT, &addr('A'), sigs(&["n3", "n2", "n1", "s1"]));
        assert_eq!(update, BaselineUpdate::Advanced(sigs(&["n1", "n2", "n3"])));
    }

    #[test]
    fn test_empty_fetch_keeps_baseline() {
        let registry = WalletRegistry::new();
        registry.add_wallet(CHAT, &addr('A'), "a").unwrap();

        assert_eq!(registry.advance_baseline(CHAT, &addr('A'), vec![]), BaselineUpdate::Empty);
        assert!(registry.baseline(CHAT, &addr('A')).is_none());

        registry.advance_baseline(CHAT, &addr('A'), sigs(&["s1"]));
        assert_eq!(registry.advance_baseline(CHAT, &addr('A'), vec![]), BaselineUpdate::Empty);
        assert_eq!(registry.baseline(CHAT, &addr('A')), Some(sigs(&["s1"])));
    }

    #[test]
    fn test_untracked_wallet_has_no_baseline() {
        let registry = WalletRegistry::new();
        assert_eq!(
            registry.advance_baseline(CHAT, &addr('A'), sigs(&["s1"])),
            BaselineUpdate::Untracked
        );
    }
}
