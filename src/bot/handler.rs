use std::sync::Arc;

use tracing::debug;

use crate::bot::commands::{parse_wallet_input, BotEvent};
use crate::error::{RegistryError, TrackingError};
use crate::notify::formatter::escape_markdown;
use crate::notify::ParseMode;
use crate::tracker::{ChatId, TaskManager, WalletRegistry};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Button {
    pub label: String,
    pub event: BotEvent,
}

impl Button {
    fn new(label: impl Into<String>, event: BotEvent) -> Self {
        Self {
            label: label.into(),
            event,
        }
    }
}

/// A message the front end should send back to the chat
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub text: String,
    pub mode: ParseMode,
    pub buttons: Vec<Vec<Button>>,
}

impl Reply {
    fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            mode: ParseMode::Plain,
            buttons: Vec::new(),
        }
    }

    fn markdown(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            mode: ParseMode::MarkdownV2,
            buttons: Vec::new(),
        }
    }

    fn with_buttons(mut self, buttons: Vec<Vec<Button>>) -> Self {
        self.buttons = buttons;
        self
    }
}

const MENU_PROMPT: &str = "Please select an option:";
const WALLETS_PROMPT: &str = "Tracked Wallets (click to select):";
const ADD_PROMPT: &str = "Please send the wallet address and a name, separated by a space:";
const ADD_FIRST: &str = "Please add a wallet first.";
const SELECT_FIRST: &str = "Please select a wallet to track from the 'View Tracked Wallets' menu.";
const NOT_AWAITING: &str = "Please press 'Add Wallet to Track' before sending a wallet address.";
const MALFORMED_INPUT: &str =
    "Please send the wallet address followed by a name, separated by a space.";
const INVALID_ADDRESS: &str = "Invalid wallet address. Please try again.";
const NOT_FOUND: &str = "Wallet not found in your tracking list.";
const STOPPED: &str = "Stopped tracking your wallets.";
const UNKNOWN: &str = "Unknown command. Use /menu to see the options.";

/// Maps events onto registry and task-manager operations and renders replies
pub struct CommandHandler {
    manager: Arc<TaskManager>,
}

impl CommandHandler {
    pub fn new(manager: Arc<TaskManager>) -> Self {
        Self { manager }
    }

    fn registry(&self) -> &WalletRegistry {
        self.manager.registry()
    }

    pub async fn handle(&self, chat_id: ChatId, event: BotEvent) -> Vec<Reply> {
        debug!("Chat {} event {:?}", chat_id, event);

        match event {
            BotEvent::ShowMenu => {
                self.registry().set_awaiting_input(chat_id, false);
                vec![self.main_menu(chat_id).await]
            }
            BotEvent::AwaitWalletInput => {
                self.registry().set_awaiting_input(chat_id, true);
                vec![Reply::plain(ADD_PROMPT)
                    .with_buttons(vec![vec![Button::new("Cancel", BotEvent::ShowMenu)]])]
            }
            BotEvent::PlainText(text) => {
                if self.registry().take_awaiting_input(chat_id) {
                    self.add_wallet(chat_id, &text)
                } else {
                    vec![Reply::plain(NOT_AWAITING)]
                }
            }
            BotEvent::AddWalletRequested(raw) => {
                self.registry().set_awaiting_input(chat_id, false);
                self.add_wallet(chat_id, &raw)
            }
            BotEvent::ListWallets => vec![self.wallet_list(chat_id)],
            BotEvent::SelectWallet(address) => {
                match self.registry().select_wallet(chat_id, &address) {
                    Ok(_) => vec![self.wallet_list(chat_id)],
                    Err(_) => vec![Reply::plain(NOT_FOUND), self.wallet_list(chat_id)],
                }
            }
            BotEvent::RemoveWallet(address) => {
                match self.manager.remove_wallet(chat_id, &address).await {
                    Ok(wallet) => vec![
                        Reply::markdown(format!(
                            "Wallet `{}` removed from tracking list\\.",
                            escape_markdown(&wallet.name)
                        )),
                        self.wallet_list(chat_id),
                    ],
                    Err(_) => vec![Reply::plain(NOT_FOUND), self.wallet_list(chat_id)],
                }
            }
            BotEvent::StartTracking => self.start_tracking(chat_id).await,
            BotEvent::StopTracking => {
                self.manager.stop_tracking(chat_id).await;
                vec![Reply::plain(STOPPED), self.main_menu(chat_id).await]
            }
            BotEvent::Unknown(_) => vec![Reply::plain(UNKNOWN)],
        }
    }

    fn add_wallet(&self, chat_id: ChatId, raw: &str) -> Vec<Reply> {
        let Some((address, name)) = parse_wallet_input(raw) else {
            return vec![Reply::plain(MALFORMED_INPUT)];
        };

        match self.registry().add_wallet(chat_id, &address, &name) {
            Ok(_) => vec![
                Reply::markdown(format!(
                    "Wallet `{}` added to tracking list\\.",
                    escape_markdown(&name)
                )),
                self.wallet_list(chat_id),
            ],
            Err(RegistryError::DuplicateAddress(_)) => vec![Reply::markdown(format!(
                "Wallet `{}` is already in your tracking list\\.",
                escape_markdown(&name)
            ))],
            Err(RegistryError::InvalidAddress(_)) | Err(RegistryError::NotFound(_)) => {
                vec![Reply::plain(INVALID_ADDRESS)]
            }
        }
    }

    async fn start_tracking(&self, chat_id: ChatId) -> Vec<Reply> {
        match self.manager.start_tracking(chat_id).await {
            Ok(wallet) => vec![
                Reply::markdown(format!(
                    "Started tracking wallet `{}`\\.",
                    escape_markdown(&wallet.name)
                )),
                self.main_menu(chat_id).await,
            ],
            Err(TrackingError::NoWalletsTracked) => {
                vec![Reply::plain(ADD_FIRST), self.main_menu(chat_id).await]
            }
            Err(TrackingError::NoWalletSelected) => {
                vec![Reply::plain(SELECT_FIRST), self.wallet_list(chat_id)]
            }
        }
    }

    async fn main_menu(&self, chat_id: ChatId) -> Reply {
        let tracking_button = if self.manager.is_tracking(chat_id).await {
            Button::new("Stop Tracking", BotEvent::StopTracking)
        } else {
            Button::new("Start Tracking", BotEvent::StartTracking)
        };

        Reply::plain(MENU_PROMPT).with_buttons(vec![
            vec![Button::new("Add Wallet to Track", BotEvent::AwaitWalletInput)],
            vec![Button::new("View Tracked Wallets", BotEvent::ListWallets)],
            vec![tracking_button],
        ])
    }

    fn wallet_list(&self, chat_id: ChatId) -> Reply {
        let wallets = self.registry().list_wallets(chat_id);
        if wallets.is_empty() {
            return Reply::plain(ADD_FIRST);
        }

        let mut rows: Vec<Vec<Button>> = wallets
            .into_iter()
            .map(|wallet| {
                let label = if wallet.selected {
                    format!("{} ✅", wallet.name)
                } else {
                    wallet.name.clone()
                };
                vec![
                    Button::new(label, BotEvent::SelectWallet(wallet.address.clone())),
                    Button::new("🗑", BotEvent::RemoveWallet(wallet.address)),
                ]
            })
            .collect();
        rows.push(vec![Button::new("Back", BotEvent::ShowMenu)]);

        Reply::plain(WALLETS_PROMPT).with_buttons(rows)
    }
}
