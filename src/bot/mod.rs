pub mod commands;
pub mod handler;
pub mod telegram;

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

pub use commands::BotEvent;
pub use handler::{CommandHandler, Reply};
pub use telegram::TelegramApi;

use crate::tracker::ChatId;
use telegram::Update;

const MAX_BACKOFF: Duration = Duration::from_secs(60);

/// Long-polls Telegram and feeds each update through the command handler
pub struct BotRunner {
    api: Arc<TelegramApi>,
    handler: CommandHandler,
    updates_timeout: Duration,
}

impl BotRunner {
    pub fn new(api: Arc<TelegramApi>, handler: CommandHandler, updates_timeout: Duration) -> Self {
        Self {
            api,
            handler,
            updates_timeout,
        }
    }

    /// Runs until `shutdown` fires. Updates are handled one at a time, in order.
    pub async fn run(&self, shutdown: CancellationToken) {
        info!("🤖 Bot is listening for updates");

        let mut offset = 0i64;
        let mut backoff = Duration::from_secs(1);

        loop {
            let updates = tokio::select! {
                _ = shutdown.cancelled() => break,
                result = self.api.get_updates(offset, self.updates_timeout) => result,
            };

            match updates {
                Ok(updates) => {
                    backoff = Duration::from_secs(1);
                    for update in updates {
                        offset = offset.max(update.update_id + 1);
                        self.process(update).await;
                    }
                }
                Err(e) => {
                    warn!("⚠️ Failed to fetch updates: {} (retrying in {:?})", e, backoff);
                    tokio::select! {
                        _ = shutdown.cancelled() => break,
                        _ = tokio::time::sleep(backoff) => {}
                    }
                    backoff = (backoff * 2).min(MAX_BACKOFF);
                }
            }
        }

        info!("🛑 Bot stopped polling for updates");
    }

    async fn process(&self, update: Update) {
        let Some((chat_id, event)) = self.decode(&update).await else {
            debug!("Ignoring update {}", update.update_id);
            return;
        };

        let replies = self.handler.handle(chat_id, event).await;
        self.deliver(chat_id, &replies).await;
    }

    async fn decode(&self, update: &Update) -> Option<(ChatId, BotEvent)> {
        if let Some(callback) = &update.callback_query {
            if let Err(e) = self.api.answer_callback_query(&callback.id).await {
                warn!("⚠️ Failed to answer callback {}: {}", callback.id, e);
            }
            let chat_id = callback.message.as_ref()?.chat.id;
            let data = callback.data.as_deref()?;
            return Some((chat_id, commands::parse_callback(data)));
        }

        let message = update.message.as_ref()?;
        let text = message.text.as_deref()?;
        Some((message.chat.id, commands::parse_message(text)))
    }

    async fn deliver(&self, chat_id: ChatId, replies: &[Reply]) {
        for reply in replies {
            if let Err(e) = self.api.send_reply(chat_id, reply).await {
                error!("❌ Failed to reply to chat {}: {}", chat_id, e);
            }
        }
    }
}
