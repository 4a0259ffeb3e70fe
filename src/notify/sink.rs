use async_trait::async_trait;

use crate::error::AppResult;
use crate::tracker::ChatId;

/// How the chat platform should render a message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseMode {
    Plain,
    MarkdownV2,
}

impl ParseMode {
    /// Value of Telegram's `parse_mode` field, `None` for plain text
    pub fn as_telegram(&self) -> Option<&'static str> {
        match self {
            ParseMode::Plain => None,
            ParseMode::MarkdownV2 => Some("MarkdownV2"),
        }
    }
}

/// Fire-and-forget message delivery. Callers log failures; nothing retries.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn send(&self, chat_id: ChatId, text: &str, mode: ParseMode) -> AppResult<()>;
}
