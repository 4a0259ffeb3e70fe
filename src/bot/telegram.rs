use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::debug;

use crate::bot::commands::callback_data;
use crate::bot::handler::{Button, Reply};
use crate::error::{AppError, AppResult};
use crate::notify::{NotificationSink, ParseMode};
use crate::tracker::ChatId;

// ============ WIRE TYPES ============

#[derive(Debug, Deserialize)]
pub struct TelegramResponse<T> {
    pub ok: bool,
    pub result: Option<T>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<Message>,
    pub callback_query: Option<CallbackQuery>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub message_id: i64,
    pub chat: Chat,
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: ChatId,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CallbackQuery {
    pub id: String,
    pub message: Option<Message>,
    pub data: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct InlineKeyboardButton {
    pub text: String,
    pub callback_data: String,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct InlineKeyboardMarkup {
    pub inline_keyboard: Vec<Vec<InlineKeyboardButton>>,
}

impl InlineKeyboardMarkup {
    /// Buttons whose event has no payload encoding are dropped
    pub fn from_buttons(rows: &[Vec<Button>]) -> Self {
        let inline_keyboard = rows
            .iter()
            .map(|row| {
                row.iter()
                    .filter_map(|button| {
                        callback_data(&button.event).map(|data| InlineKeyboardButton {
                            text: button.label.clone(),
                            callback_data: data,
                        })
                    })
                    .collect::<Vec<_>>()
            })
            .filter(|row| !row.is_empty())
            .collect();

        Self { inline_keyboard }
    }
}

// ============ CLIENT ============

/// Bot API client over plain HTTPS
pub struct TelegramApi {
    base_url: String,
    client: reqwest::Client,
}

impl TelegramApi {
    /// `updates_timeout` is the long-poll window; the HTTP timeout is set past it
    pub fn new(api_url: &str, token: &str, updates_timeout: Duration) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(updates_timeout + Duration::from_secs(10))
            .build()?;

        Ok(Self {
            base_url: format!("{}/bot{}", api_url.trim_end_matches('/'), token),
            client,
        })
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, body: Value) -> AppResult<T> {
        let response = self
            .client
            .post(format!("{}/{}", self.base_url, method))
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let body: TelegramResponse<T> = response.json().await.map_err(|e| {
            AppError::Telegram(format!("{} returned HTTP {}: {}", method, status, e))
        })?;

        if !body.ok {
            return Err(AppError::Telegram(format!(
                "{} failed: {}",
                method,
                body.description.unwrap_or_else(|| status.to_string())
            )));
        }

        body.result
            .ok_or_else(|| AppError::Telegram(format!("{} returned no result", method)))
    }

    /// Long-polls for updates after `offset`
    pub async fn get_updates(&self, offset: i64, timeout: Duration) -> AppResult<Vec<Update>> {
        self.call(
            "getUpdates",
            json!({
                "offset": offset,
                "timeout": timeout.as_secs(),
                "allowed_updates": ["message", "callback_query"],
            }),
        )
        .await
    }

    pub async fn send_message(
        &self,
        chat_id: ChatId,
        text: &str,
        mode: ParseMode,
        keyboard: Option<InlineKeyboardMarkup>,
    ) -> AppResult<()> {
        let body = send_message_body(chat_id, text, mode, keyboard);
        let sent: Message = self.call("sendMessage", body).await?;
        debug!("Sent message {} to chat {}", sent.message_id, chat_id);
        Ok(())
    }

    pub async fn send_reply(&self, chat_id: ChatId, reply: &Reply) -> AppResult<()> {
        let keyboard = if reply.buttons.is_empty() {
            None
        } else {
            Some(InlineKeyboardMarkup::from_buttons(&reply.buttons))
        };
        self.send_message(chat_id, &reply.text, reply.mode, keyboard)
            .await
    }

    /// Clears the loading indicator on a pressed button
    pub async fn answer_callback_query(&self, callback_id: &str) -> AppResult<()> {
        let _: bool = self
            .call(
                "answerCallbackQuery",
                json!({ "callback_query_id": callback_id }),
            )
            .await?;
        Ok(())
    }
}

fn send_message_body(
    chat_id: ChatId,
    text: &str,
    mode: ParseMode,
    keyboard: Option<InlineKeyboardMarkup>,
) -> Value {
    let mut body = json!({
        "chat_id": chat_id,
        "text": text,
    });
    if let Some(parse_mode) = mode.as_telegram() {
        body["parse_mode"] = json!(parse_mode);
    }
    if let Some(keyboard) = keyboard {
        body["reply_markup"] = json!(keyboard);
    }
    body
}

#[async_trait]
impl NotificationSink for TelegramApi {
    async fn send(&self, chat_id: ChatId, text: &str, mode: ParseMode) -> AppResult<()> {
        self.send_message(chat_id, text, mode, None).await
    }
}
