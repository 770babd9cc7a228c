//! Telegram adapter

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::application::errors::BotError;
use crate::domain::entities::{Inbound, User};
use crate::domain::traits::{BotInfo, Channel};

/// Telegram API base URL
const API_BASE: &str = "https://api.telegram.org";

/// Telegram update type
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<Message>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Message {
    pub message_id: i64,
    pub from: Option<TelegramUser>,
    pub chat: Chat,
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TelegramUser {
    pub id: i64,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Chat {
    pub id: i64,
}

/// Telegram bot adapter
pub struct TelegramAdapter {
    token: String,
    client: Client,
    info: BotInfo,
}

impl TelegramAdapter {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            client: Client::new(),
            info: BotInfo {
                id: "unknown".to_string(),
                name: "treinbot".to_string(),
                username: "treinbot".to_string(),
            },
        }
    }

    /// Get the API URL for a method
    fn api_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", API_BASE, self.token, method)
    }

    /// Fetch bot info from Telegram API
    pub async fn fetch_bot_info(&mut self) -> Result<(), BotError> {
        #[derive(Deserialize)]
        struct Response {
            result: BotInfoResponse,
        }

        #[derive(Deserialize)]
        struct BotInfoResponse {
            id: i64,
            first_name: String,
            username: String,
        }

        let url = self.api_url("getMe");
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| BotError::Network(e.to_string()))?;

        let data: Response = response
            .json()
            .await
            .map_err(|e| BotError::Parse(e.to_string()))?;

        self.info = BotInfo {
            id: data.result.id.to_string(),
            name: data.result.first_name,
            username: data.result.username,
        };

        Ok(())
    }

    pub fn bot_info(&self) -> BotInfo {
        self.info.clone()
    }

    /// Get updates from Telegram using the getUpdates API
    pub async fn get_updates(&self, offset: i64, timeout: i64) -> Result<Vec<Update>, BotError> {
        #[derive(Serialize)]
        struct GetUpdatesRequest {
            offset: i64,
            timeout: i64,
            allowed_updates: Vec<String>,
        }

        #[derive(Deserialize)]
        struct Response {
            result: Vec<Update>,
        }

        let url = self.api_url("getUpdates");
        let request = GetUpdatesRequest {
            offset,
            timeout,
            allowed_updates: vec!["message".to_string()],
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| BotError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(BotError::Network(format!(
                "Telegram API error: {}",
                response.status()
            )));
        }

        let data: Response = response
            .json()
            .await
            .map_err(|e| BotError::Parse(e.to_string()))?;

        Ok(data.result)
    }

    /// Get the next update offset
    pub fn get_next_offset(updates: &[Update]) -> i64 {
        updates.iter().map(|u| u.update_id + 1).max().unwrap_or(0)
    }

    /// Send a message via the Telegram API
    async fn send_message_api(&self, chat_id: &str, text: &str) -> Result<(), BotError> {
        #[derive(Serialize)]
        struct SendMessageRequest {
            chat_id: String,
            text: String,
        }

        let url = self.api_url("sendMessage");
        let request = SendMessageRequest {
            chat_id: chat_id.to_string(),
            text: text.to_string(),
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| BotError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(BotError::Network(format!(
                "Telegram API error: {}",
                response.status()
            )));
        }

        Ok(())
    }
}

#[async_trait]
impl Channel for TelegramAdapter {
    async fn send_text(&self, msg: &Inbound, text: &str) -> Result<(), BotError> {
        tracing::debug!("Sending to {}: {}", msg.chat_id, text);
        self.send_message_api(&msg.chat_id, text).await
    }
}

/// Build an [`Inbound`] from a Telegram update, skipping non-text updates.
pub fn inbound_from_update(update: &Update) -> Option<Inbound> {
    let message = update.message.as_ref()?;
    let text = message.text.clone()?;

    let mut inbound = Inbound::new(message.chat.id.to_string(), text).with_platform("telegram");

    if let Some(from) = &message.from {
        let mut user = User::new(from.id.to_string());
        if let Some(ref username) = from.username {
            user = user.with_username(username);
        }
        if let Some(ref first) = from.first_name {
            user = user.with_first_name(first);
        }
        if let Some(ref last) = from.last_name {
            user = user.with_last_name(last);
        }
        inbound = inbound.with_sender(user);
    }

    if let Ok(raw) = serde_json::to_value(update) {
        inbound = inbound.with_raw(raw);
    }

    Some(inbound)
}
