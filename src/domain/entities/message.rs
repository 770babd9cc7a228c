use chrono::{DateTime, Utc};

use super::User;

/// An incoming chat message as handed to the dispatcher.
///
/// The dispatcher only interprets `sender` (for log labels) and `text` (for
/// matching and argument extraction). Everything else, including the raw
/// platform payload, is carried along untouched so handlers and adapters can
/// address the right conversation.
#[derive(Debug, Clone)]
pub struct Inbound {
    pub id: String,
    pub chat_id: String,
    pub sender: Option<User>,
    pub text: String,
    pub platform: String,
    pub timestamp: DateTime<Utc>,
    pub raw: Option<serde_json::Value>,
}

impl Inbound {
    pub fn new(chat_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            chat_id: chat_id.into(),
            sender: None,
            text: text.into(),
            platform: "unknown".to_string(),
            timestamp: Utc::now(),
            raw: None,
        }
    }

    pub fn with_sender(mut self, user: User) -> Self {
        self.sender = Some(user);
        self
    }

    pub fn with_platform(mut self, platform: impl Into<String>) -> Self {
        self.platform = platform.into();
        self
    }

    pub fn with_raw(mut self, raw: serde_json::Value) -> Self {
        self.raw = Some(raw);
        self
    }

    /// Label used in log lines, falling back to the chat id for messages
    /// without sender information.
    pub fn sender_label(&self) -> String {
        self.sender
            .as_ref()
            .map(|u| u.display_name())
            .unwrap_or_else(|| self.chat_id.clone())
    }
}
