use async_trait::async_trait;

use crate::application::errors::BotError;
use crate::domain::entities::Inbound;

/// Channel trait - abstraction for messaging platform adapters.
///
/// The dispatcher only ever calls [`Channel::send_many`]; adapters implement
/// the single-message [`Channel::send_text`].
#[async_trait]
pub trait Channel: Send + Sync {
    /// Send one message to the conversation the inbound message came from.
    async fn send_text(&self, msg: &Inbound, text: &str) -> Result<(), BotError>;

    /// Send a sequence of replies, in order.
    ///
    /// Each non-empty string becomes one outbound message, awaited before the
    /// next send starts. Empty strings are dropped, never sent; an empty
    /// slice is a no-op. Stops at the first delivery failure.
    async fn send_many(&self, msg: &Inbound, texts: &[String]) -> Result<(), BotError> {
        for text in texts {
            if text.is_empty() {
                continue;
            }
            self.send_text(msg, text).await?;
        }
        Ok(())
    }
}

/// Platform identity of a running adapter
#[derive(Debug, Clone)]
pub struct BotInfo {
    pub id: String,
    pub name: String,
    pub username: String,
}
