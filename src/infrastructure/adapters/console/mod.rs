//! Console adapter for development/testing

use async_trait::async_trait;

use crate::application::errors::BotError;
use crate::domain::entities::Inbound;
use crate::domain::traits::Channel;

/// Console bot adapter for local development
#[derive(Default)]
pub struct ConsoleAdapter;

impl ConsoleAdapter {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Channel for ConsoleAdapter {
    async fn send_text(&self, _msg: &Inbound, text: &str) -> Result<(), BotError> {
        println!("[BOT] {}", text);
        Ok(())
    }
}
