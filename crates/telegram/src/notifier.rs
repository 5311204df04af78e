use async_trait::async_trait;
use chrono::Local;
use teloxide::payloads::SendMessageSetters;
use teloxide::prelude::*;
use teloxide::types::{ParseMode, Recipient};
use teloxide::RequestError;
use tracing::{info, warn};

use common::{Error, Notifier, Result, Signal, TelegramConfig};

use crate::message::format_signal_alert;

/// Parse a chat id: numeric ids (including negative group ids) or `@channel`.
pub fn parse_recipient(chat_id: &str) -> Result<Recipient> {
    let chat_id = chat_id.trim();
    if let Ok(id) = chat_id.parse::<i64>() {
        return Ok(Recipient::Id(ChatId(id)));
    }
    if chat_id.starts_with('@') && chat_id.len() > 1 {
        return Ok(Recipient::ChannelUsername(chat_id.to_string()));
    }
    Err(Error::Config(format!(
        "TELEGRAM_CHAT_ID must be a numeric id or @channel, got '{chat_id}'"
    )))
}

/// Sends signal alerts to a single Telegram chat.
pub struct TelegramNotifier {
    bot: Bot,
    recipient: Recipient,
}

impl TelegramNotifier {
    pub fn new(cfg: &TelegramConfig) -> Result<Self> {
        Ok(Self {
            bot: Bot::new(&cfg.token),
            recipient: parse_recipient(&cfg.chat_id)?,
        })
    }

    /// Send a short message to confirm the token and chat id work.
    pub async fn test_connection(&self) -> bool {
        let ok = self.send("✅ Connection test successful").await;
        if ok {
            info!("Telegram connection test passed");
        }
        ok
    }

    async fn deliver(&self, message: &str) -> Result<()> {
        self.bot
            .send_message(self.recipient.clone(), message)
            .parse_mode(ParseMode::Html)
            .await
            .map_err(notify_error)?;
        Ok(())
    }
}

fn notify_error(e: RequestError) -> Error {
    Error::Notify(e.to_string())
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn send(&self, message: &str) -> bool {
        match self.deliver(message).await {
            Ok(()) => true,
            Err(e) => {
                warn!(recipient = ?self.recipient, error = %e, "Failed to send Telegram message");
                false
            }
        }
    }

    async fn notify_signal(&self, signal: &Signal) -> bool {
        self.send(&format_signal_alert(signal, &Local::now())).await
    }
}
