pub mod telegram;

#[cfg(test)]
pub mod mock;

use anyhow::Result;
use async_trait::async_trait;
use teloxide::types::{Message, Update, UpdateKind};

/// A chat message normalized out of a Telegram update
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IncomingMessage {
    /// Chat the message came from; replies go here
    pub chat_id: i64,
    /// Telegram user ID of the sender, absent for channel posts
    pub user_id: Option<u64>,
    /// Display name (first name) of the sender
    pub user_name: Option<String>,
    /// The message text, absent for stickers, photos and the like
    pub text: Option<String>,
}

impl IncomingMessage {
    /// Only `message` updates are routed; everything else yields `None`.
    pub fn from_update(update: &Update) -> Option<Self> {
        match &update.kind {
            UpdateKind::Message(msg) => Some(Self::from_message(msg)),
            _ => None,
        }
    }

    pub fn from_message(msg: &Message) -> Self {
        let user = msg.from.as_ref();
        Self {
            chat_id: msg.chat.id.0,
            user_id: user.map(|u| u.id.0),
            user_name: user
                .map(|u| u.first_name.clone())
                .filter(|name| !name.is_empty()),
            text: msg.text().map(str::to_string),
        }
    }

    /// Text with absent treated as empty.
    pub fn text_or_empty(&self) -> &str {
        self.text.as_deref().unwrap_or("")
    }
}

/// The slice of the Bot API this bot talks to.
#[async_trait]
pub trait BotApi: Send + Sync {
    /// Long-poll for updates with id >= `offset`, waiting up to `timeout_secs`.
    async fn fetch_updates(&self, offset: i32, timeout_secs: u32) -> Result<Vec<Update>>;

    async fn send_text(&self, chat_id: i64, text: &str) -> Result<()>;

    /// The bot's own `@username`, used to tell which `/cmd@name` commands are ours.
    async fn bot_username(&self) -> Result<Option<String>>;

    /// URL of the currently registered webhook, `None` when none is set.
    async fn current_webhook(&self) -> Result<Option<String>>;

    async fn register_webhook(&self, url: &str) -> Result<()>;

    async fn remove_webhook(&self) -> Result<()>;
}
