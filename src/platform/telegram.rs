use anyhow::{Context, Result};
use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::Update;
use tracing::debug;

use crate::platform::BotApi;

/// Telegram Bot API client backed by teloxide
#[derive(Clone)]
pub struct TelegramApi {
    bot: Bot,
}

impl TelegramApi {
    pub fn new(token: &str) -> Self {
        Self {
            bot: Bot::new(token),
        }
    }
}

#[async_trait]
impl BotApi for TelegramApi {
    async fn fetch_updates(&self, offset: i32, timeout_secs: u32) -> Result<Vec<Update>> {
        debug!("getUpdates offset={} timeout={}s", offset, timeout_secs);
        self.bot
            .get_updates()
            .offset(offset)
            .timeout(timeout_secs)
            .await
            .context("getUpdates failed")
    }

    async fn send_text(&self, chat_id: i64, text: &str) -> Result<()> {
        self.bot
            .send_message(ChatId(chat_id), text)
            .await
            .with_context(|| format!("sendMessage to chat {} failed", chat_id))?;
        Ok(())
    }

    async fn bot_username(&self) -> Result<Option<String>> {
        let me = self.bot.get_me().await.context("getMe failed")?;
        Ok(me.user.username)
    }

    async fn current_webhook(&self) -> Result<Option<String>> {
        let info = self
            .bot
            .get_webhook_info()
            .await
            .context("getWebhookInfo failed")?;
        Ok(info.url.map(|url| url.to_string()))
    }

    async fn register_webhook(&self, url: &str) -> Result<()> {
        // URL can contain the bot token; keep it out of the error.
        let url: reqwest::Url = url.parse().context("Invalid webhook URL")?;
        self.bot.set_webhook(url).await.context("setWebhook failed")?;
        Ok(())
    }

    async fn remove_webhook(&self) -> Result<()> {
        self.bot
            .delete_webhook()
            .await
            .context("deleteWebhook failed")?;
        Ok(())
    }
}
