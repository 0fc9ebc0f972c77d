//! In-memory `BotApi` that records every call, for tests.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use anyhow::{bail, Result};
use async_trait::async_trait;
use serde_json::json;
use teloxide::types::Update;

use crate::platform::BotApi;

#[derive(Default)]
pub struct RecordingApi {
    /// `(chat_id, text)` for every sendMessage
    pub sent: Mutex<Vec<(i64, String)>>,
    /// Webhook URL as Telegram would currently report it
    pub webhook: Mutex<Option<String>>,
    pub set_webhook_calls: Mutex<Vec<String>>,
    pub delete_webhook_calls: Mutex<usize>,
    /// Scripted getUpdates results, consumed front to back
    pub batches: Mutex<VecDeque<Result<Vec<Update>>>>,
    /// Offsets passed to getUpdates
    pub offsets: Mutex<Vec<i32>>,
    /// Reported by getMe
    pub username: Option<String>,
    pub fail_send: bool,
    pub fail_webhook: bool,
}

impl RecordingApi {
    pub fn with_webhook(url: &str) -> Self {
        Self {
            webhook: Mutex::new(Some(url.to_string())),
            ..Default::default()
        }
    }

    pub fn push_batch(&self, batch: Result<Vec<Update>>) {
        self.batches.lock().unwrap().push_back(batch);
    }

    pub fn sent(&self) -> Vec<(i64, String)> {
        self.sent.lock().unwrap().clone()
    }

    pub fn set_webhook_calls(&self) -> Vec<String> {
        self.set_webhook_calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl BotApi for RecordingApi {
    async fn fetch_updates(&self, offset: i32, _timeout_secs: u32) -> Result<Vec<Update>> {
        self.offsets.lock().unwrap().push(offset);
        let next = self.batches.lock().unwrap().pop_front();
        match next {
            Some(batch) => batch,
            None => {
                // Stand-in for a long poll that times out empty.
                tokio::time::sleep(Duration::from_millis(5)).await;
                Ok(Vec::new())
            }
        }
    }

    async fn send_text(&self, chat_id: i64, text: &str) -> Result<()> {
        if self.fail_send {
            bail!("sendMessage failed: network down");
        }
        self.sent.lock().unwrap().push((chat_id, text.to_string()));
        Ok(())
    }

    async fn bot_username(&self) -> Result<Option<String>> {
        Ok(self.username.clone())
    }

    async fn current_webhook(&self) -> Result<Option<String>> {
        if self.fail_webhook {
            bail!("getWebhookInfo failed: network down");
        }
        Ok(self.webhook.lock().unwrap().clone())
    }

    async fn register_webhook(&self, url: &str) -> Result<()> {
        if self.fail_webhook {
            bail!("setWebhook failed: network down");
        }
        self.set_webhook_calls.lock().unwrap().push(url.to_string());
        *self.webhook.lock().unwrap() = Some(url.to_string());
        Ok(())
    }

    async fn remove_webhook(&self) -> Result<()> {
        *self.delete_webhook_calls.lock().unwrap() += 1;
        *self.webhook.lock().unwrap() = None;
        Ok(())
    }
}

/// Telegram JSON for a private-chat text message.
pub fn update_json(update_id: u32, chat_id: i64, first_name: &str, text: &str) -> serde_json::Value {
    json!({
        "update_id": update_id,
        "message": {
            "message_id": update_id,
            "date": 1_700_000_000,
            "chat": {
                "id": chat_id,
                "type": "private",
                "first_name": first_name
            },
            "from": {
                "id": 7,
                "is_bot": false,
                "first_name": first_name
            },
            "text": text
        }
    })
}

pub fn text_update(update_id: u32, chat_id: i64, first_name: &str, text: &str) -> Update {
    // Parse from text like the webhook and getUpdates paths; `from_value`
    // loses the flattened update kind.
    serde_json::from_str(&update_json(update_id, chat_id, first_name, text).to_string())
        .expect("valid Telegram update JSON")
}
