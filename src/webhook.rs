use anyhow::Result;
use tracing::{error, info, warn};

use crate::platform::BotApi;

/// Point Telegram at `url`, unless it already is.
///
/// Returns `true` when setWebhook was called. Not retried on failure; the
/// caller logs and keeps whatever registration Telegram already holds.
pub async fn ensure_registered(api: &dyn BotApi, url: &str) -> Result<bool> {
    let current = api.current_webhook().await?;
    if current.as_deref() == Some(url) {
        info!("Webhook already registered");
        return Ok(false);
    }

    // URL can contain the bot token; keep it out of the logs.
    info!(
        "Registering webhook (previous registration: {})",
        if current.is_some() { "replaced" } else { "none" }
    );
    api.register_webhook(url).await?;
    Ok(true)
}

/// Startup step for webhook mode. Never fails: a missing base URL skips
/// registration and an API error is logged, so the server still comes up.
pub async fn reconcile(api: &dyn BotApi, url: Option<String>) {
    match url {
        Some(url) => {
            if let Err(e) = ensure_registered(api, &url).await {
                error!("Webhook registration failed: {:#}", e);
            }
        }
        None => warn!("WEBHOOK_URL is not set; leaving webhook registration unchanged"),
    }
}
