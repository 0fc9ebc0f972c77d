use std::sync::Arc;

use anyhow::{Context, Result};
use teloxide::types::Update;
use tokio::net::TcpListener;
use tracing::{debug, info, warn};

use crate::config::{Config, UpdateMode};
use crate::platform::telegram::TelegramApi;
use crate::platform::{BotApi, IncomingMessage};
use crate::polling::{self, PollOptions};
use crate::router::{self, CommandRouter};
use crate::server::{self, ServerState};
use crate::webhook;

/// Bot API client plus trigger table; shared by the HTTP server and the poll loop
pub struct BotService {
    api: Arc<dyn BotApi>,
    router: CommandRouter,
}

impl BotService {
    pub fn new(api: Arc<dyn BotApi>, router: CommandRouter) -> Self {
        Self { api, router }
    }

    pub fn api(&self) -> Arc<dyn BotApi> {
        self.api.clone()
    }

    /// Route one update and send any reply. Never fails; errors are logged.
    pub async fn handle_update(&self, update: &Update) {
        match IncomingMessage::from_update(update) {
            Some(msg) => self.router.dispatch(self.api.as_ref(), &msg).await,
            None => debug!("Ignoring non-message update {:?}", update.id),
        }
    }
}

/// Start the bot in the configured mode and run until the process is stopped.
pub async fn run(config: Config) -> Result<()> {
    let mode = config.mode();
    let api: Arc<dyn BotApi> = Arc::new(TelegramApi::new(&config.telegram.bot_token));
    let username = match api.bot_username().await {
        Ok(username) => username,
        Err(e) => {
            warn!("Could not look up bot username: {:#}", e);
            None
        }
    };
    let commands = router::build(&config.replies).with_username(username);
    let service = Arc::new(BotService::new(api.clone(), commands));

    let webhook_path = match mode {
        UpdateMode::Webhook => Some(config.webhook_path()),
        UpdateMode::Polling => None,
    };
    let app = server::router(ServerState::ready(service.clone()), webhook_path.as_deref());

    let addr = config.listen_addr()?;
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    info!("Starting bot in {} mode", mode);

    match mode {
        UpdateMode::Webhook => {
            webhook::reconcile(api.as_ref(), config.webhook_url()).await;

            tokio::select! {
                result = server::serve(listener, app) => result,
                _ = tokio::signal::ctrl_c() => {
                    info!("Shutting down");
                    Ok(())
                }
            }
        }
        UpdateMode::Polling => {
            let options = PollOptions::from(&config.polling);
            tokio::select! {
                result = server::serve(listener, app) => result,
                _ = polling::run(service, options) => Ok(()),
                _ = tokio::signal::ctrl_c() => {
                    info!("Shutting down");
                    Ok(())
                }
            }
        }
    }
}
