use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use teloxide::types::{Update, UpdateKind};
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::bot::BotService;

const HEALTH_BODY: &str = "Bot is running";
const MISSING_BOT_BODY: &str = "Bot is not configured: BOT_TOKEN is not set";

/// Shared state for the HTTP handlers
#[derive(Clone, Default)]
pub struct ServerState {
    /// `None` when the bot could not be constructed
    bot: Option<Arc<BotService>>,
}

impl ServerState {
    pub fn ready(bot: Arc<BotService>) -> Self {
        Self { bot: Some(bot) }
    }
}

/// `GET /` for liveness checks, plus `POST <webhook_path>` when one is given.
pub fn router(state: ServerState, webhook_path: Option<&str>) -> Router {
    let app = Router::new().route("/", get(health));
    let app = match webhook_path {
        Some(path) => app.route(path, post(receive_update)),
        None => app,
    };
    app.with_state(state)
}

pub async fn serve(listener: TcpListener, app: Router) -> Result<()> {
    let addr = listener.local_addr().context("Listener has no local address")?;
    info!("HTTP server listening on {}", addr);
    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}

async fn health(State(state): State<ServerState>) -> (StatusCode, &'static str) {
    if state.bot.is_some() {
        (StatusCode::OK, HEALTH_BODY)
    } else {
        (StatusCode::INTERNAL_SERVER_ERROR, MISSING_BOT_BODY)
    }
}

async fn receive_update(State(state): State<ServerState>, body: Bytes) -> (StatusCode, Json<Value>) {
    let update: Update = match serde_json::from_slice(&body) {
        Ok(update) => update,
        Err(e) => {
            warn!("Rejected webhook body: {}", e);
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": "invalid update body" })),
            );
        }
    };

    // teloxide keeps an unparsable update kind as `UpdateKind::Error` instead of failing.
    if let UpdateKind::Error(raw) = &update.kind {
        warn!("Rejected malformed update {:?}: {}", update.id, raw);
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "invalid update body" })),
        );
    }

    let Some(bot) = state.bot.as_ref() else {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": MISSING_BOT_BODY })),
        );
    };

    bot.handle_update(&update).await;
    (StatusCode::OK, Json(json!({})))
}
