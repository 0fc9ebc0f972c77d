use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use futures::stream::{self, Stream, StreamExt};
use teloxide::types::Update;
use tracing::{info, warn};

use crate::bot::BotService;
use crate::config::PollingConfig;
use crate::platform::BotApi;

#[derive(Debug, Clone, Copy)]
pub struct PollOptions {
    /// Server-side long-poll timeout
    pub timeout_secs: u32,
    /// Pause after a failed getUpdates before asking again
    pub retry_delay: Duration,
}

impl From<&PollingConfig> for PollOptions {
    fn from(config: &PollingConfig) -> Self {
        Self {
            timeout_secs: config.timeout_secs,
            retry_delay: Duration::from_secs(config.retry_delay_secs),
        }
    }
}

struct PollState {
    api: Arc<dyn BotApi>,
    offset: i32,
    pending: VecDeque<Update>,
}

/// Endless stream of updates in arrival order.
///
/// The offset moves past every received update before the next getUpdates
/// call, so Telegram never returns the same update twice. Poll failures are
/// logged and retried after `retry_delay`; the stream itself never ends.
pub fn updates(api: Arc<dyn BotApi>, options: PollOptions) -> impl Stream<Item = Update> + Send {
    let state = PollState {
        api,
        offset: 0,
        pending: VecDeque::new(),
    };

    stream::unfold(state, move |mut state| async move {
        loop {
            if let Some(update) = state.pending.pop_front() {
                return Some((update, state));
            }

            match state
                .api
                .fetch_updates(state.offset, options.timeout_secs)
                .await
            {
                Ok(batch) => {
                    for update in batch {
                        state.offset = state.offset.max(update.id.as_offset());
                        state.pending.push_back(update);
                    }
                }
                Err(e) => {
                    warn!("Telegram poll error: {:#}", e);
                    tokio::time::sleep(options.retry_delay).await;
                }
            }
        }
    })
}

/// Poll forever, dispatching each update before taking the next one.
pub async fn run(service: Arc<BotService>, options: PollOptions) {
    let api = service.api();

    // getUpdates is refused while a webhook is registered.
    match api.current_webhook().await {
        Ok(Some(_)) => {
            info!("Removing registered webhook before polling");
            if let Err(e) = api.remove_webhook().await {
                warn!("Failed to remove webhook: {:#}", e);
            }
        }
        Ok(None) => {}
        Err(e) => warn!("Failed to query webhook info: {:#}", e),
    }

    info!("Polling Telegram for updates...");

    let updates = updates(api, options);
    futures::pin_mut!(updates);
    while let Some(update) = updates.next().await {
        service.handle_update(&update).await;
    }
}
