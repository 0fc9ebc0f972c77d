use std::sync::Arc;

use tracing::{debug, error, info};

use crate::config::RepliesConfig;
use crate::platform::{BotApi, IncomingMessage};

/// Produces the reply text for a matched message
pub type Handler = Arc<dyn Fn(&IncomingMessage) -> String + Send + Sync>;

/// What a registration responds to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Trigger {
    /// `/name`, optionally addressed as `/name@botname`
    Command(String),
    /// Any text that is not a command
    Text,
}

impl Trigger {
    fn is_command(&self) -> bool {
        matches!(self, Trigger::Command(_))
    }

    /// `bot_username` is our own name; `None` accepts any `@name` suffix.
    pub fn matches(&self, msg: &IncomingMessage, bot_username: Option<&str>) -> bool {
        let Some(text) = msg.text.as_deref() else {
            return false;
        };
        match (self, parse_command(text)) {
            (Trigger::Command(name), Some((cmd, target))) => {
                let ours = match (target, bot_username) {
                    (Some(target), Some(me)) => target.eq_ignore_ascii_case(me),
                    _ => true,
                };
                ours && cmd.eq_ignore_ascii_case(name)
            }
            (Trigger::Command(_), None) => false,
            (Trigger::Text, cmd) => cmd.is_none(),
        }
    }
}

/// Split `/start@clinic_bot arg` into `("start", Some("clinic_bot"))`.
pub fn parse_command(text: &str) -> Option<(&str, Option<&str>)> {
    let first = text.split_whitespace().next()?;
    let command = first.strip_prefix('/')?;
    let (name, target) = match command.split_once('@') {
        Some((name, target)) => (name, Some(target)),
        None => (command, None),
    };
    if name.is_empty() {
        None
    } else {
        Some((name, target))
    }
}

struct Registration {
    trigger: Trigger,
    handler: Handler,
}

/// Ordered trigger table, built once at startup and read-only afterwards.
///
/// Command triggers are tried before text triggers; within each group the
/// earliest registration wins. A message matching nothing is dropped.
#[derive(Default)]
pub struct CommandRouter {
    registrations: Vec<Registration>,
    /// Commands addressed to another `@bot` are ignored once this is known.
    bot_username: Option<String>,
}

impl CommandRouter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_username(mut self, username: Option<String>) -> Self {
        self.bot_username = username;
        self
    }

    pub fn command<F>(self, name: &str, handler: F) -> Self
    where
        F: Fn(&IncomingMessage) -> String + Send + Sync + 'static,
    {
        self.register(Trigger::Command(name.to_string()), handler)
    }

    pub fn text<F>(self, handler: F) -> Self
    where
        F: Fn(&IncomingMessage) -> String + Send + Sync + 'static,
    {
        self.register(Trigger::Text, handler)
    }

    pub fn register<F>(mut self, trigger: Trigger, handler: F) -> Self
    where
        F: Fn(&IncomingMessage) -> String + Send + Sync + 'static,
    {
        self.registrations.push(Registration {
            trigger,
            handler: Arc::new(handler),
        });
        self
    }

    fn find(&self, msg: &IncomingMessage) -> Option<&Registration> {
        let commands = self.registrations.iter().filter(|r| r.trigger.is_command());
        let texts = self.registrations.iter().filter(|r| !r.trigger.is_command());
        let me = self.bot_username.as_deref();
        commands.chain(texts).find(|r| r.trigger.matches(msg, me))
    }

    /// Reply text of the first matching handler, if any.
    pub fn route(&self, msg: &IncomingMessage) -> Option<String> {
        self.find(msg).map(|r| (r.handler)(msg))
    }

    /// Route `msg` and send the reply to its chat. Send failures are logged, not returned.
    pub async fn dispatch(&self, api: &dyn BotApi, msg: &IncomingMessage) {
        let Some(reply) = self.route(msg) else {
            debug!("No trigger matched message in chat {}", msg.chat_id);
            return;
        };

        info!(
            "Replying in chat {} to {} ({:?})",
            msg.chat_id,
            msg.user_name.as_deref().unwrap_or("unknown"),
            msg.user_id
        );

        if let Err(e) = api.send_text(msg.chat_id, &reply).await {
            error!("Failed to send reply: {:#}", e);
        }
    }
}

/// `/start` reply, personalized when the sender's name is known.
pub fn greeting(greeting: &str, msg: &IncomingMessage) -> String {
    match msg.user_name.as_deref() {
        Some(name) => format!("Hello, {}! {}", name, greeting),
        None => format!("Hello! {}", greeting),
    }
}

pub fn echo(prefix: &str, msg: &IncomingMessage) -> String {
    format!("{}{}", prefix, msg.text_or_empty())
}

/// The bot's trigger table: `/start` greets, any other text is echoed back.
pub fn build(replies: &RepliesConfig) -> CommandRouter {
    let greeting_text = replies.greeting.clone();
    let echo_prefix = replies.echo_prefix.clone();

    CommandRouter::new()
        .command("start", move |msg| greeting(&greeting_text, msg))
        .text(move |msg| echo(&echo_prefix, msg))
}
