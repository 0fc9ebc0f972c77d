use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::Path;

/// Environment variables that may carry the bot token, in priority order.
pub const TOKEN_VARS: [&str; 2] = ["BOT_TOKEN", "TELEGRAM_BOT_TOKEN"];

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum UpdateMode {
    Polling,
    Webhook,
}

impl std::fmt::Display for UpdateMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UpdateMode::Polling => write!(f, "polling"),
            UpdateMode::Webhook => write!(f, "webhook"),
        }
    }
}

impl std::str::FromStr for UpdateMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "polling" | "poll" => Ok(UpdateMode::Polling),
            "webhook" => Ok(UpdateMode::Webhook),
            other => bail!("Unknown update mode '{}', expected 'polling' or 'webhook'", other),
        }
    }
}

/// Where Telegram posts updates in webhook mode.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum WebhookPath {
    /// `/webhook`
    #[default]
    Fixed,
    /// `/<bot token>`, so the endpoint is not guessable.
    Token,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct TelegramConfig {
    #[serde(default)]
    pub bot_token: String,
    #[serde(default)]
    pub mode: Option<UpdateMode>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct WebhookConfig {
    /// Public base URL of this service, e.g. `https://mybot.up.railway.app`.
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub path: WebhookPath,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PollingConfig {
    #[serde(default = "default_poll_timeout")]
    pub timeout_secs: u32,
    #[serde(default = "default_retry_delay")]
    pub retry_delay_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RepliesConfig {
    #[serde(default = "default_greeting")]
    pub greeting: String,
    #[serde(default = "default_echo_prefix")]
    pub echo_prefix: String,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub telegram: TelegramConfig,
    #[serde(default)]
    pub webhook: WebhookConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub polling: PollingConfig,
    #[serde(default)]
    pub replies: RepliesConfig,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_poll_timeout() -> u32 {
    10
}

fn default_retry_delay() -> u64 {
    5
}

fn default_greeting() -> String {
    "Clinic bot is online. How can I help?".to_string()
}

fn default_echo_prefix() -> String {
    "You said: ".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_poll_timeout(),
            retry_delay_secs: default_retry_delay(),
        }
    }
}

impl Default for RepliesConfig {
    fn default() -> Self {
        Self {
            greeting: default_greeting(),
            echo_prefix: default_echo_prefix(),
        }
    }
}

impl Config {
    /// Load the optional TOML file at `path`, then overlay the process environment.
    pub fn load(path: &Path) -> Result<Self> {
        let content = if path.exists() {
            Some(
                std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read config file: {}", path.display()))?,
            )
        } else {
            None
        };

        Self::from_sources(content.as_deref(), |key| std::env::var(key).ok())
    }

    /// Build a config from file contents and an environment lookup.
    /// Environment values win over file values. Fails if no bot token is found.
    pub fn from_sources<F>(file: Option<&str>, env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config: Config = match file {
            Some(content) => toml::from_str(content).context("Failed to parse config file")?,
            None => Config::default(),
        };

        let env = |key: &str| env(key).filter(|v| !v.trim().is_empty());

        if let Some(token) = TOKEN_VARS.iter().find_map(|&key| env(key)) {
            config.telegram.bot_token = token;
        }
        if let Some(url) = env("WEBHOOK_URL") {
            config.webhook.base_url = Some(url);
        }
        if let Some(mode) = env("BOT_MODE") {
            config.telegram.mode = Some(mode.parse()?);
        }
        if let Some(port) = env("PORT") {
            config.server.port = port
                .trim()
                .parse()
                .with_context(|| format!("Invalid PORT value: {}", port))?;
        }

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.telegram.bot_token.trim().is_empty() {
            bail!(
                "Bot token is not set: export BOT_TOKEN or TELEGRAM_BOT_TOKEN, \
                 or set telegram.bot_token in the config file"
            );
        }
        Ok(())
    }

    /// Explicit mode if configured, otherwise webhook when a public URL is known.
    pub fn mode(&self) -> UpdateMode {
        match self.telegram.mode {
            Some(mode) => mode,
            None if self.webhook.base_url.is_some() => UpdateMode::Webhook,
            None => UpdateMode::Polling,
        }
    }

    /// Path of the update endpoint, always starting with `/`.
    pub fn webhook_path(&self) -> String {
        match self.webhook.path {
            WebhookPath::Fixed => "/webhook".to_string(),
            WebhookPath::Token => format!("/{}", self.telegram.bot_token),
        }
    }

    /// Public URL Telegram should post to, if a base URL is configured.
    pub fn webhook_url(&self) -> Option<String> {
        let base = self.webhook.base_url.as_deref()?.trim_end_matches('/');
        Some(format!("{}{}", base, self.webhook_path()))
    }

    pub fn listen_addr(&self) -> Result<SocketAddr> {
        let addr = format!("{}:{}", self.server.host, self.server.port);
        addr.parse()
            .with_context(|| format!("Invalid listen address: {}", addr))
    }
}
