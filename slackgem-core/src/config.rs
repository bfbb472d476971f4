// src/config.rs

use std::fmt;

use slackgem_ai::ProviderConfig;
use tracing::{debug, info};

use crate::Error;

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-pro";
pub const DEFAULT_SLACK_API_BASE: &str = "https://slack.com/api";

/// Everything the bot needs at startup. Built once and handed to the
/// components that need it.
#[derive(Clone)]
pub struct BotConfig {
    pub slack_bot_token: String,
    pub slack_signing_secret: String,
    pub google_api_key: String,
    pub port: u16,
    pub gemini_model: String,
    pub gemini_api_base: Option<String>,
    pub slack_api_base: String,
}

impl BotConfig {
    /// Loads `.env` (if any) and reads the process environment.
    pub fn load() -> Result<Self, Error> {
        match dotenv::dotenv() {
            Ok(path) => info!("Loaded environment from {}", path.display()),
            Err(e) => debug!("No .env file loaded: {}", e),
        }
        Self::from_env()
    }

    pub fn from_env() -> Result<Self, Error> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup. Empty values are
    /// treated the same as missing ones.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let require = |key: &str| {
            get(key).ok_or_else(|| Error::Config(format!("{} environment variable not set.", key)))
        };

        let slack_bot_token = require("SLACK_BOT_TOKEN")?;
        let slack_signing_secret = require("SLACK_SIGNING_SECRET")?;
        let google_api_key = require("GOOGLE_API_KEY")?;

        let port = match get("PORT") {
            Some(raw) => raw
                .parse::<u16>()
                .map_err(|e| Error::Config(format!("PORT must be a port number, got '{}': {}", raw, e)))?,
            None => DEFAULT_PORT,
        };

        Ok(Self {
            slack_bot_token,
            slack_signing_secret,
            google_api_key,
            port,
            gemini_model: get("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string()),
            gemini_api_base: get("GEMINI_API_BASE"),
            slack_api_base: get("SLACK_API_BASE").unwrap_or_else(|| DEFAULT_SLACK_API_BASE.to_string()),
        })
    }

    pub fn provider_config(&self) -> ProviderConfig {
        ProviderConfig::gemini(self.google_api_key.clone(), self.gemini_model.clone())
            .with_api_base(self.gemini_api_base.clone())
    }
}

impl fmt::Debug for BotConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BotConfig")
            .field("slack_bot_token", &"<redacted>")
            .field("slack_signing_secret", &"<redacted>")
            .field("google_api_key", &"<redacted>")
            .field("port", &self.port)
            .field("gemini_model", &self.gemini_model)
            .field("gemini_api_base", &self.gemini_api_base)
            .field("slack_api_base", &self.slack_api_base)
            .finish()
    }
}
