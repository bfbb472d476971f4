use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, error};

use crate::Error;
use crate::config::DEFAULT_SLACK_API_BASE;

/// The one Slack Web API call the bot makes.
#[async_trait]
pub trait SlackApi: Send + Sync {
    async fn post_message(&self, channel: &str, text: &str) -> Result<(), Error>;
}

#[derive(Debug, Deserialize)]
struct PostMessageResponse {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
}

/// Web API client authenticated with the bot token.
#[derive(Clone)]
pub struct SlackWebClient {
    bot_token: String,
    api_base: String,
    client: reqwest::Client,
}

impl SlackWebClient {
    pub fn new(bot_token: impl Into<String>) -> Self {
        Self::with_api_base(bot_token, DEFAULT_SLACK_API_BASE)
    }

    pub fn with_api_base(bot_token: impl Into<String>, api_base: impl Into<String>) -> Self {
        Self {
            bot_token: bot_token.into(),
            api_base: api_base.into().trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl SlackApi for SlackWebClient {
    async fn post_message(&self, channel: &str, text: &str) -> Result<(), Error> {
        let url = format!("{}/chat.postMessage", self.api_base);
        debug!("Posting reply to channel {} via {}", channel, url);

        let response = self.client
            .post(&url)
            .bearer_auth(&self.bot_token)
            .json(&json!({
                "channel": channel,
                "text": text,
            }))
            .send()
            .await?
            .error_for_status()?
            .json::<PostMessageResponse>()
            .await?;

        if !response.ok {
            let reason = response.error.unwrap_or_else(|| "unknown_error".to_string());
            error!("chat.postMessage to {} failed: {}", channel, reason);
            return Err(Error::Platform(format!("chat.postMessage failed: {}", reason)));
        }

        Ok(())
    }
}
