//! Serde model of the Slack Events API payloads the bot subscribes to.

use serde::Deserialize;

/// Outer body of every request Slack sends to the events endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SlackEnvelope {
    /// One-time handshake when the request URL is configured.
    UrlVerification { challenge: String },
    EventCallback(EventCallback),
    #[serde(other)]
    Unsupported,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EventCallback {
    #[serde(default)]
    pub team_id: Option<String>,
    #[serde(default)]
    pub event_id: Option<String>,
    #[serde(default)]
    pub authorizations: Vec<Authorization>,
    pub event: SlackEvent,
}

impl EventCallback {
    /// User id of the installed bot, as Slack reports it for this delivery.
    pub fn bot_user_id(&self) -> Option<&str> {
        self.authorizations
            .first()
            .and_then(|a| a.user_id.as_deref())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Authorization {
    #[serde(default)]
    pub user_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SlackEvent {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub channel: Option<String>,
    #[serde(default)]
    pub ts: Option<String>,
    #[serde(default)]
    pub subtype: Option<String>,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub bot_id: Option<String>,
    #[serde(default)]
    pub hidden: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    AppMention,
    Message,
    Other,
}

impl SlackEvent {
    pub fn event_kind(&self) -> EventKind {
        match self.kind.as_str() {
            "app_mention" => EventKind::AppMention,
            "message" => EventKind::Message,
            _ => EventKind::Other,
        }
    }

    /// Posted by a bot integration, including this one.
    pub fn is_from_bot(&self) -> bool {
        self.subtype.as_deref() == Some("bot_message") || self.bot_id.is_some()
    }
}
