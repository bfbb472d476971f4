// File: slackgem-core/src/services/relay_service.rs

use std::sync::Arc;

use tracing::{debug, info};

use crate::Error;
use crate::platforms::slack::{EventCallback, SlackApi};
use crate::services::message_handler::{EventOutcome, MessageHandler};

/// Runs the message handler for one delivery and posts its reply.
pub struct RelayService {
    handler: MessageHandler,
    slack: Arc<dyn SlackApi>,
}

impl RelayService {
    pub fn new(handler: MessageHandler, slack: Arc<dyn SlackApi>) -> Self {
        Self { handler, slack }
    }

    pub async fn handle_callback(&self, callback: &EventCallback) -> Result<EventOutcome, Error> {
        let event = &callback.event;
        info!(
            "Received {} event id={} team={} channel={} ts={}",
            event.kind,
            callback.event_id.as_deref().unwrap_or("-"),
            callback.team_id.as_deref().unwrap_or("-"),
            event.channel.as_deref().unwrap_or("-"),
            event.ts.as_deref().unwrap_or("-"),
        );

        let outcome = self.handler.handle_event(callback).await;
        match &outcome {
            EventOutcome::Reply(reply) => {
                self.slack.post_message(&reply.channel, &reply.text).await?;
                info!("Replied in channel {}", reply.channel);
            }
            EventOutcome::Ignored(reason) => {
                debug!("Event ignored: {}", reason);
            }
        }
        Ok(outcome)
    }
}
