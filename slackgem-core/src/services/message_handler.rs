// File: slackgem-core/src/services/message_handler.rs

use std::fmt;
use std::sync::Arc;

use chrono::{Days, Local, NaiveDate};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use slackgem_ai::TextGenerator;
use tracing::{debug, error, info};

use crate::platforms::slack::{EventCallback, EventKind};

pub const EMPTY_MENTION_REPLY: &str = "Received an empty message (via app mention).";
pub const EMPTY_MESSAGE_REPLY: &str = "Received an empty message.";

static MENTION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<@([A-Za-z0-9]+)(?:\|[^>]*)?>").expect("valid mention regex"));
static LEADING_MENTION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*<@[A-Za-z0-9]+(?:\|[^>]*)?>").expect("valid mention regex"));

/// How far back the user asked the analysis to look. Only changes the prompt
/// text; no channel history is fetched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimePeriod {
    Message,
    Day,
    Week,
    Month,
}

impl TimePeriod {
    const PREFIXED: [TimePeriod; 3] = [TimePeriod::Day, TimePeriod::Week, TimePeriod::Month];

    pub fn as_str(&self) -> &'static str {
        match self {
            TimePeriod::Message => "message",
            TimePeriod::Day => "day",
            TimePeriod::Week => "week",
            TimePeriod::Month => "month",
        }
    }

    /// Days subtracted from today to get the window start. Month is approximate.
    pub fn lookback_days(&self) -> Option<u64> {
        match self {
            TimePeriod::Message => None,
            TimePeriod::Day => Some(1),
            TimePeriod::Week => Some(7),
            TimePeriod::Month => Some(30),
        }
    }

    fn prefix(&self) -> Option<&'static str> {
        match self {
            TimePeriod::Message => None,
            TimePeriod::Day => Some("day:"),
            TimePeriod::Week => Some("week:"),
            TimePeriod::Month => Some("month:"),
        }
    }
}

impl fmt::Display for TimePeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedRequest {
    pub cleaned_text: String,
    pub time_period: TimePeriod,
}

/// A message to post back to Slack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub channel: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventOutcome {
    Reply(Reply),
    Ignored(&'static str),
}

/// Removes the bot's own `<@ID>` mention wherever it appears. Without a known
/// bot id only a single leading mention token is dropped.
pub fn strip_mention(text: &str, bot_user_id: Option<&str>) -> String {
    match bot_user_id {
        Some(id) => MENTION
            .replace_all(text, |caps: &Captures| {
                if &caps[1] == id { String::new() } else { caps[0].to_string() }
            })
            .trim()
            .to_string(),
        None => LEADING_MENTION.replace(text, "").trim().to_string(),
    }
}

/// Detects a case-insensitive `day:` / `week:` / `month:` prefix.
pub fn parse_request(text: &str) -> ParsedRequest {
    for period in TimePeriod::PREFIXED {
        let Some(prefix) = period.prefix() else { continue };
        let matches = text
            .get(..prefix.len())
            .is_some_and(|head| head.eq_ignore_ascii_case(prefix));
        if matches {
            return ParsedRequest {
                cleaned_text: text[prefix.len()..].trim().to_string(),
                time_period: period,
            };
        }
    }

    ParsedRequest {
        cleaned_text: text.to_string(),
        time_period: TimePeriod::Message,
    }
}

pub fn window_start(period: TimePeriod, today: NaiveDate) -> Option<NaiveDate> {
    let days = period.lookback_days()?;
    today.checked_sub_days(Days::new(days))
}

pub fn build_prompt(request: &ParsedRequest, channel_id: &str, today: NaiveDate) -> String {
    prompt_since(request, channel_id, window_start(request.time_period, today))
}

/// A missing start date means the plain single-message prompt.
fn prompt_since(request: &ParsedRequest, channel_id: &str, start: Option<NaiveDate>) -> String {
    match start {
        Some(start) => format!(
            "Analyze Slack messages from channel {} since {}. The current message is: '{}'",
            channel_id,
            start.format("%Y-%m-%d"),
            request.cleaned_text
        ),
        None => format!("Analyze the following Slack message: '{}'", request.cleaned_text),
    }
}

/// Turns one inbound event into at most one reply.
#[derive(Clone)]
pub struct MessageHandler {
    generator: Arc<dyn TextGenerator>,
}

impl MessageHandler {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self { generator }
    }

    /// Parses the window prefix, asks the generator and labels the result.
    /// Generation failures come back as reply text.
    pub async fn process_message(&self, message_text: &str, channel_id: &str, ts: &str) -> String {
        self.process_message_on(message_text, channel_id, ts, Local::now().date_naive()).await
    }

    /// Same as [`process_message`](Self::process_message) with an explicit
    /// local date. The label is only added when the prompt carried a window.
    pub async fn process_message_on(
        &self,
        message_text: &str,
        channel_id: &str,
        ts: &str,
        today: NaiveDate,
    ) -> String {
        let request = parse_request(message_text);
        let start = window_start(request.time_period, today);
        let prompt = prompt_since(&request, channel_id, start);
        debug!("Prompt for message {} in {}: {}", ts, channel_id, prompt);

        let analysis = match self.generator.generate(&prompt).await {
            Ok(text) => text,
            Err(e) => {
                error!("Generation failed for message {} in {}: {}", ts, channel_id, e);
                format!("Error during Gemini analysis: {}", e)
            }
        };

        match start {
            Some(_) => format!(
                "Analysis for the past {} (including your message):\n{}",
                request.time_period, analysis
            ),
            None => analysis,
        }
    }

    pub async fn handle_event(&self, callback: &EventCallback) -> EventOutcome {
        let event = &callback.event;
        let kind = event.event_kind();

        if kind == EventKind::Other {
            return EventOutcome::Ignored("unsubscribed event type");
        }
        if event.is_from_bot() {
            info!("Ignoring bot message");
            return EventOutcome::Ignored("bot message");
        }
        let bot_user_id = callback.bot_user_id();
        if bot_user_id.is_some() && event.user.as_deref() == bot_user_id {
            info!("Ignoring message authored by this bot");
            return EventOutcome::Ignored("own message");
        }
        if event.hidden {
            return EventOutcome::Ignored("hidden message");
        }
        let Some(channel) = event.channel.clone() else {
            return EventOutcome::Ignored("event has no channel");
        };

        let placeholder = match kind {
            EventKind::AppMention => EMPTY_MENTION_REPLY,
            _ => EMPTY_MESSAGE_REPLY,
        };

        let raw_text = event.text.as_deref().unwrap_or_default();
        let message_text = strip_mention(raw_text, bot_user_id);
        if message_text.is_empty() {
            return EventOutcome::Reply(Reply { channel, text: placeholder.to_string() });
        }

        let ts = event.ts.as_deref().unwrap_or_default();
        let text = self.process_message(&message_text, &channel, ts).await;
        EventOutcome::Reply(Reply { channel, text })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use slackgem_ai::GenerationError;

    /// Answers with the prompt it was given.
    struct PromptEcho;

    #[async_trait]
    impl TextGenerator for PromptEcho {
        fn name(&self) -> &str {
            "echo"
        }

        async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
            Ok(prompt.to_string())
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn day_prefix_is_detected_and_stripped() {
        let parsed = parse_request("day: summarize this");
        assert_eq!(parsed.time_period, TimePeriod::Day);
        assert_eq!(parsed.cleaned_text, "summarize this");
    }

    #[test]
    fn prefixes_are_case_insensitive() {
        assert_eq!(parse_request("WEEK:recap").time_period, TimePeriod::Week);
        assert_eq!(parse_request("WEEK:recap").cleaned_text, "recap");
        let parsed = parse_request("Month:   what changed?  ");
        assert_eq!(parsed.time_period, TimePeriod::Month);
        assert_eq!(parsed.cleaned_text, "what changed?");
    }

    #[test]
    fn unrecognised_text_is_a_plain_message() {
        let parsed = parse_request("daily standup notes");
        assert_eq!(parsed.time_period, TimePeriod::Message);
        assert_eq!(parsed.cleaned_text, "daily standup notes");

        // prefix must be at the very start
        assert_eq!(parse_request("the day: begins").time_period, TimePeriod::Message);
        // short and multibyte input never panics
        assert_eq!(parse_request("da").time_period, TimePeriod::Message);
        assert_eq!(parse_request("dé:x").time_period, TimePeriod::Message);
    }

    #[test]
    fn plain_prompt_embeds_the_literal_text() {
        let parsed = parse_request("how is the release going?");
        let prompt = build_prompt(&parsed, "C123", date(2024, 3, 15));
        assert_eq!(prompt, "Analyze the following Slack message: 'how is the release going?'");
    }

    #[test]
    fn windowed_prompts_use_start_date() {
        let today = date(2024, 3, 1);
        let day = build_prompt(&parse_request("day: x"), "C1", today);
        assert_eq!(
            day,
            "Analyze Slack messages from channel C1 since 2024-02-29. The current message is: 'x'"
        );
        let week = build_prompt(&parse_request("week: x"), "C1", today);
        assert!(week.contains("since 2024-02-23."));
        let month = build_prompt(&parse_request("month: x"), "C1", today);
        assert!(month.contains("since 2024-01-31."));
    }

    #[test]
    fn own_mention_is_removed_everywhere() {
        assert_eq!(strip_mention("<@U0BOT> day: hi", Some("U0BOT")), "day: hi");
        assert_eq!(strip_mention("hey <@U0BOT> there <@U0BOT>", Some("U0BOT")), "hey  there");
        assert_eq!(strip_mention("ping <@UOTHER>", Some("U0BOT")), "ping <@UOTHER>");
        assert_eq!(strip_mention("<@U0BOT|relay> yo", Some("U0BOT")), "yo");
        assert_eq!(strip_mention("<@UOTHER|al> <@U0BOT>", Some("U0BOT")), "<@UOTHER|al>");
    }

    #[test]
    fn leading_mention_is_removed_without_bot_id() {
        assert_eq!(strip_mention("<@U123ABC> week: recap", None), "week: recap");
        assert_eq!(strip_mention("hello <@U123ABC>", None), "hello <@U123ABC>");
        assert_eq!(strip_mention("  plain  ", None), "plain");
    }

    #[test]
    fn lookback_matches_window() {
        assert_eq!(TimePeriod::Message.lookback_days(), None);
        assert_eq!(TimePeriod::Day.lookback_days(), Some(1));
        assert_eq!(TimePeriod::Week.lookback_days(), Some(7));
        assert_eq!(TimePeriod::Month.lookback_days(), Some(30));
        assert_eq!(window_start(TimePeriod::Message, date(2024, 1, 1)), None);
    }

    #[tokio::test]
    async fn label_follows_the_prompt_window() {
        let handler = MessageHandler::new(Arc::new(PromptEcho));

        let reply = handler.process_message_on("week: recap", "C1", "1.0", date(2024, 3, 1)).await;
        assert_eq!(
            reply,
            "Analysis for the past week (including your message):\n\
             Analyze Slack messages from channel C1 since 2024-02-23. The current message is: 'recap'"
        );

        // no representable start date: plain prompt and no label
        let reply = handler.process_message_on("day: recap", "C1", "1.0", NaiveDate::MIN).await;
        assert_eq!(reply, "Analyze the following Slack message: 'recap'");
    }

    #[test]
    fn window_before_the_calendar_starts_is_none() {
        assert_eq!(window_start(TimePeriod::Day, NaiveDate::MIN), None);
        assert_eq!(
            build_prompt(&parse_request("month: x"), "C1", NaiveDate::MIN),
            "Analyze the following Slack message: 'x'"
        );
    }
}
