//! Message router: drives one inbound event from eligibility filter through
//! rate limiting, prompt assembly, the upstream call, and the reply.
//!
//! Each event is an independent unit of work; the router holds only shared
//! `Arc` state, so completions for different users run fully in parallel.

use std::sync::Arc;

use seekbot_core::{Bot, Message, Result};
use seekbot_upstream::{ChatMessage, CompletionClient, UpstreamError};
use tracing::{debug, error, info, instrument};

use crate::config::BotConfig;
use crate::history::{HistoryKey, HistoryStore};
use crate::mention;
use crate::rate_limit::RateLimiter;

// --- User-facing fallback messages (sent to Telegram on errors) ---
const MSG_UNAVAILABLE: &str =
    "I'm having trouble reaching my AI service right now. Please try again later.";
const MSG_REQUEST_FAILED: &str =
    "Sorry, I ran into an error processing your request. Please try again.";
const MSG_BUSY: &str = "System is busy, please try again in a moment.";

/// System instruction used for the summarize trigger instead of the persona prompt.
const SUMMARIZE_INSTRUCTION: &str = "Summarize the quoted message into a short, condensed form. \
Keep the key points, drop filler, and answer in the language of the quoted message.";

/// Returns true when the question asks for a detailed answer (trailing ellipsis).
fn is_detailed_request(question: &str) -> bool {
    let trimmed = question.trim_end();
    trimmed.ends_with("...") || trimmed.ends_with('…')
}

/// Routes one inbound message: filter (mention / reply-to-bot / DM), rate
/// check, context build from [`HistoryStore`], upstream completion, history
/// append, and reply. Failures turn into a short fallback reply and never
/// mutate history.
pub struct Router {
    bot_username: String,
    bot: Arc<dyn Bot>,
    llm: Arc<dyn CompletionClient>,
    history: Arc<HistoryStore>,
    rate_limiter: Arc<RateLimiter>,
    system_prompt: String,
    detailed_system_prompt: String,
    summarize_keyword: String,
}

impl Router {
    pub fn new(
        bot_username: String,
        bot: Arc<dyn Bot>,
        llm: Arc<dyn CompletionClient>,
        history: Arc<HistoryStore>,
        rate_limiter: Arc<RateLimiter>,
        config: &BotConfig,
    ) -> Self {
        Self {
            bot_username,
            bot,
            llm,
            history,
            rate_limiter,
            system_prompt: config.system_prompt.clone(),
            detailed_system_prompt: config.detailed_system_prompt.clone(),
            summarize_keyword: config.summarize_keyword.clone(),
        }
    }

    /// Handles one inbound event end to end.
    #[instrument(skip(self, message), fields(
        user_id = message.user.id,
        chat_id = message.chat.id,
        message_id = %message.id,
    ))]
    pub async fn handle(&self, message: &Message) -> Result<()> {
        let Some(question) = self.eligible_question(message) else {
            debug!("Event does not warrant a reply, dropping");
            return Ok(());
        };

        // Held for the rest of the exchange; releases the global slot on drop.
        let Some(_in_flight) = self.rate_limiter.begin_request() else {
            info!("At global concurrency cap, replying busy");
            if let Err(e) = self.bot.reply_to(message, MSG_BUSY).await {
                error!(error = %e, "Failed to send busy message");
            }
            return Ok(());
        };

        if !self.rate_limiter.allow(message.user.id) {
            info!("Rate limited, dropping without reply");
            return Ok(());
        }

        let key = HistoryKey {
            chat_id: message.chat.id,
            user_id: message.user.id,
        };
        let messages = self.build_prompt(message, &question, key);

        info!(
            message_count = messages.len(),
            question = %question,
            "Submitting to upstream"
        );

        match self.llm.complete(messages).await {
            Ok(reply) => {
                self.history.append_exchange(key, &question, &reply);
                self.bot.reply_to(message, &reply).await?;
                info!(reply_len = reply.len(), "Reply sent");
            }
            Err(e) => {
                error!(error = %e, "Upstream completion failed");
                let fallback = match e {
                    UpstreamError::Exhausted => MSG_UNAVAILABLE,
                    _ => MSG_REQUEST_FAILED,
                };
                if let Err(send_err) = self.bot.reply_to(message, fallback).await {
                    error!(error = %send_err, "Failed to send fallback message");
                }
            }
        }

        Ok(())
    }

    /// Filter step: the question text when the event warrants a reply, else None.
    /// Direct chats are accepted unconditionally; group events need a mention
    /// or a reply to one of the bot's messages.
    fn eligible_question(&self, message: &Message) -> Option<String> {
        let text = message.content.trim();
        if text.is_empty() {
            return None;
        }
        if message.chat.is_direct() {
            return Some(text.to_string());
        }
        mention::get_question(
            message,
            &self.bot_username,
            Some(mention::DEFAULT_EMPTY_MENTION_PROMPT),
        )
    }

    /// Prompt assembly. Summarize trigger takes precedence over the detailed
    /// suffix because summarization replaces the running context entirely.
    fn build_prompt(
        &self,
        message: &Message,
        question: &str,
        key: HistoryKey,
    ) -> Vec<ChatMessage> {
        if let Some(quoted) = self.summarize_target(message, question) {
            return vec![
                ChatMessage::system(SUMMARIZE_INSTRUCTION),
                ChatMessage::user(format!(
                    "Quoted message:\n{}\n\nRequest: {}",
                    quoted, question
                )),
            ];
        }

        let system = if is_detailed_request(question) {
            &self.detailed_system_prompt
        } else {
            &self.system_prompt
        };

        let mut messages = vec![ChatMessage::system(system)];
        for turn in self.history.snapshot(key) {
            messages.push(turn.to_chat_message());
        }
        messages.push(ChatMessage::user(question));
        messages
    }

    /// Quoted text to summarize, when the event replies to a message and the
    /// question contains the summarize keyword.
    fn summarize_target(&self, message: &Message, question: &str) -> Option<String> {
        if message.reply_to_message_id.is_none() {
            return None;
        }
        let quoted = message.reply_to_message_content.as_deref()?;
        question
            .to_lowercase()
            .contains(&self.summarize_keyword)
            .then(|| quoted.to_string())
    }
}
