//! OpenRouter chat-completion client with timeout, retry, and key failover.
//!
//! Failure policy for one logical request: timeout/network errors get one
//! immediate retry with the same key, then the pool rotates; auth/quota
//! errors rotate immediately; a malformed response body is terminal. After
//! all `pool.len()` distinct keys fail, the request surfaces as
//! [`UpstreamError::Exhausted`].

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::error::UpstreamError;
use crate::key_pool::KeyPool;
use crate::message::ChatMessage;

/// Completion client interface: one logical chat-completion request from a
/// list of messages. Object-safe so the router can hold `Arc<dyn CompletionClient>`
/// and tests can substitute a mock.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Returns the model reply text for the given messages (system/user/assistant).
    async fn complete(&self, messages: Vec<ChatMessage>) -> Result<String, UpstreamError>;
}

const DEFAULT_BASE_URL: &str = "https://openrouter.ai/api/v1";
const DEFAULT_MODEL: &str = "deepseek/deepseek-r1-0528:free";
const DEFAULT_MAX_TOKENS: u32 = 2048;
const DEFAULT_TEMPERATURE: f32 = 0.7;

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    max_tokens: u32,
    temperature: f32,
}

#[derive(Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: String,
}

/// reqwest-based [`CompletionClient`] against the OpenRouter API, drawing
/// credentials from a shared [`KeyPool`].
pub struct OpenRouterClient {
    http: reqwest::Client,
    keys: Arc<KeyPool>,
    base_url: String,
    model: String,
    max_tokens: u32,
    temperature: f32,
}

impl OpenRouterClient {
    /// Creates a client over the given key pool with a per-request timeout.
    pub fn new(keys: Arc<KeyPool>, timeout: Duration) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            keys,
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
        })
    }

    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }

    pub fn with_model(mut self, model: String) -> Self {
        self.model = model;
        self
    }

    /// One HTTP attempt with one key. Maps transport and status failures onto
    /// [`UpstreamError`] classes; a 200 with an unexpected body is `MalformedResponse`.
    async fn request_once(
        &self,
        api_key: &str,
        messages: &[ChatMessage],
    ) -> Result<String, UpstreamError> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = CompletionRequest {
            model: &self.model,
            messages,
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        };

        let response = self
            .http
            .post(&url)
            .bearer_auth(api_key)
            .header("HTTP-Referer", "http://localhost")
            .header("X-Title", "seekbot")
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    UpstreamError::Timeout
                } else {
                    UpstreamError::Network(e.to_string())
                }
            })?;

        let status = response.status();
        match status {
            StatusCode::OK => {
                let parsed: CompletionResponse = response
                    .json()
                    .await
                    .map_err(|e| UpstreamError::MalformedResponse(e.to_string()))?;
                parsed
                    .choices
                    .into_iter()
                    .next()
                    .map(|c| c.message.content)
                    .ok_or_else(|| {
                        UpstreamError::MalformedResponse("empty choices array".to_string())
                    })
            }
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                Err(UpstreamError::Auth(status.as_u16()))
            }
            StatusCode::TOO_MANY_REQUESTS => Err(UpstreamError::Quota(status.as_u16())),
            _ => {
                let text = response.text().await.unwrap_or_default();
                Err(UpstreamError::Network(format!(
                    "status {}: {}",
                    status, text
                )))
            }
        }
    }
}

#[async_trait]
impl CompletionClient for OpenRouterClient {
    #[instrument(skip(self, messages), fields(message_count = messages.len()))]
    async fn complete(&self, messages: Vec<ChatMessage>) -> Result<String, UpstreamError> {
        let mut keys_tried = 0;

        while keys_tried < self.keys.len() {
            let api_key = self.keys.current().to_string();
            debug!(key_index = keys_tried, "Upstream attempt");

            let err = match self.request_once(&api_key, &messages).await {
                Ok(text) => return Ok(text),
                Err(e) => e,
            };

            if err.is_retryable() {
                warn!(error = %err, "Retryable upstream error, retrying with same key");
                match self.request_once(&api_key, &messages).await {
                    Ok(text) => return Ok(text),
                    Err(e) if e.is_retryable() || e.is_credential_failure() => {
                        warn!(error = %e, "Retry failed, rotating key");
                        self.keys.rotate();
                        keys_tried += 1;
                    }
                    Err(e) => return Err(e),
                }
            } else if err.is_credential_failure() {
                warn!(error = %err, "Credential failure, rotating key");
                self.keys.rotate();
                keys_tried += 1;
            } else {
                // MalformedResponse: terminal for this logical request.
                return Err(err);
            }
        }

        Err(UpstreamError::Exhausted)
    }
}
