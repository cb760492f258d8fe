//! Bot configuration loaded from environment variables (`.env` supported via
//! dotenvy at the binary entry). Required values missing at load time are the
//! only fatal startup errors.

use anyhow::Result;
use seekbot_core::SeekbotError;
use std::env;

/// Default persona prompt, sent as the system message on every exchange.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are MrxSeek, an intelligent and helpful AI assistant. \
You provide accurate, concise, and contextually relevant responses. You can help with programming, \
general knowledge, problem-solving, and creative tasks. Use the provided conversation context to \
give more personalized and relevant responses. Keep responses conversational and engaging while \
being informative.";

/// System prompt used when the user asks for a detailed answer (message ends
/// with the ellipsis suffix).
pub const DEFAULT_DETAILED_SYSTEM_PROMPT: &str = "You are MrxSeek, an intelligent and helpful AI \
assistant. The user has asked for a detailed answer: respond thoroughly, covering background, \
reasoning, and relevant examples. Structure the answer clearly and do not omit important caveats.";

/// Bot configuration, loaded from environment variables.
#[derive(Debug, Clone)]
pub struct BotConfig {
    pub bot_token: String,
    /// Bot handle without `@`, lowercase. When None it is resolved via
    /// `get_me()` at startup.
    pub bot_username: Option<String>,
    /// Upstream credentials, in rotation order. Never empty after `load`.
    pub api_keys: Vec<String>,
    pub openrouter_base_url: String,
    pub model: String,
    pub rate_limit_seconds: u64,
    /// Max turns kept per user (one exchange is two turns).
    pub history_depth: usize,
    /// Global cap on concurrently processed requests across all users.
    pub max_concurrent_requests: usize,
    pub api_timeout_secs: u64,
    pub system_prompt: String,
    pub detailed_system_prompt: String,
    pub summarize_keyword: String,
    pub log_file: String,
}

/// Normalizes a bot handle: strips `@`, lowercases.
pub fn normalize_username(raw: &str) -> String {
    raw.trim().trim_start_matches('@').to_lowercase()
}

impl BotConfig {
    /// Loads config from environment. If `token` is provided it overrides BOT_TOKEN.
    pub fn load(token: Option<String>) -> Result<Self> {
        let bot_token = match token {
            Some(t) => t,
            None => env::var("BOT_TOKEN")
                .map_err(|_| SeekbotError::Config("BOT_TOKEN not set".to_string()))?,
        };

        let keys_raw = env::var("API_KEYS")
            .or_else(|_| env::var("API_KEY"))
            .map_err(|_| SeekbotError::Config("API_KEYS (or API_KEY) not set".to_string()))?;
        let api_keys: Vec<String> = keys_raw
            .split(',')
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .collect();
        if api_keys.is_empty() {
            return Err(SeekbotError::Config(
                "API_KEYS is set but contains no usable keys".to_string(),
            )
            .into());
        }

        let bot_username = env::var("BOT_USERNAME")
            .ok()
            .map(|u| normalize_username(&u))
            .filter(|u| !u.is_empty());

        let openrouter_base_url = env::var("OPENROUTER_BASE_URL")
            .unwrap_or_else(|_| "https://openrouter.ai/api/v1".to_string());
        let model =
            env::var("MODEL").unwrap_or_else(|_| "deepseek/deepseek-r1-0528:free".to_string());
        let rate_limit_seconds = env::var("RATE_LIMIT_SECONDS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(3);
        let history_depth = env::var("HISTORY_DEPTH")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(4);
        if history_depth == 0 {
            return Err(
                SeekbotError::Config("HISTORY_DEPTH must be at least 1".to_string()).into(),
            );
        }
        let max_concurrent_requests = env::var("MAX_CONCURRENT_REQUESTS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(10);
        let api_timeout_secs = env::var("API_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(30);
        let system_prompt = env::var("SYSTEM_PROMPT")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.to_string());
        let detailed_system_prompt = env::var("DETAILED_SYSTEM_PROMPT")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_DETAILED_SYSTEM_PROMPT.to_string());
        let summarize_keyword = env::var("SUMMARIZE_KEYWORD")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .map(|s| s.to_lowercase())
            .unwrap_or_else(|| "summarize".to_string());
        let log_file = env::var("LOG_FILE").unwrap_or_else(|_| "logs/seekbot.log".to_string());

        Ok(Self {
            bot_token,
            bot_username,
            api_keys,
            openrouter_base_url,
            model,
            rate_limit_seconds,
            history_depth,
            max_concurrent_requests,
            api_timeout_secs,
            system_prompt,
            detailed_system_prompt,
            summarize_keyword,
            log_file,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn clear_env() {
        for var in [
            "BOT_TOKEN",
            "BOT_USERNAME",
            "API_KEYS",
            "API_KEY",
            "OPENROUTER_BASE_URL",
            "MODEL",
            "RATE_LIMIT_SECONDS",
            "HISTORY_DEPTH",
            "MAX_CONCURRENT_REQUESTS",
            "API_TIMEOUT_SECS",
            "SYSTEM_PROMPT",
            "DETAILED_SYSTEM_PROMPT",
            "SUMMARIZE_KEYWORD",
            "LOG_FILE",
        ] {
            env::remove_var(var);
        }
    }

    #[test]
    fn test_normalize_username() {
        assert_eq!(normalize_username("@MrxSeekBot"), "mrxseekbot");
        assert_eq!(normalize_username(" mrxseekbot "), "mrxseekbot");
    }

    /// **Test: defaults apply when only the required vars are set; API_KEYS splits on commas.**
    #[test]
    #[serial]
    fn test_load_defaults() {
        clear_env();
        env::set_var("BOT_TOKEN", "token");
        env::set_var("API_KEYS", "k1, k2 ,k3");

        let config = BotConfig::load(None).unwrap();
        assert_eq!(config.api_keys, vec!["k1", "k2", "k3"]);
        assert_eq!(config.rate_limit_seconds, 3);
        assert_eq!(config.history_depth, 4);
        assert_eq!(config.max_concurrent_requests, 10);
        assert_eq!(config.api_timeout_secs, 30);
        assert_eq!(config.model, "deepseek/deepseek-r1-0528:free");
        assert_eq!(config.summarize_keyword, "summarize");
        assert!(config.bot_username.is_none());

        clear_env();
    }

    /// **Test: missing API keys is a Config-class fatal load error; API_KEY works as fallback.**
    #[test]
    #[serial]
    fn test_load_requires_keys() {
        clear_env();
        env::set_var("BOT_TOKEN", "token");
        let err = BotConfig::load(None).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<SeekbotError>(),
            Some(SeekbotError::Config(_))
        ));

        env::set_var("API_KEY", "solo");
        let config = BotConfig::load(None).unwrap();
        assert_eq!(config.api_keys, vec!["solo"]);

        clear_env();
    }

    /// **Test: HISTORY_DEPTH=0 is rejected at load time as a Config error.**
    #[test]
    #[serial]
    fn test_load_rejects_zero_history_depth() {
        clear_env();
        env::set_var("BOT_TOKEN", "token");
        env::set_var("API_KEYS", "k");
        env::set_var("HISTORY_DEPTH", "0");

        let err = BotConfig::load(None).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<SeekbotError>(),
            Some(SeekbotError::Config(_))
        ));

        clear_env();
    }

    /// **Test: explicit token overrides BOT_TOKEN; BOT_USERNAME is normalized.**
    #[test]
    #[serial]
    fn test_load_token_override_and_username() {
        clear_env();
        env::set_var("BOT_TOKEN", "env_token");
        env::set_var("API_KEYS", "k");
        env::set_var("BOT_USERNAME", "@MrxSeekBot");

        let config = BotConfig::load(Some("cli_token".to_string())).unwrap();
        assert_eq!(config.bot_token, "cli_token");
        assert_eq!(config.bot_username.as_deref(), Some("mrxseekbot"));

        clear_env();
    }
}
