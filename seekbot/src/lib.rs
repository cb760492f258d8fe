//! # seekbot
//!
//! Telegram bot that relays user messages to an OpenRouter-hosted DeepSeek
//! model and replies in-thread. The interesting part is the coordination
//! layer: per-user rate limiting ([`RateLimiter`]), bounded per-user history
//! ([`HistoryStore`]), multi-key failover (`seekbot-upstream`), and the
//! [`Router`] that drives one inbound event from filter to reply.

pub mod cli;
pub mod config;
pub mod history;
pub mod mention;
pub mod rate_limit;
pub mod router;
pub mod runner;

pub use cli::{load_config, Cli, Commands};
pub use config::BotConfig;
pub use history::{HistoryKey, HistoryStore, Turn};
pub use rate_limit::RateLimiter;
pub use router::Router;
pub use runner::run_bot;
