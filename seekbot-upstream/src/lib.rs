//! # seekbot-upstream
//!
//! Upstream chat-completion layer: [`ChatMessage`] wire types, [`KeyPool`]
//! credential rotation, the object-safe [`CompletionClient`] trait, and the
//! [`OpenRouterClient`] implementation with timeout, retry, and key failover.

mod client;
mod error;
mod key_pool;
mod message;

pub use client::{CompletionClient, OpenRouterClient};
pub use error::UpstreamError;
pub use key_pool::KeyPool;
pub use message::{ChatMessage, MessageRole};
