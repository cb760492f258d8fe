//! # seekbot-core
//!
//! Core types and traits for the bot: [`Bot`], message and user types, error
//! taxonomy, and tracing initialization. Transport-agnostic except for the
//! teloxide adapters, which map Telegram updates onto the core types.

pub mod adapters;
pub mod bot;
pub mod error;
pub mod logger;
pub mod types;

pub use adapters::{TelegramMessageWrapper, TelegramUserWrapper};
pub use bot::{Bot, TelegramBot};
pub use error::{Result, SeekbotError};
pub use logger::init_tracing;
pub use types::{Chat, ChatKind, Message, ToCoreMessage, ToCoreUser, User};
