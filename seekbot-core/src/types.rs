//! Core types: user, chat, message, and conversion traits.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// User identity (id, username, names).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

/// Kind of chat a message arrived in. The router responds unconditionally in
/// direct chats and only to mentions / replies-to-bot in groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChatKind {
    Direct,
    Group,
}

/// Chat (group or one-to-one) identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chat {
    pub id: i64,
    pub kind: ChatKind,
}

impl Chat {
    /// True for one-to-one conversations.
    pub fn is_direct(&self) -> bool {
        self.kind == ChatKind::Direct
    }
}

/// A single inbound message with user, chat, content, and optional reply context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub user: User,
    pub chat: Chat,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub reply_to_message_id: Option<String>,
    /// Whether the replied-to message was sent by a bot; only meaningful when
    /// `reply_to_message_id` is set; used to decide if the router should respond.
    pub reply_to_message_from_bot: bool,
    /// Content of the replied-to message; used by the summarize trigger.
    pub reply_to_message_content: Option<String>,
}

/// Converts a transport-specific user type to core [`User`].
pub trait ToCoreUser: Send + Sync {
    fn to_core(&self) -> User;
}

/// Converts a transport-specific message type to core [`Message`].
pub trait ToCoreMessage: Send + Sync {
    fn to_core(&self) -> Message;
}
