//! Bounded per-user conversation history for prompt context.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, RwLock};

use seekbot_upstream::{ChatMessage, MessageRole};

/// History is scoped per chat, so the same user carries separate context in
/// each group (and in their DM with the bot).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HistoryKey {
    pub chat_id: i64,
    pub user_id: i64,
}

/// One stored turn: a user message or an assistant reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    pub role: MessageRole,
    pub text: String,
}

impl Turn {
    /// Converts the stored turn into an upstream chat message.
    pub fn to_chat_message(&self) -> ChatMessage {
        ChatMessage {
            role: self.role,
            content: self.text.clone(),
        }
    }
}

/// Per-user bounded FIFO of recent turns. The outer map lock is held only to
/// fetch or insert the per-user entry; appends serialize on the per-user
/// mutex, so different users' exchanges never contend.
pub struct HistoryStore {
    depth: usize,
    users: RwLock<HashMap<HistoryKey, Arc<Mutex<VecDeque<Turn>>>>>,
}

impl HistoryStore {
    /// Creates a store keeping at most `depth` turns per user.
    pub fn new(depth: usize) -> Self {
        Self {
            depth,
            users: RwLock::new(HashMap::new()),
        }
    }

    fn entry(&self, key: HistoryKey) -> Arc<Mutex<VecDeque<Turn>>> {
        if let Some(entry) = self.users.read().expect("history lock poisoned").get(&key) {
            return entry.clone();
        }
        self.users
            .write()
            .expect("history lock poisoned")
            .entry(key)
            .or_insert_with(|| Arc::new(Mutex::new(VecDeque::new())))
            .clone()
    }

    /// Pushes one turn, evicting the oldest when the store is at depth.
    pub fn append(&self, key: HistoryKey, role: MessageRole, text: impl Into<String>) {
        let entry = self.entry(key);
        let mut turns = entry.lock().expect("history entry lock poisoned");
        Self::push_bounded(&mut turns, self.depth, Turn {
            role,
            text: text.into(),
        });
    }

    /// Appends the user message and the assistant reply as one atomic unit, so
    /// a concurrent exchange for the same user cannot interleave between them.
    pub fn append_exchange(&self, key: HistoryKey, question: &str, reply: &str) {
        let entry = self.entry(key);
        let mut turns = entry.lock().expect("history entry lock poisoned");
        Self::push_bounded(&mut turns, self.depth, Turn {
            role: MessageRole::User,
            text: question.to_string(),
        });
        Self::push_bounded(&mut turns, self.depth, Turn {
            role: MessageRole::Assistant,
            text: reply.to_string(),
        });
    }

    /// Current context for prompt assembly, oldest first. Non-mutating.
    pub fn snapshot(&self, key: HistoryKey) -> Vec<Turn> {
        let users = self.users.read().expect("history lock poisoned");
        match users.get(&key) {
            Some(entry) => entry
                .lock()
                .expect("history entry lock poisoned")
                .iter()
                .cloned()
                .collect(),
            None => Vec::new(),
        }
    }

    fn push_bounded(turns: &mut VecDeque<Turn>, depth: usize, turn: Turn) {
        // A zero-depth store keeps nothing; without this guard the eviction
        // loop below never terminates on an empty deque.
        if depth == 0 {
            return;
        }
        while turns.len() >= depth {
            turns.pop_front();
        }
        turns.push_back(turn);
    }
}
