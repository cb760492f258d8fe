//! Pure functions for @-mention detection and question extraction.
//!
//! Matching is case-insensitive because Telegram handles are; handles are
//! ASCII (`[A-Za-z0-9_]`), so ASCII-case comparison is enough and the
//! surrounding message text is never case-folded.

/// Returns true if `text` contains a @mention of the given bot username.
pub fn is_bot_mentioned(text: &str, bot_username: &str) -> bool {
    find_mention(&chars_of(text), bot_username).is_some()
}

/// Strips every @mention of the bot from `text` and returns the remaining
/// question with whitespace collapsed.
pub fn extract_question(text: &str, bot_username: &str) -> String {
    let chars = chars_of(text);
    let mut out = String::with_capacity(text.len());
    let mut i = 0;
    while i < chars.len() {
        if let Some(len) = mention_at(&chars, i, bot_username) {
            i += len;
        } else {
            out.push(chars[i]);
            i += 1;
        }
    }
    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Default prompt when the user only @mentions the bot with no text.
pub const DEFAULT_EMPTY_MENTION_PROMPT: &str =
    "The user only @mentioned you with no specific question. Please greet them briefly and invite them to ask.";

/// Resolves the user question if the message triggers a reply (reply-to-bot or @mention).
///
/// - **Reply-to-bot**: returns `Some(message.content)`.
/// - **@mention with non-empty text**: returns the stripped question.
/// - **@mention with empty text**: falls back to `empty_mention_default` when given.
/// - Otherwise returns `None`.
pub fn get_question(
    message: &seekbot_core::Message,
    bot_username: &str,
    empty_mention_default: Option<&str>,
) -> Option<String> {
    if message.reply_to_message_id.is_some() && message.reply_to_message_from_bot {
        return Some(message.content.clone());
    }
    if is_bot_mentioned(&message.content, bot_username) {
        let q = extract_question(&message.content, bot_username);
        if !q.is_empty() {
            return Some(q);
        }
        if let Some(default) = empty_mention_default {
            return Some(default.to_string());
        }
    }
    None
}

fn chars_of(text: &str) -> Vec<char> {
    text.chars().collect()
}

/// Length in chars of a `@username` mention starting at `i`, if present.
fn mention_at(chars: &[char], i: usize, bot_username: &str) -> Option<usize> {
    let needle: Vec<char> = std::iter::once('@').chain(bot_username.chars()).collect();
    if i + needle.len() > chars.len() {
        return None;
    }
    let matches = chars[i..i + needle.len()]
        .iter()
        .zip(&needle)
        .all(|(a, b)| a.eq_ignore_ascii_case(b));
    matches.then_some(needle.len())
}

fn find_mention(chars: &[char], bot_username: &str) -> Option<usize> {
    (0..chars.len()).find(|&i| mention_at(chars, i, bot_username).is_some())
}
