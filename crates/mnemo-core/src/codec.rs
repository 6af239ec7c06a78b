//! Persisted conversation record format.
//!
//! Each message is stored independently as a compact tagged record
//! `{"type":"user|assistant|system|unknown","content":"<escaped>"}`.
//! `escape` and `unescape` are exact inverses; the escaped set (backslash,
//! quote, newline, carriage return, tab) is what the record format
//! requires, so a structured JSON parse of an encoded record recovers the
//! original content.

use crate::types::{Message, Role};
use serde::Deserialize;

/// Escape record-format special characters.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            other => out.push(other),
        }
    }
    out
}

/// Invert `escape`.
///
/// A single left-to-right pass, so escaped backslashes never re-combine
/// with following characters. Unrecognized escapes pass through verbatim.
pub fn unescape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('\\') => out.push('\\'),
            Some('"') => out.push('"'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('t') => out.push('\t'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

/// Encode a message as a persisted record line.
pub(crate) fn encode_message(message: &Message) -> String {
    format!(
        r#"{{"type":"{}","content":"{}"}}"#,
        message.role.as_str(),
        escape(&message.content)
    )
}

#[derive(Debug, Deserialize)]
struct PersistedMessage {
    #[serde(rename = "type")]
    tag: String,
    content: String,
}

/// Decode a persisted record line.
///
/// Structurally invalid records and unrecognized role tags (including the
/// reserved `"unknown"`) are dropped, not errors.
pub(crate) fn decode_message(line: &str) -> Option<Message> {
    let record: PersistedMessage = serde_json::from_str(line).ok()?;
    let role = Role::parse(&record.tag)?;
    Some(Message {
        role,
        content: record.content,
    })
}
