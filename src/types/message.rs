use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A unique, client-generated identifier for a message.
///
/// Ids are generated locally (the endpoint does not assign them) and are
/// stable for the lifetime of the message.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(String);

impl MessageId {
    /// Generates a fresh unique id.
    pub fn generate() -> Self {
        MessageId(Uuid::new_v4().to_string())
    }

    /// Returns the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Role type for a message.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// User role.
    User,

    /// Assistant role.
    Assistant,
}

impl MessageRole {
    /// The label shown next to messages of this role in a transcript.
    pub fn label(&self) -> &'static str {
        match self {
            MessageRole::User => "User:",
            MessageRole::Assistant => "AI:",
        }
    }
}

/// A single message in a conversation.
///
/// The id and role are immutable once created; content only ever grows by
/// appending streamed deltas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// The unique identifier of the message.
    pub id: MessageId,

    /// The role of the message.
    pub role: MessageRole,

    /// The text body, possibly containing markup.
    pub content: String,
}

impl Message {
    /// Create a new message with a freshly generated id.
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            id: MessageId::generate(),
            role,
            content: content.into(),
        }
    }

    /// Create a new user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(MessageRole::User, content)
    }

    /// Create a new assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(MessageRole::Assistant, content)
    }

    /// Append a streamed content delta to this message.
    pub fn push_delta(&mut self, delta: &str) {
        self.content.push_str(delta);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_unique() {
        let a = Message::user("hello");
        let b = Message::user("hello");
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn deltas_append_in_order() {
        let mut msg = Message::assistant("");
        let id = msg.id.clone();
        msg.push_delta("Hi ");
        msg.push_delta("there");
        assert_eq!(msg.content, "Hi there");
        assert_eq!(msg.id, id);
    }

    #[test]
    fn role_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&MessageRole::Assistant).unwrap(),
            "\"assistant\""
        );
        assert_eq!(serde_json::to_string(&MessageRole::User).unwrap(), "\"user\"");
    }
}
