use serde::{Deserialize, Serialize};

use crate::types::{Message, MessageRole};

/// A role/content pair as sent to the chat endpoint.
///
/// The wire encoding carries no ids; those exist only in session state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageParam {
    /// The role of the message.
    pub role: MessageRole,

    /// The text body.
    pub content: String,
}

impl MessageParam {
    /// Create a new `MessageParam` with the given role and content.
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

impl From<&Message> for MessageParam {
    fn from(message: &Message) -> Self {
        Self::new(message.role, message.content.clone())
    }
}

/// The request body for a chat turn: the conversation history in order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest {
    /// The ordered conversation history.
    pub messages: Vec<MessageParam>,
}

impl ChatRequest {
    /// Create a request carrying the given history.
    pub fn new(messages: Vec<MessageParam>) -> Self {
        Self { messages }
    }
}

impl From<&[Message]> for ChatRequest {
    fn from(messages: &[Message]) -> Self {
        Self::new(messages.iter().map(MessageParam::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_preserves_order_and_drops_ids() {
        let history = vec![Message::user("Hello"), Message::assistant("Hi there")];
        let request = ChatRequest::from(history.as_slice());
        let json = serde_json::to_string(&request).unwrap();
        assert_eq!(
            json,
            "{\"messages\":[{\"role\":\"user\",\"content\":\"Hello\"},\
             {\"role\":\"assistant\",\"content\":\"Hi there\"}]}"
        );
    }
}
