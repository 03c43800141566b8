use serde::{Deserialize, Serialize};

/// A buffered (non-streaming) reply body from the chat endpoint.
///
/// The endpoint returns either a bare JSON string or an object carrying the
/// reply under a `content` key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChatReply {
    /// A bare JSON string reply.
    Text(String),

    /// An object reply with the content under a `content` key.
    Structured {
        /// The reply text.
        content: String,
    },
}

impl ChatReply {
    /// Consumes the reply, returning the assistant content.
    pub fn into_content(self) -> String {
        match self {
            ChatReply::Text(content) => content,
            ChatReply::Structured { content } => content,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_bare_string() {
        let reply: ChatReply = serde_json::from_str("\"Hi there\"").unwrap();
        assert_eq!(reply.into_content(), "Hi there");
    }

    #[test]
    fn accepts_content_object() {
        let reply: ChatReply = serde_json::from_str("{\"content\":\"Hi there\"}").unwrap();
        assert_eq!(reply.into_content(), "Hi there");
    }
}
