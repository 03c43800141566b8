//! Configuration types for the chat application.
//!
//! This module provides CLI argument parsing via `arrrg` and configuration
//! structures for controlling chat behavior.

use std::time::Duration;

use arrrg_derive::CommandLine;

/// Default request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Command-line arguments for the chatline tool.
#[derive(CommandLine, Debug, Default, PartialEq, Eq)]
pub struct ChatArgs {
    /// Chat endpoint URL.
    #[arrrg(
        optional,
        "Chat endpoint URL (default: $CHATLINE_CHAT_URL or http://localhost:8000/chat)",
        "URL"
    )]
    pub url: Option<String>,

    /// Disable ANSI colors and styles.
    #[arrrg(flag, "Disable ANSI colors/styles")]
    pub no_color: bool,

    /// Roll back failed submissions instead of keeping them.
    #[arrrg(flag, "Discard the optimistic user message when a submission fails")]
    pub discard_on_error: bool,

    /// Request buffered replies instead of streaming.
    #[arrrg(flag, "Request buffered (non-streaming) replies")]
    pub no_stream: bool,

    /// Request timeout in seconds.
    #[arrrg(optional, "Request timeout in seconds (default: 60)", "SECONDS")]
    pub timeout: Option<u64>,
}

/// Configuration for a chat session.
///
/// This struct holds the resolved configuration values after processing
/// command-line arguments with appropriate defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatConfig {
    /// Explicit endpoint URL; `None` falls back to the environment and then
    /// the local development default.
    pub endpoint_url: Option<String>,

    /// Whether a failed submission retains the optimistic user message (and
    /// any partial assistant message) or rolls the turn back.
    pub keep_last_message_on_error: bool,

    /// Whether to use ANSI colors and styles in output.
    pub use_color: bool,

    /// Whether to consume replies as a stream of deltas.
    pub streaming: bool,

    /// Request timeout for the endpoint client.
    pub request_timeout: Duration,
}

impl ChatConfig {
    /// Creates a new ChatConfig with default values.
    ///
    /// Defaults:
    /// - Endpoint: from the environment, else localhost
    /// - Keep last message on error: enabled
    /// - Color: enabled
    /// - Streaming: enabled
    pub fn new() -> Self {
        Self {
            endpoint_url: None,
            keep_last_message_on_error: true,
            use_color: true,
            streaming: true,
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    /// Sets the endpoint URL.
    pub fn with_endpoint_url(mut self, url: String) -> Self {
        self.endpoint_url = Some(url);
        self
    }

    /// Sets whether failed submissions retain the optimistic message.
    pub fn with_keep_last_message_on_error(mut self, keep: bool) -> Self {
        self.keep_last_message_on_error = keep;
        self
    }

    /// Disables ANSI color output.
    pub fn without_color(mut self) -> Self {
        self.use_color = false;
        self
    }

    /// Disables streaming; replies arrive as a single buffered body.
    pub fn without_streaming(mut self) -> Self {
        self.streaming = false;
        self
    }

    /// Sets the request timeout.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl From<ChatArgs> for ChatConfig {
    fn from(args: ChatArgs) -> Self {
        Self {
            endpoint_url: args.url,
            keep_last_message_on_error: !args.discard_on_error,
            use_color: !args.no_color,
            streaming: !args.no_stream,
            request_timeout: Duration::from_secs(args.timeout.unwrap_or(DEFAULT_TIMEOUT_SECS)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_hook_behavior() {
        let config = ChatConfig::default();
        assert!(config.keep_last_message_on_error);
        assert!(config.use_color);
        assert!(config.streaming);
        assert_eq!(config.endpoint_url, None);
    }

    #[test]
    fn args_invert_into_config() {
        let args = ChatArgs {
            url: Some("http://example.com/chat".to_string()),
            no_color: true,
            discard_on_error: true,
            no_stream: true,
            timeout: Some(5),
        };
        let config = ChatConfig::from(args);
        assert_eq!(
            config.endpoint_url.as_deref(),
            Some("http://example.com/chat")
        );
        assert!(!config.keep_last_message_on_error);
        assert!(!config.use_color);
        assert!(!config.streaming);
        assert_eq!(config.request_timeout, Duration::from_secs(5));
    }
}
