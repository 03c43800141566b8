//! Slash command parsing for the chat application.
//!
//! This module handles parsing of special commands that start with `/`,
//! allowing users to control the chat session without sending messages
//! to the endpoint.

/// A parsed chat command.
///
/// These commands control the chat session and are not sent to the endpoint.
#[derive(Debug, Clone, PartialEq)]
pub enum ChatCommand {
    /// Clear the conversation history.
    Clear,

    /// Resubmit the conversation after a failed turn, without re-typing.
    Retry,

    /// Render the full transcript with markup formatting.
    History,

    /// Set whether failed submissions retain the optimistic message.
    Keep(bool),

    /// Change the chat endpoint URL.
    Endpoint(String),

    /// Display help information.
    Help,

    /// Exit the chat application.
    Quit,

    /// Display session statistics (message count, current endpoint, etc.).
    Stats,

    /// Show the current configuration.
    ShowConfig,

    /// Report a parsing error back to the caller.
    Invalid(String),
}

/// Parses user input for slash commands.
///
/// Returns `Some(ChatCommand)` if the input is a valid command,
/// or `None` if it should be treated as a regular message.
///
/// # Examples
///
/// ```
/// # use chatline::chat::parse_command;
/// assert!(parse_command("/quit").is_some());
/// assert!(parse_command("/endpoint http://localhost:8000/chat").is_some());
/// assert!(parse_command("Hello!").is_none());
/// ```
pub fn parse_command(input: &str) -> Option<ChatCommand> {
    let input = input.trim();

    if !input.starts_with('/') {
        return None;
    }

    let mut parts = input[1..].splitn(2, ' ');
    let command = parts.next()?.to_lowercase();
    let argument = parts.next().map(|s| s.trim()).filter(|s| !s.is_empty());

    let result = match command.as_str() {
        "clear" => ChatCommand::Clear,
        "retry" => ChatCommand::Retry,
        "history" => ChatCommand::History,
        "keep" => match argument.and_then(parse_on_off) {
            Some(value) => ChatCommand::Keep(value),
            None => ChatCommand::Invalid("/keep expects 'on' or 'off'".to_string()),
        },
        "endpoint" => match argument {
            Some(url) => ChatCommand::Endpoint(url.to_string()),
            None => ChatCommand::Invalid("/endpoint requires a URL".to_string()),
        },
        "help" | "?" => ChatCommand::Help,
        "quit" | "exit" | "q" => ChatCommand::Quit,
        "stats" | "status" => ChatCommand::Stats,
        "config" => ChatCommand::ShowConfig,
        _ => ChatCommand::Invalid(format!("Unknown command: /{}", command)),
    };

    Some(result)
}

fn parse_on_off(value: &str) -> Option<bool> {
    match value.to_lowercase().as_str() {
        "on" | "true" | "yes" => Some(true),
        "off" | "false" | "no" => Some(false),
        _ => None,
    }
}

/// Returns help text describing available commands.
pub fn help_text() -> &'static str {
    r#"Available commands:
  /clear                 Clear conversation history
  /retry                 Resubmit the conversation after an error
  /history               Show the formatted transcript
  /keep on|off           Keep or discard the optimistic message on error
  /endpoint <url>        Change the chat endpoint URL
  /stats                 Show session statistics
  /config                Show current configuration
  /help                  Show this help message
  /quit                  Exit the chat"#
}
