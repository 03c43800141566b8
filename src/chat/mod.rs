//! Interactive chat sessions against a streaming chat endpoint.
//!
//! This module provides the session controller, its configuration, and the
//! slash commands understood by the interactive binary.

mod commands;
mod config;
mod session;

// Re-exports
pub use crate::render::{BufferedRenderer, PlainTextRenderer, Renderer};
pub use commands::{ChatCommand, help_text, parse_command};
pub use config::{ChatArgs, ChatConfig};
pub use session::{ChatSession, SessionStats};
