//! Output rendering for chat streaming and transcripts.
//!
//! This module provides the renderer trait used by the session while a reply
//! streams in, a plain-text implementation with optional ANSI styling, and
//! the transcript projection that turns an ordered message list into labeled,
//! markup-rendered blocks.

use std::io::{self, Stdout, Write};

use crate::markdown;
use crate::types::Message;

/// ANSI escape code for bold text (used for role labels).
const ANSI_BOLD: &str = "\x1b[1m";

/// ANSI escape code to reset all styling.
const ANSI_RESET: &str = "\x1b[0m";

/// ANSI escape code for red text (used for errors).
const ANSI_RED: &str = "\x1b[31m";

/// Trait for rendering chat output.
///
/// This abstraction allows for different rendering strategies:
/// - Plain text with ANSI styling
/// - Plain text without styling (for piping/redirecting)
/// - Buffered rendering for tests
pub trait Renderer: Send {
    /// Called when a reply begins, before any deltas arrive.
    fn begin_reply(&mut self);

    /// Print a chunk of reply text.
    ///
    /// This is called incrementally as deltas are streamed from the endpoint.
    fn print_text(&mut self, text: &str);

    /// Print an error message.
    fn print_error(&mut self, error: &str);

    /// Print an informational message.
    fn print_info(&mut self, info: &str);

    /// Called when a reply is complete.
    ///
    /// Used to ensure proper newlines and cleanup after streaming.
    fn finish_response(&mut self);

    /// Called when the stream is interrupted by the user.
    fn print_interrupted(&mut self);
}

/// Plain text renderer with optional ANSI styling.
///
/// This renderer outputs deltas directly to stdout as they arrive, flushing
/// after each chunk so tokens appear immediately.
pub struct PlainTextRenderer {
    stdout: Stdout,
    use_color: bool,
}

impl PlainTextRenderer {
    /// Creates a new PlainTextRenderer with ANSI colors enabled.
    pub fn new() -> Self {
        Self {
            stdout: io::stdout(),
            use_color: true,
        }
    }

    /// Creates a new PlainTextRenderer with specified color setting.
    pub fn with_color(use_color: bool) -> Self {
        Self {
            stdout: io::stdout(),
            use_color,
        }
    }

    /// Flushes stdout to ensure immediate display of streamed content.
    fn flush(&mut self) {
        let _ = self.stdout.flush();
    }
}

impl Default for PlainTextRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer for PlainTextRenderer {
    fn begin_reply(&mut self) {
        if self.use_color {
            println!("{ANSI_BOLD}AI:{ANSI_RESET}");
        } else {
            println!("AI:");
        }
        self.flush();
    }

    fn print_text(&mut self, text: &str) {
        print!("{text}");
        self.flush();
    }

    fn print_error(&mut self, error: &str) {
        if self.use_color {
            eprintln!("\n{ANSI_RED}Error:{ANSI_RESET} {error}");
        } else {
            eprintln!("\nError: {error}");
        }
    }

    fn print_info(&mut self, info: &str) {
        println!("{info}");
    }

    fn finish_response(&mut self) {
        println!();
        self.flush();
    }

    fn print_interrupted(&mut self) {
        println!("\n[interrupted]");
        self.flush();
    }
}

/// Renderer that captures output in memory.
///
/// Useful for tests and for callers that post-process the reply.
#[derive(Default)]
pub struct BufferedRenderer {
    /// The concatenated reply text.
    pub text: String,
    /// Errors printed during the turn.
    pub errors: Vec<String>,
    /// Info lines printed during the turn.
    pub infos: Vec<String>,
    /// Whether the turn ended in an interruption.
    pub interrupted: bool,
}

impl BufferedRenderer {
    /// Creates an empty buffered renderer.
    pub fn new() -> Self {
        Self::default()
    }
}

impl Renderer for BufferedRenderer {
    fn begin_reply(&mut self) {}

    fn print_text(&mut self, text: &str) {
        self.text.push_str(text);
    }

    fn print_error(&mut self, error: &str) {
        self.errors.push(error.to_string());
    }

    fn print_info(&mut self, info: &str) {
        self.infos.push(info.to_string());
    }

    fn finish_response(&mut self) {}

    fn print_interrupted(&mut self) {
        self.interrupted = true;
    }
}

/// Project an ordered message list into a printable transcript.
///
/// Each message becomes one block labeled by role, with its body passed
/// through the markup transform. Messages with empty bodies are skipped.
/// The projection is pure: rendering the same list twice yields identical
/// output.
pub fn transcript_to_string(messages: &[Message], use_color: bool) -> String {
    let mut out = String::new();
    for message in messages {
        let body = markdown::render(&message.content, use_color);
        if body.is_empty() {
            continue;
        }
        if !out.is_empty() {
            out.push('\n');
        }
        if use_color {
            out.push_str(ANSI_BOLD);
            out.push_str(message.role.label());
            out.push_str(ANSI_RESET);
        } else {
            out.push_str(message.role.label());
        }
        out.push('\n');
        out.push_str(&body);
    }
    out
}
