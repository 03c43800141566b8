//! Interactive chat application for conversing with a streaming chat endpoint.
//!
//! This binary provides a streaming REPL interface against a chat backend
//! speaking the newline-delimited data-stream protocol.
//!
//! # Usage
//!
//! ```bash
//! # Basic usage against http://localhost:8000/chat
//! chatline
//!
//! # Point at a different endpoint
//! chatline --url http://localhost:9000/chat
//!
//! # Disable colors (useful for piping output)
//! chatline --no-color
//!
//! # Buffer each reply instead of streaming it
//! chatline --no-stream
//! ```
//!
//! # Commands
//!
//! While chatting, you can use slash commands:
//! - `/help` - Show available commands
//! - `/clear` - Clear conversation history
//! - `/retry` - Resend the conversation after a failed turn
//! - `/history` - Print the rendered transcript
//! - `/keep <on|off>` - Keep or roll back failed turns
//! - `/endpoint <url>` - Change the chat endpoint
//! - `/stats` - Show session statistics
//! - `/quit` - Exit the application

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use arrrg::CommandLine;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;

use chatline::ChatEndpoint;
use chatline::chat::{
    ChatArgs, ChatCommand, ChatConfig, ChatSession, PlainTextRenderer, Renderer, help_text,
    parse_command,
};

/// Main entry point for the chatline application.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let (args, _) = ChatArgs::from_command_line_relaxed("chatline [OPTIONS]");
    let config = ChatConfig::from(args);
    let use_color = config.use_color;

    let client = ChatEndpoint::with_options(
        config.endpoint_url.clone(),
        Some(config.request_timeout),
    )?;
    let mut session = ChatSession::new(client, config);
    let mut renderer = PlainTextRenderer::with_color(use_color);
    let mut rl = DefaultEditor::new()?;

    // Flag for interrupt handling during streaming
    let interrupted = Arc::new(AtomicBool::new(false));

    // Set up Ctrl+C handler
    let interrupted_clone = interrupted.clone();
    ctrlc::set_handler(move || {
        interrupted_clone.store(true, Ordering::Relaxed);
    })?;

    println!("Chatline (endpoint: {})", session.stats().endpoint_url);
    println!("Type /help for commands, /quit to exit\n");

    loop {
        // Reset interrupt flag before each input
        interrupted.store(false, Ordering::Relaxed);

        let readline = rl.readline("You: ");

        match readline {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }

                let _ = rl.add_history_entry(line);

                // Check for slash commands
                if let Some(cmd) = parse_command(line) {
                    match cmd {
                        ChatCommand::Quit => {
                            println!("Goodbye!");
                            break;
                        }
                        ChatCommand::Clear => {
                            session.clear();
                            renderer.print_info("Conversation cleared.");
                        }
                        ChatCommand::Help => {
                            for line in help_text().lines() {
                                println!("    {}", line);
                            }
                        }
                        ChatCommand::Retry => {
                            if let Err(e) =
                                session.resubmit(&mut renderer, interrupted.clone()).await
                            {
                                renderer.print_error(&e.to_string());
                            }
                        }
                        ChatCommand::History => {
                            let transcript = session.transcript();
                            if transcript.is_empty() {
                                renderer.print_info("No messages yet.");
                            } else {
                                println!("{}", transcript);
                            }
                        }
                        ChatCommand::Keep(keep) => {
                            session.set_keep_last_message_on_error(keep);
                            if keep {
                                renderer.print_info("Keeping messages from failed turns.");
                            } else {
                                renderer.print_info("Rolling back failed turns.");
                            }
                        }
                        ChatCommand::Endpoint(url) => match session.set_endpoint(url.clone()) {
                            Ok(_) => {
                                renderer.print_info(&format!("Endpoint changed to: {}", url))
                            }
                            Err(err) => renderer
                                .print_error(&format!("Failed to change endpoint: {}", err)),
                        },
                        ChatCommand::Stats => {
                            print_stats(&session);
                        }
                        ChatCommand::ShowConfig => {
                            print_config(&session);
                        }
                        ChatCommand::Invalid(message) => {
                            renderer.print_error(&message);
                        }
                    }
                    continue;
                }

                // Regular message - send to the endpoint
                session.update_draft(line);
                if let Err(e) = session.submit(&mut renderer, interrupted.clone()).await {
                    renderer.print_error(&e.to_string());
                }
            }
            Err(ReadlineError::Interrupted) => {
                // Ctrl+C at prompt - soft interrupt
                println!();
                continue;
            }
            Err(ReadlineError::Eof) => {
                // Ctrl+D - exit
                println!("\nGoodbye!");
                break;
            }
            Err(err) => {
                renderer.print_error(&format!("Input error: {}", err));
                break;
            }
        }
    }

    Ok(())
}

fn print_stats(session: &ChatSession) {
    let stats = session.stats();
    println!("    Session Statistics:");
    println!("      Endpoint: {}", stats.endpoint_url);
    println!("      Messages: {}", stats.message_count);
    println!("      Status: {}", stats.status);
    println!("      Requests: {}", stats.total_requests);
    println!("      Rollbacks: {}", stats.total_rollbacks);
    println!(
        "      On error: {}",
        if stats.keep_last_message_on_error {
            "keep messages"
        } else {
            "roll back"
        }
    );
    println!(
        "      Replies: {}",
        if stats.streaming {
            "streamed"
        } else {
            "buffered"
        }
    );
}

fn print_config(session: &ChatSession) {
    let stats = session.stats();
    let config = session.config();
    println!("    Current Configuration:");
    println!("      Endpoint: {}", stats.endpoint_url);
    println!(
        "      On error: {}",
        if config.keep_last_message_on_error {
            "keep messages"
        } else {
            "roll back"
        }
    );
    println!(
        "      Replies: {}",
        if config.streaming {
            "streamed"
        } else {
            "buffered"
        }
    );
    println!(
        "      Timeout: {}s",
        config.request_timeout.as_secs()
    );
    println!(
        "      Color: {}",
        if config.use_color { "on" } else { "off" }
    );
}
