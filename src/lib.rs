// Public modules
pub mod chat;
pub mod client;
pub mod client_logger;
pub mod data_stream;
pub mod error;
pub mod markdown;
pub mod observability;
pub mod render;
pub mod types;

// Re-exports
pub use client::ChatEndpoint;
pub use client_logger::ClientLogger;
pub use error::{Error, Result};
pub use render::transcript_to_string;
pub use types::*;
