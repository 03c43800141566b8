// Public modules
pub mod chat_reply;
pub mod chat_request;
pub mod message;
pub mod session_status;
pub mod stream_event;

// Re-exports
pub use chat_reply::ChatReply;
pub use chat_request::{ChatRequest, MessageParam};
pub use message::{Message, MessageId, MessageRole};
pub use session_status::SessionStatus;
pub use stream_event::StreamEvent;
