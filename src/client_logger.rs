//! Logging trait for chat endpoint operations.
//!
//! This module provides the [`ClientLogger`] trait that allows users to
//! capture and log all traffic passing through the [`ChatEndpoint`] client.
//!
//! [`ChatEndpoint`]: crate::ChatEndpoint

use crate::types::{ChatRequest, StreamEvent};

/// A trait for logging chat endpoint operations.
///
/// Implement this trait to capture and record all endpoint interactions,
/// including outgoing requests, individual streaming events, and buffered
/// replies.
///
/// # Example
///
/// ```rust,ignore
/// use std::io::Write;
/// use std::sync::Mutex;
/// use chatline::{ChatRequest, ClientLogger, StreamEvent};
///
/// struct FileLogger {
///     file: Mutex<std::fs::File>,
/// }
///
/// impl ClientLogger for FileLogger {
///     fn log_request(&self, request: &ChatRequest) {
///         let mut file = self.file.lock().unwrap();
///         writeln!(file, "Request: {}", serde_json::to_string(request).unwrap()).unwrap();
///     }
///
///     fn log_stream_event(&self, event: &StreamEvent) {
///         let mut file = self.file.lock().unwrap();
///         writeln!(file, "Stream event: {event:?}").unwrap();
///     }
///
///     fn log_reply(&self, content: &str) {
///         let mut file = self.file.lock().unwrap();
///         writeln!(file, "Reply: {content}").unwrap();
///     }
/// }
/// ```
pub trait ClientLogger: Send + Sync {
    /// Log an outgoing request.
    ///
    /// This method is called once per submission with the full conversation
    /// history being sent to the endpoint.
    fn log_request(&self, request: &ChatRequest);

    /// Log an individual streaming event.
    ///
    /// This method is called for each [`StreamEvent`] received during a
    /// streaming request: content deltas, data parts, in-band errors, and
    /// the finish part.
    fn log_stream_event(&self, event: &StreamEvent);

    /// Log a complete buffered reply.
    ///
    /// This method is called once per successful non-streaming request with
    /// the full assistant content.
    fn log_reply(&self, content: &str);
}
