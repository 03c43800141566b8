use serde_json::Value;

/// An event decoded from a streamed chat response.
///
/// The stream is a sequence of content deltas for a single assistant message,
/// possibly interleaved with data parts, ended by a finish part or by the end
/// of the HTTP body.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    /// An incremental content delta for the in-progress assistant message.
    TextDelta(String),

    /// A structured data part attached to the stream. Carried for logging;
    /// not part of the message content.
    Data(Value),

    /// An error reported in-band by the endpoint.
    Error(String),

    /// The terminal signal ending the reply.
    Finish,
}
