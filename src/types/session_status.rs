use std::fmt;

/// The submission lifecycle state of a chat session.
///
/// The machine cycles for the life of the session; no state is terminal.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum SessionStatus {
    /// No request in flight; the input is available.
    #[default]
    Idle,

    /// A submission is in flight and the reply has not finished.
    AwaitingReply,

    /// The most recent submission failed; resubmission is permitted.
    Errored,
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionStatus::Idle => write!(f, "idle"),
            SessionStatus::AwaitingReply => write!(f, "awaiting-reply"),
            SessionStatus::Errored => write!(f, "errored"),
        }
    }
}
