//! Mapping from a chat exchange to the text shown in the transcript

use crate::chat::{ChatError, ChatErrorKind, ChatReply};

/// Shown when the service answered without a usable reply
pub const PROCESSING_FALLBACK: &str = "Sorry, I couldn't process your request.";

/// Shown when the service could not be reached or failed
pub const CONNECTIVITY_FALLBACK: &str =
    "Sorry, I'm having trouble connecting to the server. Please try again.";

/// Shown when the service did not answer before the deadline
pub const TIMEOUT_FALLBACK: &str =
    "Sorry, the server took too long to respond. Please try again.";

/// How a submitted query ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Replied(String),
    /// Success status without a non-empty reply
    MissingReply,
    Unreachable(ChatErrorKind),
    TimedOut,
}

impl Outcome {
    pub fn from_result(result: Result<ChatReply, ChatError>) -> Self {
        match result {
            Ok(reply) if reply.text.is_empty() => Outcome::MissingReply,
            Ok(reply) => Outcome::Replied(reply.text),
            Err(e) if e.kind == ChatErrorKind::Timeout => Outcome::TimedOut,
            Err(e) if e.kind.is_connectivity() => Outcome::Unreachable(e.kind),
            Err(_) => Outcome::MissingReply,
        }
    }

    /// Text that finalizes the pending message
    pub fn text(&self) -> &str {
        match self {
            Outcome::Replied(text) => text,
            Outcome::MissingReply => PROCESSING_FALLBACK,
            Outcome::Unreachable(_) => CONNECTIVITY_FALLBACK,
            Outcome::TimedOut => TIMEOUT_FALLBACK,
        }
    }

    pub fn is_reply(&self) -> bool {
        matches!(self, Outcome::Replied(_))
    }
}
