//! Runtime for driving a conversation against the assistant service
//!
//! One `RequestOrchestrator` per conversation. Submissions are single-flight:
//! while a reply is outstanding every further submission is ignored.

mod orchestrator;
mod outcome;

#[cfg(test)]
pub mod testing;

pub use orchestrator::{RequestOrchestrator, SessionConfig};
pub use outcome::{Outcome, CONNECTIVITY_FALLBACK, PROCESSING_FALLBACK, TIMEOUT_FALLBACK};

use crate::conversation::{Message, MessageId};

/// Example queries offered as one-click submissions
pub const QUICK_QUESTIONS: [&str; 5] = [
    "What are the camera IDs capturing the Pacific area with the best clarity?",
    "How many cameras are in the Pacific region?",
    "Show me cameras with high bandwidth usage",
    "Which cameras have H265 codec?",
    "What is the encoder schema?",
];

/// Events sent to conversation observers
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    MessageAppended { message: Message },
    MessageResolved { message: Message },
    AwaitingChanged { awaiting: bool },
}

/// Why a submission was dropped without touching the transcript
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    /// Query was empty after trimming
    Empty,
    /// Another query is still outstanding
    AwaitingResponse,
    /// The conversation was discarded
    Discarded,
}

/// Result of a single `submit_query` call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    Ignored(IgnoreReason),
    /// The pending message was finalized with the outcome's text
    Resolved {
        message_id: MessageId,
        outcome: Outcome,
    },
    /// The conversation was discarded mid-flight; the message stays pending
    Abandoned { message_id: MessageId },
}

impl Submission {
    #[allow(dead_code)] // Utility method
    pub fn is_ignored(&self) -> bool {
        matches!(self, Submission::Ignored(_))
    }
}
