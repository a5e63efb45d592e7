//! In-memory conversation store

use super::message::{Message, MessageId, MessageStatus};
use thiserror::Error;

/// Errors returned by store mutations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("Message text is empty")]
    InvalidInput,
    #[error("A reply is already pending")]
    AlreadyPending,
    #[error("No pending message with id {0}")]
    NotPending(MessageId),
}

/// Ordered transcript plus the pending-reply slot
///
/// At most one message is pending at a time, and `awaiting_response()` is
/// true exactly while it exists. Messages are only ever appended; the pending
/// placeholder is finalized in place.
#[derive(Debug, Clone)]
pub struct ConversationStore {
    messages: Vec<Message>,
    /// Index of the pending placeholder in `messages`
    pending: Option<usize>,
}

impl ConversationStore {
    /// Create a transcript seeded with a final assistant greeting
    pub fn new(greeting: impl Into<String>) -> Self {
        Self {
            messages: vec![Message::assistant(greeting)],
            pending: None,
        }
    }

    pub fn append_user_message(&mut self, text: &str) -> Result<MessageId, StoreError> {
        if text.trim().is_empty() {
            return Err(StoreError::InvalidInput);
        }
        let msg = Message::user(text);
        let id = msg.id;
        self.messages.push(msg);
        Ok(id)
    }

    pub fn append_pending_assistant_message(&mut self) -> Result<MessageId, StoreError> {
        if self.pending.is_some() {
            return Err(StoreError::AlreadyPending);
        }
        let msg = Message::pending();
        let id = msg.id;
        self.pending = Some(self.messages.len());
        self.messages.push(msg);
        Ok(id)
    }

    /// Finalize the pending placeholder with its reply text
    ///
    /// Final messages are never empty, so an empty `text` is rejected and the
    /// placeholder stays pending.
    pub fn resolve_pending_message(
        &mut self,
        id: MessageId,
        text: impl Into<String>,
    ) -> Result<(), StoreError> {
        let index = self
            .pending
            .filter(|&i| self.messages[i].id == id)
            .ok_or(StoreError::NotPending(id))?;

        let text = text.into();
        if text.is_empty() {
            return Err(StoreError::InvalidInput);
        }
        let msg = &mut self.messages[index];
        msg.text = text;
        msg.status = MessageStatus::Final;
        self.pending = None;
        Ok(())
    }

    #[allow(dead_code)] // Borrowing read access; the runtime uses snapshot()
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Owned copy of the transcript for observers
    pub fn snapshot(&self) -> Vec<Message> {
        self.messages.clone()
    }

    pub fn get(&self, id: MessageId) -> Option<&Message> {
        self.messages.iter().find(|m| m.id == id)
    }

    #[allow(dead_code)] // API completeness
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    #[allow(dead_code)] // Pairs with len()
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn awaiting_response(&self) -> bool {
        self.pending.is_some()
    }

    #[allow(dead_code)] // API completeness
    pub fn pending_id(&self) -> Option<MessageId> {
        self.pending.map(|i| self.messages[i].id)
    }
}
