//! Conversation transcript
//!
//! Owns the ordered message sequence and the single pending-reply slot.

mod message;
mod store;


pub use message::{Message, MessageId, MessageStatus, Role};
pub use store::{ConversationStore, StoreError};

/// First message of every conversation
pub const GREETING: &str = "Hello! I'm your Camera Feed Query Assistant. I can help you with \
questions about camera feeds, system configurations, encoding/decoding parameters, and data \
analysis. What would you like to know?";
