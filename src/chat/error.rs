//! Chat client error types

use thiserror::Error;

/// Chat error with classification
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct ChatError {
    pub kind: ChatErrorKind,
    pub message: String,
}

impl ChatError {
    pub fn new(kind: ChatErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(ChatErrorKind::Network, message)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(ChatErrorKind::Timeout, message)
    }

    pub fn status(code: u16, message: impl Into<String>) -> Self {
        Self::new(ChatErrorKind::Status(code), message)
    }

    pub fn invalid_json(message: impl Into<String>) -> Self {
        Self::new(ChatErrorKind::InvalidJson, message)
    }

    pub fn missing_reply(message: impl Into<String>) -> Self {
        Self::new(ChatErrorKind::MissingReply, message)
    }

    /// Classify a transport-level reqwest failure
    pub fn from_transport(err: &reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::timeout(format!("Request timed out: {err}"))
        } else {
            Self::network(format!("Request failed: {err}"))
        }
    }
}

/// Error classification for fallback selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatErrorKind {
    /// Connection refused, DNS, reset
    Network,
    /// Transport-level timeout
    Timeout,
    /// Non-2xx response
    Status(u16),
    /// 2xx response whose body is not JSON
    InvalidJson,
    /// 2xx JSON response without a non-empty string `response` field
    MissingReply,
}

impl ChatErrorKind {
    /// True for every failure except a well-formed body lacking the reply
    pub fn is_connectivity(self) -> bool {
        !matches!(self, Self::MissingReply)
    }
}
