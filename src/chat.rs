//! Remote chat endpoint client
//!
//! The assistant service is an opaque request/response endpoint: one query in,
//! one reply out.

mod error;
mod http;
mod types;

pub use error::{ChatError, ChatErrorKind};
pub use http::HttpChatService;
pub use types::*;

use async_trait::async_trait;
use std::sync::Arc;

/// Common interface for the assistant service
#[async_trait]
pub trait ChatService: Send + Sync {
    /// Send one query and wait for the reply
    async fn send(&self, request: &ChatRequest) -> Result<ChatReply, ChatError>;

    /// Query the service health endpoint
    async fn health(&self) -> Result<HealthStatus, ChatError>;

    /// Base URL of the service, for logging
    fn endpoint(&self) -> &str;
}

#[async_trait]
impl<T: ChatService + ?Sized> ChatService for Arc<T> {
    async fn send(&self, request: &ChatRequest) -> Result<ChatReply, ChatError> {
        (**self).send(request).await
    }

    async fn health(&self) -> Result<HealthStatus, ChatError> {
        (**self).health().await
    }

    fn endpoint(&self) -> &str {
        (**self).endpoint()
    }
}

/// Logging wrapper for chat services
pub struct LoggingChatService<C> {
    inner: C,
}

impl<C: ChatService> LoggingChatService<C> {
    pub fn new(inner: C) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<C: ChatService> ChatService for LoggingChatService<C> {
    async fn send(&self, request: &ChatRequest) -> Result<ChatReply, ChatError> {
        let start = std::time::Instant::now();
        let result = self.inner.send(request).await;
        let duration = start.elapsed();

        match &result {
            Ok(reply) => {
                tracing::info!(
                    endpoint = %self.inner.endpoint(),
                    duration_ms = %duration.as_millis(),
                    thread_id = ?request.thread_id,
                    reply_chars = reply.text.chars().count(),
                    "Chat request completed"
                );
            }
            Err(e) => {
                tracing::error!(
                    endpoint = %self.inner.endpoint(),
                    duration_ms = %duration.as_millis(),
                    thread_id = ?request.thread_id,
                    error = %e.message,
                    kind = ?e.kind,
                    "Chat request failed"
                );
            }
        }

        result
    }

    async fn health(&self) -> Result<HealthStatus, ChatError> {
        let result = self.inner.health().await;
        if let Err(e) = &result {
            tracing::warn!(endpoint = %self.inner.endpoint(), error = %e, "Health check failed");
        }
        result
    }

    fn endpoint(&self) -> &str {
        self.inner.endpoint()
    }
}
