//! HTTP implementation of the chat service

use super::{ChatError, ChatReply, ChatRequest, ChatService, HealthStatus};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use std::time::Duration;

const CHAT_PATH: &str = "/api/v1/chat";
const HEALTH_PATH: &str = "/health";

/// Longest response body excerpt carried into error messages
const BODY_EXCERPT_CHARS: usize = 200;

/// Chat service over plain HTTP/JSON
///
/// Performs exactly one attempt per call. No overall request deadline is set
/// here; the orchestrator owns that.
pub struct HttpChatService {
    client: Client,
    base_url: String,
    chat_url: String,
    health_url: String,
}

impl HttpChatService {
    pub fn new(base_url: &str, connect_timeout: Duration) -> Result<Self, ChatError> {
        let client = Client::builder()
            .connect_timeout(connect_timeout)
            .build()
            .map_err(|e| ChatError::network(format!("Failed to create HTTP client: {e}")))?;

        let base_url = base_url.trim_end_matches('/').to_string();
        Ok(Self {
            client,
            chat_url: format!("{base_url}{CHAT_PATH}"),
            health_url: format!("{base_url}{HEALTH_PATH}"),
            base_url,
        })
    }

    fn classify_status(status: StatusCode, body: &str) -> ChatError {
        let excerpt = excerpt(body);
        match status.as_u16() {
            code @ 500..=599 => ChatError::status(code, format!("Server error {code}: {excerpt}")),
            code => ChatError::status(code, format!("HTTP {code}: {excerpt}")),
        }
    }

    async fn get_json(&self, url: &str) -> Result<Value, ChatError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ChatError::from_transport(&e))?;
        read_json(response).await
    }
}

#[async_trait]
impl ChatService for HttpChatService {
    async fn send(&self, request: &ChatRequest) -> Result<ChatReply, ChatError> {
        let response = self
            .client
            .post(&self.chat_url)
            .json(request)
            .send()
            .await
            .map_err(|e| ChatError::from_transport(&e))?;

        let body = read_json(response).await?;
        ChatReply::from_body(&body)
            .ok_or_else(|| ChatError::missing_reply(format!("No reply in response: {body}")))
    }

    async fn health(&self) -> Result<HealthStatus, ChatError> {
        let body = self.get_json(&self.health_url).await?;
        serde_json::from_value(body)
            .map_err(|e| ChatError::invalid_json(format!("Unexpected health payload: {e}")))
    }

    fn endpoint(&self) -> &str {
        &self.base_url
    }
}

/// Read a response, failing on non-2xx status or a non-JSON body
async fn read_json(response: reqwest::Response) -> Result<Value, ChatError> {
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| ChatError::network(format!("Failed to read response: {e}")))?;

    if !status.is_success() {
        return Err(HttpChatService::classify_status(status, &body));
    }

    serde_json::from_str(&body).map_err(|e| {
        ChatError::invalid_json(format!("Failed to parse response: {e} - body: {}", excerpt(&body)))
    })
}

fn excerpt(body: &str) -> String {
    body.chars().take(BODY_EXCERPT_CHARS).collect()
}
