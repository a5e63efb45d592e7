//! Client configuration
//!
//! Values come from the environment and may be overridden by CLI flags.

use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_API_URL: &str = "http://localhost:8001";
pub const DEFAULT_DOCS_PATH: &str = "/docs";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Configuration errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value for {var}: {value:?} ({reason})")]
    InvalidValue {
        var: &'static str,
        value: String,
        reason: String,
    },
}

/// Whether outbound queries carry a thread identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ThreadMode {
    /// Each query stands alone; no `thread_id` is sent
    #[default]
    Stateless,
    /// Every query carries the conversation id as `thread_id`
    PerConversation,
}

impl FromStr for ThreadMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "stateless" => Ok(Self::Stateless),
            "per_conversation" | "per-conversation" | "thread" => Ok(Self::PerConversation),
            other => Err(format!(
                "expected `stateless` or `per_conversation`, got `{other}`"
            )),
        }
    }
}

/// Configuration for the chat client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL of the assistant service
    pub api_base_url: String,
    /// Deadline for one chat request; `None` waits indefinitely
    pub request_timeout: Option<Duration>,
    pub connect_timeout: Duration,
    pub thread_mode: ThreadMode,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_URL.to_string(),
            request_timeout: Some(Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS)),
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
            thread_mode: ThreadMode::Stateless,
        }
    }
}

impl ClientConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build from an arbitrary variable source
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(url) = lookup("CAMFEED_API_URL").filter(|u| !u.trim().is_empty()) {
            config.api_base_url = url.trim().to_string();
        }

        if let Some(raw) = lookup("CAMFEED_REQUEST_TIMEOUT_SECS") {
            let secs = parse_secs("CAMFEED_REQUEST_TIMEOUT_SECS", &raw)?;
            config.request_timeout = (secs > 0).then(|| Duration::from_secs(secs));
        }

        if let Some(raw) = lookup("CAMFEED_CONNECT_TIMEOUT_SECS") {
            let secs = parse_secs("CAMFEED_CONNECT_TIMEOUT_SECS", &raw)?;
            config.connect_timeout = Duration::from_secs(secs);
        }

        if let Some(raw) = lookup("CAMFEED_THREAD_MODE") {
            config.thread_mode = raw.parse().map_err(|reason| ConfigError::InvalidValue {
                var: "CAMFEED_THREAD_MODE",
                value: raw.clone(),
                reason,
            })?;
        }

        Ok(config)
    }

    /// URL of the service's interactive API documentation
    pub fn docs_url(&self) -> String {
        format!(
            "{}{DEFAULT_DOCS_PATH}",
            self.api_base_url.trim_end_matches('/')
        )
    }

    pub fn health_url(&self) -> String {
        format!("{}/health", self.api_base_url.trim_end_matches('/'))
    }
}

fn parse_secs(var: &'static str, raw: &str) -> Result<u64, ConfigError> {
    raw.trim().parse().map_err(|e| ConfigError::InvalidValue {
        var,
        value: raw.to_string(),
        reason: format!("{e}"),
    })
}
