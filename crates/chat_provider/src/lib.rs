//! Minimal provider-agnostic contract for one chat-completion exchange.
//!
//! This crate defines only the message model and the request/response
//! boundary the conversation engine talks to. It excludes transport details,
//! wire payloads, and any notion of conversation ownership.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Speaker of one transcript entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatRole {
    User,
    Assistant,
}

impl ChatRole {
    /// Returns the wire name used by chat-completion APIs.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

impl fmt::Display for ChatRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable transcript entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

/// Input required for one completion call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionRequest {
    pub model: String,
    /// Prior conversation. `None` when history sending is disabled.
    pub history: Option<Vec<ChatMessage>>,
    /// Current user input; always delivered to the model.
    pub input: String,
    pub max_tokens: u32,
}

impl CompletionRequest {
    /// Returns the ordered messages a provider should put on the wire.
    #[must_use]
    pub fn wire_messages(&self) -> Vec<ChatMessage> {
        let mut messages = self.history.clone().unwrap_or_default();
        messages.push(ChatMessage::user(self.input.clone()));
        messages
    }
}

/// Error returned while constructing/configuring a provider before any call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderInitError {
    message: String,
}

impl ProviderInitError {
    /// Creates a new provider initialization error.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Returns the underlying error message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for ProviderInitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for ProviderInitError {}

impl From<String> for ProviderInitError {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}

impl From<&str> for ProviderInitError {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

/// Failure of a single completion call. Never retried by callers in this workspace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompletionError {
    /// Connection, DNS, TLS, or timeout failure before a response arrived.
    Transport(String),
    /// The service rejected the credentials.
    Authentication(String),
    /// The service refused the call because of rate or usage limits.
    RateLimited(String),
    /// Any other non-success HTTP status.
    Status { code: u16, message: String },
    /// The service answered without any assistant message.
    EmptyResponse,
    Other(String),
}

impl fmt::Display for CompletionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport(message) => write!(f, "transport failure: {message}"),
            Self::Authentication(message) => write!(f, "authentication failed: {message}"),
            Self::RateLimited(message) => write!(f, "rate limited: {message}"),
            Self::Status { code, message } => write!(f, "HTTP {code}: {message}"),
            Self::EmptyResponse => f.write_str("completion service returned no message"),
            Self::Other(message) => f.write_str(message),
        }
    }
}

impl std::error::Error for CompletionError {}

/// Immutable metadata describing a completion provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderProfile {
    pub provider_id: String,
}

/// Provider interface for executing one completion call.
///
/// Calls are synchronous and serial from the caller's perspective; a provider
/// backed by async transport blocks until the response is available.
pub trait CompletionClient: Send + Sync + 'static {
    /// Returns provider identity metadata.
    fn profile(&self) -> ProviderProfile;

    /// Sends the effective context and returns exactly one assistant message.
    fn complete(&self, request: CompletionRequest) -> Result<ChatMessage, CompletionError>;
}
