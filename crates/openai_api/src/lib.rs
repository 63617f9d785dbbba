//! Transport-only OpenAI chat-completions client primitives.
//!
//! This crate owns request building, header construction, and response/error
//! parsing for the `/chat/completions` endpoint only. It contains no
//! conversation state and no retry policy: one call, one outcome.

pub mod client;
pub mod config;
pub mod error;
pub mod headers;
pub mod payload;
pub mod url;

pub use client::OpenAiApiClient;
pub use config::OpenAiApiConfig;
pub use error::OpenAiApiError;
pub use reqwest::StatusCode;
pub use payload::{ChatCompletionRequest, ChatCompletionResponse, WireMessage};
pub use url::normalize_chat_completions_url;
