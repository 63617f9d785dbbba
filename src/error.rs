use std::path::PathBuf;

use chat_provider::{ChatMessage, CompletionError, ProviderInitError};
use history_store::HistoryStoreError;
use thiserror::Error;

/// Missing or invalid configuration. Fatal at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("openai.api.key is required (set it in the secret file or OPENAI_API_KEY)")]
    MissingApiKey,

    #[error("invalid value for {key}: {message}")]
    InvalidValue { key: &'static str, message: String },

    #[error("unknown option '{0}'; expected one of disableOutputCodeToFile, disableLoggingChatGPTHistory, disableSendingChatGPTHistory")]
    UnknownOption(String),

    #[error("unsupported provider '{0}'; available providers: openai, mock")]
    UnknownProvider(String),
}

/// Failure surfaced to a front end by the conversation engine.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("completion failed: {0}")]
    Completion(#[from] CompletionError),

    #[error("history error: {0}")]
    History(#[from] HistoryStoreError),

    /// The turn succeeded but its code could not be written out.
    #[error("failed to write extracted code to {}: {reason}", path.display())]
    CodeOutput {
        path: PathBuf,
        reason: String,
        response: ChatMessage,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("provider initialization failed: {0}")]
    ProviderInit(#[from] ProviderInitError),

    #[error("session has stopped")]
    Stopped,
}

impl EngineError {
    /// Assistant reply carried by an error raised after the turn completed.
    #[must_use]
    pub fn response(&self) -> Option<&ChatMessage> {
        match self {
            Self::CodeOutput { response, .. } => Some(response),
            _ => None,
        }
    }
}
