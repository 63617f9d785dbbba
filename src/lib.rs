//! Terminal chat client for the OpenAI chat-completions API.
//!
//! ## Configuration
//!
//! Settings come from two optional TOML files merged field by field: the file
//! named by `OPENAI_CLI_SECRET_PATH` (default `secret.toml`) and then the file
//! named by `OPENAI_CLI_CONFIG_PATH` (default `config.toml`), which wins.
//! `OPENAI_API_KEY` overrides `openai.api.key`.
//!
//! ```toml
//! openai.api.key = "sk-..."
//! openai.model = "chatgpt-3.5"
//! openai.maxTokens = 256
//! openai.timeoutSec = 60
//! openaicli.provider = "openai"
//! openaicli.filename.history = "history"
//! openaicli.filename.dateFormat = "yyyy-MM-ddHH:mm:ss"
//! openaicli.filename.codeDirectory = "."
//! openaicli.commandline.header = "Open AI CLI --->"
//! openaicli.options.disableOutputCodeToFile = false
//! openaicli.options.disableLoggingChatGPTHistory = false
//! openaicli.options.disableSendingChatGPTHistory = false
//! ```
//!
//! Contract notes:
//! - `openai.api.key` is required unless `openaicli.provider = "mock"`.
//! - `openai.timeoutSec` is optional and must be > 0 when provided.
//! - Blank strings fall back to defaults. Unknown keys are rejected.
//!
//! ## Session commands
//!
//! `QUIT` saves the transcript and ends the session. `WRITELAST` saves and
//! `WIPE`/`WIPEHISTORY` archive the history file; both still send their text
//! to the model as a normal turn.
//!
//! Conversation memory contract: the engine owns the transcript and sends it
//! as context on every turn unless `disableSendingChatGPTHistory` is set. The
//! current input is always sent.

pub mod code_blocks;
pub mod commands;
pub mod config;
pub mod engine;
pub mod error;
pub mod options;
pub mod providers;
pub mod store;

pub use config::{AppConfig, ProviderKind};
pub use engine::{ConversationEngine, EngineResult, EngineSettings, SessionState};
pub use error::{ConfigError, EngineError};
pub use options::{EngineOption, OptionSet};
pub use store::TranscriptStore;
