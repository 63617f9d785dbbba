//! The conversation engine.
//!
//! One engine serves one session. `submit` runs a whole turn, including the
//! blocking completion call, before it returns; callers must not invoke it
//! concurrently.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use chat_provider::{ChatMessage, CompletionClient, CompletionRequest};
use history_store::{local_now, FileNamer, HistoryStore};
use time::OffsetDateTime;

use crate::code_blocks::{extract_blocks, extract_language_tag, has_code};
use crate::commands::{parse_command, Command};
use crate::config::AppConfig;
use crate::error::{ConfigError, EngineError};
use crate::options::{EngineOption, OptionSet};
use crate::store::TranscriptStore;

pub type Clock = Box<dyn Fn() -> OffsetDateTime + Send>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineResult {
    Continue(ChatMessage),
    Stopped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Active,
    Stopped,
}

/// Per-turn parameters taken from configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineSettings {
    pub model: String,
    pub max_tokens: u32,
    pub code_directory: PathBuf,
}

impl From<&AppConfig> for EngineSettings {
    fn from(config: &AppConfig) -> Self {
        Self {
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            code_directory: config.code_directory.clone(),
        }
    }
}

pub struct ConversationEngine {
    settings: EngineSettings,
    options: OptionSet,
    transcript: Vec<ChatMessage>,
    client: Arc<dyn CompletionClient>,
    store: Box<dyn TranscriptStore>,
    namer: FileNamer,
    clock: Clock,
    state: SessionState,
}

impl ConversationEngine {
    /// Opens (or creates) the configured history file and loads it.
    ///
    /// Any failure here is a startup failure.
    pub fn open(
        config: &AppConfig,
        client: Arc<dyn CompletionClient>,
    ) -> Result<Self, EngineError> {
        config.validate()?;
        let namer = FileNamer::new(&config.date_format).map_err(|error| {
            ConfigError::InvalidValue {
                key: "openaicli.filename.dateFormat",
                message: error.to_string(),
            }
        })?;
        let store = HistoryStore::ensure_exists(&config.history_path)?;

        Self::with_store(
            EngineSettings::from(config),
            config.options,
            namer,
            client,
            Box::new(store),
        )
    }

    /// Builds an engine over any store, seeding the transcript from it.
    pub fn with_store(
        settings: EngineSettings,
        options: OptionSet,
        namer: FileNamer,
        client: Arc<dyn CompletionClient>,
        mut store: Box<dyn TranscriptStore>,
    ) -> Result<Self, EngineError> {
        let transcript = store.load()?;
        tracing::info!(
            messages = transcript.len(),
            provider = %client.profile().provider_id,
            model = %settings.model,
            "conversation engine ready"
        );

        Ok(Self {
            settings,
            options,
            transcript,
            client,
            store,
            namer,
            clock: Box::new(local_now),
            state: SessionState::Active,
        })
    }

    /// Replaces the wall clock used for archive and code file names.
    #[must_use]
    pub fn with_clock(mut self, clock: impl Fn() -> OffsetDateTime + Send + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    #[must_use]
    pub fn transcript(&self) -> &[ChatMessage] {
        &self.transcript
    }

    #[must_use]
    pub fn options(&self) -> OptionSet {
        self.options
    }

    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state
    }

    #[must_use]
    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub fn set_option(&mut self, option: EngineOption, value: bool) {
        self.options.set(option, value);
        tracing::info!(option = %option, value, "option set");
    }

    pub fn flip_option(&mut self, option: EngineOption) -> bool {
        let value = self.options.flip(option);
        tracing::info!(option = %option, value, "option toggled");
        value
    }

    pub fn flip_option_by_name(&mut self, name: &str) -> Result<(EngineOption, bool), EngineError> {
        let option = name.parse::<EngineOption>()?;
        Ok((option, self.flip_option(option)))
    }

    /// Writes the whole transcript to the history file.
    pub fn save(&mut self) -> Result<(), EngineError> {
        self.store.save(&self.transcript)?;
        tracing::debug!(messages = self.transcript.len(), "transcript saved");
        Ok(())
    }

    /// Handles one line of user input.
    ///
    /// `QUIT` saves and stops. `WRITELAST` saves and `WIPE` archives the
    /// history; both then send the same text as an ordinary chat turn.
    pub fn submit(&mut self, input: &str) -> Result<EngineResult, EngineError> {
        if self.state == SessionState::Stopped {
            return Err(EngineError::Stopped);
        }

        match parse_command(input) {
            Command::Quit => {
                self.save()?;
                self.state = SessionState::Stopped;
                tracing::info!("session stopped");
                return Ok(EngineResult::Stopped);
            }
            Command::WriteLast => self.save()?,
            Command::Wipe => self.wipe()?,
            Command::Chat => {}
        }

        self.chat_turn(input).map(EngineResult::Continue)
    }

    fn wipe(&mut self) -> Result<(), EngineError> {
        self.transcript.clear();
        let now = (self.clock)();
        let outcome = self.store.archive_and_reset(&self.namer, now)?;
        tracing::info!(outcome = ?outcome, "history wiped");
        Ok(())
    }

    fn chat_turn(&mut self, input: &str) -> Result<ChatMessage, EngineError> {
        let history = if self.options.disable_sending_history {
            None
        } else {
            Some(self.transcript.clone())
        };
        let request = CompletionRequest {
            model: self.settings.model.clone(),
            history,
            input: input.to_string(),
            max_tokens: self.settings.max_tokens,
        };

        tracing::debug!(
            history = request.history.as_ref().map_or(0, Vec::len),
            "dispatching chat turn"
        );
        let response = self.client.complete(request)?;

        // Both halves of the exchange land together, only once the call succeeded.
        if !self.options.disable_logging_history {
            self.transcript.push(ChatMessage::user(input));
            self.transcript.push(response.clone());
        }

        if !self.options.disable_output_code_to_file && has_code(&response.content) {
            self.write_code_file(&response)?;
        }

        Ok(response)
    }

    fn write_code_file(&self, response: &ChatMessage) -> Result<PathBuf, EngineError> {
        let directory = &self.settings.code_directory;
        let code_error = |path: PathBuf, reason: String| EngineError::CodeOutput {
            path,
            reason,
            response: response.clone(),
        };

        let tag = extract_language_tag(&response.content);
        let name = self
            .namer
            .code_file_name(&tag, (self.clock)())
            .map_err(|error| code_error(directory.clone(), error.to_string()))?;
        let path = directory.join(name);

        let mut body = String::new();
        for block in extract_blocks(&response.content) {
            body.push_str(&block);
            body.push('\n');
        }

        fs::create_dir_all(directory)
            .map_err(|error| code_error(directory.clone(), error.to_string()))?;
        fs::write(&path, body).map_err(|error| code_error(path.clone(), error.to_string()))?;

        tracing::info!(path = %path.display(), language = %tag, "wrote extracted code");
        Ok(path)
    }
}
