//! Startup configuration.
//!
//! Two optional TOML files are read in order, a secret file and then a config
//! file, and merged field by field with the later file winning. Keys use the
//! dotted names documented in the crate root, e.g. `openai.api.key`.

use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use history_store::{FileNamer, DEFAULT_DATE_PATTERN};
use serde::Deserialize;

use crate::error::ConfigError;
use crate::options::OptionSet;

pub const SECRET_PATH_ENV_VAR: &str = "OPENAI_CLI_SECRET_PATH";
pub const CONFIG_PATH_ENV_VAR: &str = "OPENAI_CLI_CONFIG_PATH";
pub const API_KEY_ENV_VAR: &str = "OPENAI_API_KEY";

pub const DEFAULT_SECRET_PATH: &str = "secret.toml";
pub const DEFAULT_CONFIG_PATH: &str = "config.toml";
pub const DEFAULT_MODEL: &str = "chatgpt-3.5";
pub const DEFAULT_MAX_TOKENS: u32 = 256;
pub const DEFAULT_HISTORY_FILE: &str = "history";
pub const DEFAULT_CODE_DIRECTORY: &str = ".";
pub const DEFAULT_HEADER: &str = "Open AI CLI --->";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ProviderKind {
    #[default]
    OpenAi,
    Mock,
}

impl FromStr for ProviderKind {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "openai" => Ok(Self::OpenAi),
            "mock" => Ok(Self::Mock),
            other => Err(ConfigError::UnknownProvider(other.to_string())),
        }
    }
}

/// Immutable configuration handed to the engine and the provider factory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub max_tokens: u32,
    pub base_url: Option<String>,
    pub organization: Option<String>,
    pub timeout: Option<Duration>,
    pub provider: ProviderKind,
    pub history_path: PathBuf,
    pub date_format: String,
    pub code_directory: PathBuf,
    pub header: String,
    pub options: OptionSet,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            base_url: None,
            organization: None,
            timeout: None,
            provider: ProviderKind::default(),
            history_path: PathBuf::from(DEFAULT_HISTORY_FILE),
            date_format: DEFAULT_DATE_PATTERN.to_string(),
            code_directory: PathBuf::from(DEFAULT_CODE_DIRECTORY),
            header: DEFAULT_HEADER.to_string(),
            options: OptionSet::default(),
        }
    }
}

impl AppConfig {
    /// Loads the secret and config files named by the environment, then
    /// applies the `OPENAI_API_KEY` override.
    pub fn from_env() -> Result<Self, ConfigError> {
        let secret_path = env_string_opt(SECRET_PATH_ENV_VAR)
            .unwrap_or_else(|| DEFAULT_SECRET_PATH.to_string());
        let config_path = env_string_opt(CONFIG_PATH_ENV_VAR)
            .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());

        let mut merged = ConfigLayer::read_optional(Path::new(&secret_path))?
            .overlay(ConfigLayer::read_optional(Path::new(&config_path))?);
        if let Some(api_key) = env_string_opt(API_KEY_ENV_VAR) {
            merged.api_key = Some(api_key);
        }

        let config = Self::from_layer(merged)?;
        tracing::debug!(
            secret = %secret_path,
            config = %config_path,
            provider = ?config.provider,
            model = %config.model,
            "loaded configuration"
        );
        Ok(config)
    }

    /// Parses a single TOML document. Missing keys take their defaults.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let layer = ConfigLayer::parse(content, Path::new("<inline>"))?;
        Self::from_layer(layer)
    }

    /// Reads both files (either may be absent) and merges them.
    pub fn load_from_paths(secret_path: &Path, config_path: &Path) -> Result<Self, ConfigError> {
        let merged = ConfigLayer::read_optional(secret_path)?
            .overlay(ConfigLayer::read_optional(config_path)?);
        Self::from_layer(merged)
    }

    fn from_layer(layer: ConfigLayer) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let provider = match layer.provider {
            Some(value) => value.parse::<ProviderKind>()?,
            None => defaults.provider,
        };

        let max_tokens = layer.max_tokens.unwrap_or(defaults.max_tokens);
        if max_tokens == 0 {
            return Err(ConfigError::InvalidValue {
                key: "openai.maxTokens",
                message: "must be > 0".to_string(),
            });
        }

        let timeout = match layer.timeout_sec {
            Some(0) => {
                return Err(ConfigError::InvalidValue {
                    key: "openai.timeoutSec",
                    message: "must be > 0 when provided".to_string(),
                })
            }
            Some(seconds) => Some(Duration::from_secs(seconds)),
            None => None,
        };

        let date_format = layer.date_format.unwrap_or(defaults.date_format);
        FileNamer::new(&date_format).map_err(|error| ConfigError::InvalidValue {
            key: "openaicli.filename.dateFormat",
            message: error.to_string(),
        })?;

        let options = OptionSet {
            disable_output_code_to_file: layer.disable_output_code_to_file.unwrap_or(false),
            disable_logging_history: layer.disable_logging_history.unwrap_or(false),
            disable_sending_history: layer.disable_sending_history.unwrap_or(false),
        };

        Ok(Self {
            api_key: layer.api_key,
            model: layer.model.unwrap_or(defaults.model),
            max_tokens,
            base_url: layer.base_url,
            organization: layer.organization,
            timeout,
            provider,
            history_path: layer.history.map(PathBuf::from).unwrap_or(defaults.history_path),
            date_format,
            code_directory: layer
                .code_directory
                .map(PathBuf::from)
                .unwrap_or(defaults.code_directory),
            header: layer.header.unwrap_or(defaults.header),
            options,
        })
    }

    /// Returns the API key, failing when it is absent.
    pub fn require_api_key(&self) -> Result<&str, ConfigError> {
        self.api_key.as_deref().ok_or(ConfigError::MissingApiKey)
    }

    /// Checks what the selected provider needs before anything is opened.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.provider {
            ProviderKind::OpenAi => self.require_api_key().map(|_| ()),
            ProviderKind::Mock => Ok(()),
        }
    }
}

/// One file's worth of settings, flattened. Blank strings count as unset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct ConfigLayer {
    api_key: Option<String>,
    model: Option<String>,
    max_tokens: Option<u32>,
    base_url: Option<String>,
    organization: Option<String>,
    timeout_sec: Option<u64>,
    provider: Option<String>,
    history: Option<String>,
    date_format: Option<String>,
    code_directory: Option<String>,
    header: Option<String>,
    disable_output_code_to_file: Option<bool>,
    disable_logging_history: Option<bool>,
    disable_sending_history: Option<bool>,
}

impl ConfigLayer {
    fn read_optional(path: &Path) -> Result<Self, ConfigError> {
        match fs::read_to_string(path) {
            Ok(content) => Self::parse(&content, path),
            Err(error) if error.kind() == io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "config file not found; using defaults");
                Ok(Self::default())
            }
            Err(source) => Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    fn parse(content: &str, path: &Path) -> Result<Self, ConfigError> {
        let raw = toml::from_str::<RawConfig>(content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(raw.flatten())
    }

    /// Fields set in `higher` win over fields set in `self`.
    fn overlay(self, higher: Self) -> Self {
        Self {
            api_key: higher.api_key.or(self.api_key),
            model: higher.model.or(self.model),
            max_tokens: higher.max_tokens.or(self.max_tokens),
            base_url: higher.base_url.or(self.base_url),
            organization: higher.organization.or(self.organization),
            timeout_sec: higher.timeout_sec.or(self.timeout_sec),
            provider: higher.provider.or(self.provider),
            history: higher.history.or(self.history),
            date_format: higher.date_format.or(self.date_format),
            code_directory: higher.code_directory.or(self.code_directory),
            header: higher.header.or(self.header),
            disable_output_code_to_file: higher
                .disable_output_code_to_file
                .or(self.disable_output_code_to_file),
            disable_logging_history: higher
                .disable_logging_history
                .or(self.disable_logging_history),
            disable_sending_history: higher
                .disable_sending_history
                .or(self.disable_sending_history),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    openai: Option<RawOpenAi>,
    openaicli: Option<RawOpenAiCli>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
struct RawOpenAi {
    api: Option<RawApi>,
    model: Option<String>,
    max_tokens: Option<u32>,
    base_url: Option<String>,
    organization: Option<String>,
    timeout_sec: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawApi {
    key: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawOpenAiCli {
    provider: Option<String>,
    filename: Option<RawFilename>,
    commandline: Option<RawCommandline>,
    options: Option<RawOptions>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
struct RawFilename {
    history: Option<String>,
    date_format: Option<String>,
    code_directory: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawCommandline {
    header: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawOptions {
    #[serde(rename = "disableOutputCodeToFile")]
    disable_output_code_to_file: Option<bool>,
    #[serde(rename = "disableLoggingChatGPTHistory")]
    disable_logging_history: Option<bool>,
    #[serde(rename = "disableSendingChatGPTHistory")]
    disable_sending_history: Option<bool>,
}

impl RawConfig {
    fn flatten(self) -> ConfigLayer {
        let openai = self.openai.unwrap_or_default();
        let cli = self.openaicli.unwrap_or_default();
        let filename = cli.filename.unwrap_or_default();
        let commandline = cli.commandline.unwrap_or_default();
        let options = cli.options.unwrap_or_default();

        ConfigLayer {
            api_key: non_blank(openai.api.and_then(|api| api.key)),
            model: non_blank(openai.model),
            max_tokens: openai.max_tokens,
            base_url: non_blank(openai.base_url),
            organization: non_blank(openai.organization),
            timeout_sec: openai.timeout_sec,
            provider: non_blank(cli.provider),
            history: non_blank(filename.history),
            date_format: non_blank(filename.date_format),
            code_directory: non_blank(filename.code_directory),
            header: non_blank(commandline.header),
            disable_output_code_to_file: options.disable_output_code_to_file,
            disable_logging_history: options.disable_logging_history,
            disable_sending_history: options.disable_sending_history,
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.trim().is_empty())
}

fn env_string_opt(key: &str) -> Option<String> {
    env::var(key).ok().and_then(|value| {
        if value.trim().is_empty() {
            None
        } else {
            Some(value)
        }
    })
}
