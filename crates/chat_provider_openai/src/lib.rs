//! OpenAI API-backed implementation of the shared `chat_provider` contract.
//!
//! This adapter translates `openai_api` transport outcomes into the
//! synchronous `CompletionClient` contract expected by the conversation engine.

use std::sync::Arc;
use std::time::Duration;

use chat_provider::{
    ChatMessage, ChatRole, CompletionClient, CompletionError, CompletionRequest,
    ProviderInitError, ProviderProfile,
};
use openai_api::{
    ChatCompletionRequest, ChatCompletionResponse, OpenAiApiClient, OpenAiApiConfig,
    OpenAiApiError, WireMessage,
};

/// Stable provider identifier used by startup selection.
pub const OPENAI_PROVIDER_ID: &str = "openai";

/// Runtime configuration for the OpenAI provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenAiProviderConfig {
    pub api_key: String,
    pub base_url: Option<String>,
    pub organization: Option<String>,
    pub timeout: Option<Duration>,
}

impl OpenAiProviderConfig {
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: None,
            organization: None,
            timeout: None,
        }
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    #[must_use]
    pub fn with_organization(mut self, organization: impl Into<String>) -> Self {
        self.organization = Some(organization.into());
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    fn into_api_config(self) -> OpenAiApiConfig {
        let mut config = OpenAiApiConfig::new(self.api_key);

        if let Some(base_url) = self.base_url {
            config = config.with_base_url(base_url);
        }

        if let Some(organization) = self.organization {
            config = config.with_organization(organization);
        }

        if let Some(timeout) = self.timeout {
            config = config.with_timeout(timeout);
        }

        config
    }
}

trait CompletionTransport: Send + Sync {
    fn complete(
        &self,
        request: &ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse, OpenAiApiError>;
}

#[derive(Debug)]
struct DefaultTransport {
    client: OpenAiApiClient,
}

impl CompletionTransport for DefaultTransport {
    fn complete(
        &self,
        request: &ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse, OpenAiApiError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|error| {
                OpenAiApiError::Unknown(format!("failed to initialize tokio runtime: {error}"))
            })?;

        runtime.block_on(self.client.complete(request))
    }
}

/// `CompletionClient` adapter backed by `openai_api` transport primitives.
pub struct OpenAiCompletionClient {
    transport: Arc<dyn CompletionTransport>,
}

impl OpenAiCompletionClient {
    /// Creates a client using real OpenAI transport.
    pub fn new(config: OpenAiProviderConfig) -> Result<Self, ProviderInitError> {
        if config.api_key.trim().is_empty() {
            return Err(ProviderInitError::new(
                "Failed to initialize openai provider: API key is required",
            ));
        }

        let transport = Arc::new(DefaultTransport {
            client: OpenAiApiClient::new(config.into_api_config()).map_err(map_init_error)?,
        });

        Ok(Self { transport })
    }

    #[cfg(test)]
    fn with_transport_for_tests(transport: Arc<dyn CompletionTransport>) -> Self {
        Self { transport }
    }
}

impl CompletionClient for OpenAiCompletionClient {
    fn profile(&self) -> ProviderProfile {
        ProviderProfile {
            provider_id: OPENAI_PROVIDER_ID.to_string(),
        }
    }

    fn complete(&self, request: CompletionRequest) -> Result<ChatMessage, CompletionError> {
        let messages = request
            .wire_messages()
            .into_iter()
            .map(|message| WireMessage::new(message.role.as_str(), message.content))
            .collect();
        let payload =
            ChatCompletionRequest::new(request.model, messages).with_max_tokens(request.max_tokens);

        tracing::debug!(
            model = %payload.model,
            messages = payload.messages.len(),
            max_tokens = request.max_tokens,
            "sending chat completion request"
        );

        let response = self
            .transport
            .complete(&payload)
            .map_err(map_completion_error)?;
        let message = response
            .first_message()
            .ok_or(CompletionError::EmptyResponse)?;

        if let Some(usage) = response.usage {
            tracing::debug!(
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                "chat completion finished"
            );
        }

        Ok(ChatMessage {
            role: ChatRole::Assistant,
            content: message.content.clone(),
        })
    }
}

fn map_completion_error(error: OpenAiApiError) -> CompletionError {
    if error.is_authentication() {
        return CompletionError::Authentication(error.to_string());
    }
    if error.is_rate_limited() {
        return CompletionError::RateLimited(error.to_string());
    }

    match error {
        OpenAiApiError::Status(status, message) => CompletionError::Status {
            code: status.as_u16(),
            message,
        },
        OpenAiApiError::Request(source) => CompletionError::Transport(source.to_string()),
        OpenAiApiError::EmptyChoices => CompletionError::EmptyResponse,
        OpenAiApiError::MissingApiKey => {
            CompletionError::Authentication("API key is required".to_string())
        }
        other => CompletionError::Other(format!("OpenAI request failed: {other}")),
    }
}

fn map_init_error(error: OpenAiApiError) -> ProviderInitError {
    ProviderInitError::new(format!("Failed to initialize openai provider: {error}"))
}
