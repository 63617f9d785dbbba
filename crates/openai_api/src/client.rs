use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Client;

use crate::config::OpenAiApiConfig;
use crate::error::{parse_error_message, OpenAiApiError};
use crate::headers::build_headers;
use crate::payload::{ChatCompletionRequest, ChatCompletionResponse};
use crate::url::normalize_chat_completions_url;

#[derive(Debug)]
pub struct OpenAiApiClient {
    http: Client,
    config: OpenAiApiConfig,
}

impl OpenAiApiClient {
    pub fn new(config: OpenAiApiConfig) -> Result<Self, OpenAiApiError> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().map_err(OpenAiApiError::from)?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &OpenAiApiConfig {
        &self.config
    }

    pub fn normalized_endpoint(&self) -> String {
        normalize_chat_completions_url(&self.config.base_url)
    }

    pub fn build_headers(&self, user_agent: Option<&str>) -> Result<HeaderMap, OpenAiApiError> {
        let headers = build_headers(&self.config, user_agent)?;
        let mut out = HeaderMap::new();
        for (key, value) in headers {
            out.insert(
                HeaderName::from_bytes(key.as_bytes()).map_err(|_| {
                    OpenAiApiError::InvalidHeader(format!("invalid header key: {key}"))
                })?,
                HeaderValue::from_str(&value).map_err(|_| {
                    OpenAiApiError::InvalidHeader(format!("invalid header value for {key}"))
                })?,
            );
        }
        Ok(out)
    }

    pub fn build_request(
        &self,
        request: &ChatCompletionRequest,
    ) -> Result<reqwest::RequestBuilder, OpenAiApiError> {
        validate_request_payload_shape(request)?;

        let headers = self.build_headers(self.config.user_agent.as_deref())?;
        let mut payload = request.clone();
        payload.stream = false;
        Ok(self
            .http
            .post(self.normalized_endpoint())
            .headers(headers)
            .json(&payload))
    }

    /// Sends one request and decodes the full (non-streamed) response.
    ///
    /// Non-success statuses surface as [`OpenAiApiError::Status`]; nothing is retried.
    pub async fn complete(
        &self,
        request: &ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse, OpenAiApiError> {
        let response = self.build_request(request)?.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(OpenAiApiError::Status(
                status,
                parse_error_message(status, &body),
            ));
        }

        let parsed = serde_json::from_str::<ChatCompletionResponse>(&body)?;
        if parsed.choices.is_empty() {
            return Err(OpenAiApiError::EmptyChoices);
        }

        Ok(parsed)
    }
}

fn validate_request_payload_shape(request: &ChatCompletionRequest) -> Result<(), OpenAiApiError> {
    if request.model.trim().is_empty() {
        return Err(OpenAiApiError::InvalidRequestPayload(
            "'model' must not be empty".to_string(),
        ));
    }

    if request.messages.is_empty() {
        return Err(OpenAiApiError::InvalidRequestPayload(
            "'messages' must contain at least one message".to_string(),
        ));
    }

    Ok(())
}
