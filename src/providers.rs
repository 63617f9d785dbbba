use std::sync::Arc;

use chat_provider::{CompletionClient, ProviderInitError};
use chat_provider_mock::MockCompletionClient;
use chat_provider_openai::{OpenAiCompletionClient, OpenAiProviderConfig};

use crate::config::{AppConfig, ProviderKind};

/// Builds the completion client selected by `openaicli.provider`.
pub fn provider_from_config(
    config: &AppConfig,
) -> Result<Arc<dyn CompletionClient>, ProviderInitError> {
    match config.provider {
        ProviderKind::Mock => Ok(Arc::new(MockCompletionClient::default())),
        ProviderKind::OpenAi => {
            let api_key = config
                .require_api_key()
                .map_err(|error| ProviderInitError::new(error.to_string()))?;

            let mut provider_config = OpenAiProviderConfig::new(api_key);
            if let Some(base_url) = &config.base_url {
                provider_config = provider_config.with_base_url(base_url.clone());
            }
            if let Some(organization) = &config.organization {
                provider_config = provider_config.with_organization(organization.clone());
            }
            if let Some(timeout) = config.timeout {
                provider_config = provider_config.with_timeout(timeout);
            }

            Ok(Arc::new(OpenAiCompletionClient::new(provider_config)?))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mock_provider_needs_no_key() {
        let config = AppConfig {
            provider: ProviderKind::Mock,
            ..AppConfig::default()
        };

        let provider = provider_from_config(&config).expect("mock provider should resolve");
        assert_eq!(provider.profile().provider_id, "mock");
    }

    #[test]
    fn openai_provider_requires_key() {
        let error = match provider_from_config(&AppConfig::default()) {
            Ok(_) => panic!("missing key should fail"),
            Err(error) => error,
        };

        assert!(error.message().contains("openai.api.key is required"));
    }

    #[test]
    fn openai_provider_resolves_with_key() {
        let config = AppConfig {
            api_key: Some("sk-test".to_string()),
            base_url: Some("http://127.0.0.1:9/v1".to_string()),
            ..AppConfig::default()
        };

        let provider = provider_from_config(&config).expect("openai provider should resolve");
        assert_eq!(provider.profile().provider_id, "openai");
    }
}
