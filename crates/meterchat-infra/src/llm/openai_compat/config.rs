//! Configuration for the OpenAI-compatible completion provider.

use std::time::Duration;

use meterchat_types::config::ProviderConfig;
use secrecy::SecretString;

/// Everything needed to construct an [`super::OpenAiCompatProvider`].
///
/// Does not derive Debug; the key is only exposed when building headers.
pub struct OpenAiCompatConfig {
    /// Human-readable provider name used in logs.
    pub provider_name: String,
    /// Base URL for the API, without the `/chat/completions` suffix.
    pub base_url: String,
    pub api_key: SecretString,
    /// Per-request HTTP timeout.
    pub request_timeout: Duration,
}

impl OpenAiCompatConfig {
    pub fn from_provider_config(config: &ProviderConfig, api_key: SecretString) -> Self {
        Self {
            provider_name: provider_name_for(&config.base_url).to_string(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
            request_timeout: Duration::from_secs(config.timeout_secs),
        }
    }
}

/// Infer a display name for well-known endpoints.
fn provider_name_for(base_url: &str) -> &'static str {
    if base_url.contains("api.openai.com") {
        "openai"
    } else if base_url.contains("api.mistral.ai") {
        "mistral"
    } else if base_url.contains("generativelanguage.googleapis.com") {
        "gemini"
    } else {
        "openai-compatible"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_default_provider_config() {
        let config = OpenAiCompatConfig::from_provider_config(
            &ProviderConfig::default(),
            SecretString::from("sk-test"),
        );
        assert_eq!(config.provider_name, "openai");
        assert_eq!(config.base_url, "https://api.openai.com/v1");
        assert_eq!(config.request_timeout, Duration::from_secs(60));
    }

    #[test]
    fn test_trailing_slash_trimmed_and_custom_name() {
        let provider = ProviderConfig {
            base_url: "http://localhost:4000/v1/".to_string(),
            ..ProviderConfig::default()
        };
        let config =
            OpenAiCompatConfig::from_provider_config(&provider, SecretString::from("k"));
        assert_eq!(config.base_url, "http://localhost:4000/v1");
        assert_eq!(config.provider_name, "openai-compatible");
    }
}
