//! Completion provider implementations.
//!
//! Contains the concrete [`CompletionProvider`] used in production and a
//! factory ([`create_provider`]) that builds it from [`ProviderConfig`].
//!
//! [`CompletionProvider`]: meterchat_core::llm::provider::CompletionProvider

pub mod openai_compat;

use secrecy::SecretString;

use meterchat_core::llm::box_provider::BoxCompletionProvider;
use meterchat_types::config::ProviderConfig;
use meterchat_types::llm::LlmError;

use self::openai_compat::OpenAiCompatProvider;
use self::openai_compat::config::OpenAiCompatConfig;

/// Create a [`BoxCompletionProvider`] from a [`ProviderConfig`] and the
/// already-resolved API key.
pub fn create_provider(
    config: &ProviderConfig,
    api_key: SecretString,
) -> Result<BoxCompletionProvider, LlmError> {
    let provider =
        OpenAiCompatProvider::new(OpenAiCompatConfig::from_provider_config(config, api_key))?;
    Ok(BoxCompletionProvider::new(provider))
}
