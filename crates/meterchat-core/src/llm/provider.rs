//! CompletionProvider trait definition.
//!
//! Uses RPITIT (native async fn in traits, Rust 2024 edition) for `complete`.

use meterchat_types::llm::{CompletionRequest, CompletionResponse, LlmError};

/// Trait for completion provider backends.
///
/// Implementations live in meterchat-infra (e.g., `OpenAiCompatProvider`).
/// A call either yields a single assistant reply or an error; there is no
/// streaming and no retry at this layer.
pub trait CompletionProvider: Send + Sync {
    /// Human-readable provider name (e.g., "openai").
    fn name(&self) -> &str;

    /// Send the conversation and receive the reply.
    fn complete(
        &self,
        request: &CompletionRequest,
    ) -> impl std::future::Future<Output = Result<CompletionResponse, LlmError>> + Send;
}
