//! Completion provider request/response types.
//!
//! The wire shape is the OpenAI chat-completions subset the relay needs:
//! `{model, messages: [{role, content}], max_tokens}` in, and only
//! `choices[0].message.content` consumed from the reply.

use serde::{Deserialize, Serialize};

use crate::chat::ChatMessage;

/// Request to a completion provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub max_output_tokens: u32,
}

/// A provider's reply: a single assistant message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionResponse {
    pub content: String,
    pub model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
}

/// Provider-reported usage. Informational only; billing uses the
/// character heuristic so the gate and the debit never drift apart.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Usage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

/// Errors from completion provider calls.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("provider error: {message}")]
    Provider { message: String },

    #[error("deserialization error: {0}")]
    Deserialization(String),

    #[error("rate limited (retry after {retry_after_ms:?}ms)")]
    RateLimited { retry_after_ms: Option<u64> },

    #[error("authentication failed")]
    AuthenticationFailed,

    #[error("provider call timed out after {0}s")]
    Timeout(u64),

    #[error("provider returned no choices")]
    EmptyReply,
}
