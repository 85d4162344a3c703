//! Conversation accumulation for a single turn.
//!
//! Appends the inbound user message to a copy of the session's history. The
//! session itself is not touched: whether the candidate is persisted is the
//! orchestrator's decision and depends on how the turn ends.

use meterchat_types::chat::{ChatMessage, ConversationHistory};
use meterchat_types::session::Session;

use crate::error::ChatError;

/// Validate the inbound message text. Missing or empty text is rejected.
pub fn parse_message(raw: Option<&str>) -> Result<&str, ChatError> {
    match raw {
        Some(text) if !text.is_empty() => Ok(text),
        _ => Err(ChatError::BadRequest("no message provided".to_string())),
    }
}

/// Build the full message list to submit upstream for this turn.
///
/// The result always ends with the new user message.
pub fn build_candidate(session: &Session, message: &str) -> ConversationHistory {
    let mut candidate = session.history.clone();
    candidate.push(ChatMessage::user(message));
    candidate
}
