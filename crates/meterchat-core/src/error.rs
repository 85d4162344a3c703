//! Service-level error taxonomy.
//!
//! `BudgetExceeded` is deliberately absent: a limit hit is a normal outcome
//! (`TurnOutcome::LimitReached`), not an error.

use meterchat_types::error::RepositoryError;
use meterchat_types::llm::LlmError;
use thiserror::Error;

/// Failures of a single chat turn.
#[derive(Debug, Error)]
pub enum ChatError {
    /// Malformed or missing input. No side effects.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// No session, an expired one, or a cleared authentication flag.
    #[error("not logged in")]
    Unauthorized,

    /// The route names a model that is not configured.
    #[error("unknown model: {0}")]
    UnknownModel(String),

    /// The completion provider failed or timed out. Balance untouched.
    #[error("upstream error: {source}")]
    Upstream {
        source: LlmError,
        /// The user's message was written to the session with a fresh expiry.
        session_saved: bool,
    },

    /// A store failed. Details are logged, never surfaced.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ChatError {
    /// Whether the failed turn still wrote the session back.
    pub fn session_saved(&self) -> bool {
        matches!(
            self,
            ChatError::Upstream {
                session_saved: true,
                ..
            }
        )
    }
}

impl From<RepositoryError> for ChatError {
    fn from(e: RepositoryError) -> Self {
        ChatError::Internal(e.to_string())
    }
}

/// Failures of registration, login, and logout.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("no username or password provided")]
    MissingCredentials,

    #[error("username has been taken")]
    UsernameTaken,

    #[error("you have not registered yet")]
    NotRegistered,

    #[error("password is incorrect")]
    IncorrectPassword,

    #[error("you have not logged in yet")]
    NotLoggedIn,

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<RepositoryError> for AuthError {
    fn from(e: RepositoryError) -> Self {
        AuthError::Internal(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_error_messages() {
        assert_eq!(AuthError::UsernameTaken.to_string(), "username has been taken");
        assert_eq!(AuthError::NotRegistered.to_string(), "you have not registered yet");
        assert_eq!(AuthError::NotLoggedIn.to_string(), "you have not logged in yet");
    }

    #[test]
    fn test_repository_error_becomes_internal() {
        let err: ChatError = RepositoryError::Connection.into();
        assert!(matches!(err, ChatError::Internal(_)));
        let err: AuthError = RepositoryError::NotFound.into();
        assert!(matches!(err, AuthError::Internal(_)));
    }
}
