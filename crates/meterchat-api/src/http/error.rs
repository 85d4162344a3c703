//! Application error type mapping to HTTP status codes and plain-text bodies.
//!
//! Store and provider details are logged where they happen; only the
//! generic messages below ever reach a client.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use meterchat_core::error::{AuthError, ChatError};

const INTERNAL_MESSAGE: &str = "internal server error";
const UPSTREAM_MESSAGE: &str = "failed to get a reply, please try again";

/// Application-level error that maps to HTTP responses.
#[derive(Debug)]
pub enum AppError {
    Auth(AuthError),
    Chat(ChatError),
}

impl From<AuthError> for AppError {
    fn from(e: AuthError) -> Self {
        AppError::Auth(e)
    }
}

impl From<ChatError> for AppError {
    fn from(e: ChatError) -> Self {
        AppError::Chat(e)
    }
}

impl AppError {
    fn status_and_message(&self) -> (StatusCode, String) {
        match self {
            AppError::Auth(AuthError::UsernameTaken) => {
                (StatusCode::CONFLICT, AuthError::UsernameTaken.to_string())
            }
            AppError::Auth(AuthError::Internal(_)) => {
                (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_MESSAGE.to_string())
            }
            AppError::Auth(e) => (StatusCode::UNAUTHORIZED, e.to_string()),

            AppError::Chat(ChatError::BadRequest(msg)) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::Chat(ChatError::Unauthorized) => {
                (StatusCode::UNAUTHORIZED, AuthError::NotLoggedIn.to_string())
            }
            AppError::Chat(ChatError::UnknownModel(_)) => {
                (StatusCode::NOT_FOUND, "unknown model".to_string())
            }
            AppError::Chat(ChatError::Upstream { .. }) => {
                (StatusCode::INTERNAL_SERVER_ERROR, UPSTREAM_MESSAGE.to_string())
            }
            AppError::Chat(ChatError::Internal(_)) => {
                (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_MESSAGE.to_string())
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = self.status_and_message();
        (status, message).into_response()
    }
}
