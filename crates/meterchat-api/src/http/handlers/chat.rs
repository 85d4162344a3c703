//! Metered chat handler.
//!
//! The turn runs on its own task, so a client that disconnects after the
//! provider was called still gets its history saved and its balance
//! debited.

use axum::extract::rejection::FormRejection;
use axum::extract::{Form, Path, State};
use axum::response::{IntoResponse, Response};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;

use meterchat_core::chat::service::ChatTurnRequest;

use crate::http::error::AppError;
use crate::http::extractors::session::{SessionCookie, session_cookie};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ChatForm {
    pub message: Option<String>,
}

/// POST /chat/{model}
///
/// Body is the reply text exactly, or the limit message on a soft reject.
pub async fn chat(
    State(state): State<AppState>,
    Path(model): Path<String>,
    SessionCookie(current): SessionCookie,
    jar: CookieJar,
    form: Result<Form<ChatForm>, FormRejection>,
) -> Response {
    let message = form.ok().and_then(|Form(f)| f.message);

    let result = state
        .chat_service
        .run_detached(ChatTurnRequest {
            session_id: current,
            model,
            message,
        })
        .await;

    // Any save pushed the expiry forward; keep the cookie's Max-Age in step.
    let saved = match &result {
        Ok(outcome) => outcome.session_saved(),
        Err(e) => e.session_saved(),
    };
    let jar = match current {
        Some(id) if saved => jar.add(session_cookie(
            &state.config.session.cookie_name,
            id,
            state.config.session.ttl_secs,
        )),
        _ => jar,
    };

    match result {
        Ok(outcome) => (jar, outcome.body().to_string()).into_response(),
        Err(e) => (jar, AppError::from(e)).into_response(),
    }
}
