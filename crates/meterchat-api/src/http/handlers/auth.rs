//! Registration, login, and logout handlers.
//!
//! Credentials arrive as URL-encoded form fields `username` and `password`.
//! A body that cannot be parsed as a form counts as missing credentials.

use axum::extract::rejection::FormRejection;
use axum::extract::{Form, State};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;

use meterchat_core::service::auth::LoginOutcome;

use crate::http::error::AppError;
use crate::http::extractors::session::{SessionCookie, removal_cookie, session_cookie};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct CredentialsForm {
    pub username: Option<String>,
    pub password: Option<String>,
}

fn credentials(form: Result<Form<CredentialsForm>, FormRejection>) -> CredentialsForm {
    form.map(|Form(f)| f).unwrap_or_default()
}

/// POST /register
pub async fn register(
    State(state): State<AppState>,
    form: Result<Form<CredentialsForm>, FormRejection>,
) -> Result<&'static str, AppError> {
    let form = credentials(form);
    state
        .auth_service
        .register(form.username.as_deref(), form.password.as_deref())
        .await?;
    Ok("registered successfully")
}

/// POST /login
pub async fn login(
    State(state): State<AppState>,
    SessionCookie(current): SessionCookie,
    jar: CookieJar,
    form: Result<Form<CredentialsForm>, FormRejection>,
) -> Result<(CookieJar, &'static str), AppError> {
    let form = credentials(form);
    let outcome = state
        .auth_service
        .login(current, form.username.as_deref(), form.password.as_deref())
        .await?;

    match outcome {
        LoginOutcome::LoggedIn(session) => {
            let cookie = session_cookie(
                &state.config.session.cookie_name,
                session.id,
                state.config.session.ttl_secs,
            );
            Ok((jar.add(cookie), "login successfully"))
        }
        LoginOutcome::AlreadyLoggedIn => Ok((jar, "you have logged in already")),
    }
}

/// POST /logout
pub async fn logout(
    State(state): State<AppState>,
    SessionCookie(current): SessionCookie,
    jar: CookieJar,
) -> Result<(CookieJar, &'static str), AppError> {
    state.auth_service.logout(current).await?;
    let jar = jar.remove(removal_cookie(&state.config.session.cookie_name));
    Ok((jar, "logout successfully"))
}
