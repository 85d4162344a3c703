//! Session cookie extraction and issuing.
//!
//! The cookie carries only the opaque session id; everything else lives in
//! the session store. A missing or unparsable cookie is not an error here:
//! handlers decide what "no session" means for them.

use std::convert::Infallible;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use meterchat_types::session::SessionId;

use crate::state::AppState;

/// The session id the client presented, if any.
pub struct SessionCookie(pub Option<SessionId>);

impl FromRequestParts<AppState> for SessionCookie {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        let id = jar
            .get(&state.config.session.cookie_name)
            .and_then(|c| c.value().parse::<SessionId>().ok());
        Ok(SessionCookie(id))
    }
}

/// Cookie carrying a freshly saved session; `Max-Age` restarts on every save.
pub fn session_cookie(name: &str, id: SessionId, ttl_secs: u64) -> Cookie<'static> {
    Cookie::build((name.to_string(), id.to_string()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::seconds(
            i64::try_from(ttl_secs).unwrap_or(i64::MAX),
        ))
        .build()
}

/// Cookie matching [`session_cookie`]'s path, for `CookieJar::remove`.
pub fn removal_cookie(name: &str) -> Cookie<'static> {
    Cookie::build((name.to_string(), "")).path("/").build()
}
