//! Server-side session record.
//!
//! A session is keyed by an opaque id carried in a cookie. It holds the
//! authentication flag, the username resolved on every metered operation,
//! the conversation history, and an absolute expiry that is pushed forward
//! on every save.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::chat::ConversationHistory;

/// Opaque session identifier (random v4 UUID).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub Uuid);

impl SessionId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for SessionId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// Strongly typed session state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: SessionId,
    pub authenticated: bool,
    pub username: Option<String>,
    pub history: ConversationHistory,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    /// A fresh authenticated session with an empty history.
    pub fn login(username: impl Into<String>, ttl: Duration) -> Self {
        Self {
            id: SessionId::generate(),
            authenticated: true,
            username: Some(username.into()),
            history: ConversationHistory::new(),
            expires_at: Utc::now() + ttl,
        }
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    /// The username of a live, authenticated session.
    ///
    /// Returns `None` for expired sessions, cleared authentication flags,
    /// or a missing username -- all of which count as logged out.
    pub fn authenticated_user(&self) -> Option<&str> {
        if !self.authenticated || self.is_expired() {
            return None;
        }
        self.username.as_deref()
    }

    /// Push the expiry forward by `ttl` from now.
    pub fn refresh(&mut self, ttl: Duration) {
        self.expires_at = Utc::now() + ttl;
    }
}
