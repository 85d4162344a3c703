//! Registration, login, and logout.
//!
//! AuthService owns the credential checks and the session lifecycle. It
//! depends only on the `CredentialStore`, `SessionStore` and
//! `PasswordHasher` ports -- never on concrete infra implementations.

use std::sync::Arc;

use meterchat_types::error::RepositoryError;
use meterchat_types::session::{Session, SessionId};
use meterchat_types::user::{NewUser, User};
use tracing::{error, info, warn};

use crate::error::AuthError;
use crate::repository::session::SessionStore;
use crate::repository::user::CredentialStore;
use crate::service::password::PasswordHasher;

/// Result of a login attempt with valid credentials.
#[derive(Debug, Clone, PartialEq)]
pub enum LoginOutcome {
    /// A new authenticated session was created and saved.
    LoggedIn(Session),
    /// The caller already holds a live authenticated session; nothing changed.
    AlreadyLoggedIn,
}

pub struct AuthService<U, S, H>
where
    U: CredentialStore,
    S: SessionStore,
    H: PasswordHasher,
{
    users: Arc<U>,
    sessions: Arc<S>,
    hasher: H,
    default_balance: u64,
    session_ttl: chrono::Duration,
}

impl<U, S, H> AuthService<U, S, H>
where
    U: CredentialStore,
    S: SessionStore,
    H: PasswordHasher,
{
    pub fn new(
        users: Arc<U>,
        sessions: Arc<S>,
        hasher: H,
        default_balance: u64,
        session_ttl: chrono::Duration,
    ) -> Self {
        Self {
            users,
            sessions,
            hasher,
            default_balance,
            session_ttl,
        }
    }

    /// Register a new user with the configured starting balance.
    pub async fn register(
        &self,
        username: Option<&str>,
        password: Option<&str>,
    ) -> Result<User, AuthError> {
        let (username, password) = require_credentials(username, password)?;
        self.create_user(username, password, self.default_balance)
            .await
    }

    /// Register a user with an explicit starting balance (operator path).
    pub async fn create_user(
        &self,
        username: &str,
        password: &str,
        token_balance: u64,
    ) -> Result<User, AuthError> {
        let existing = self.users.find_user(username).await.map_err(|e| {
            error!(username = %username, error = %e, "User lookup failed");
            AuthError::from(e)
        })?;
        if existing.is_some() {
            return Err(AuthError::UsernameTaken);
        }

        let password_hash = self.hasher.hash_password(password).map_err(|e| {
            error!(username = %username, error = %e, "Password hashing failed");
            AuthError::Internal(e.to_string())
        })?;

        let new_user = NewUser {
            username: username.to_string(),
            password_hash,
            token_balance,
        };

        // The existence check above can race; the store's uniqueness is final.
        match self.users.create_user(&new_user).await {
            Ok(user) => {
                info!(username = %user.username, balance = user.token_balance, "User registered");
                Ok(user)
            }
            Err(RepositoryError::Conflict(_)) => Err(AuthError::UsernameTaken),
            Err(e) => {
                error!(username = %username, error = %e, "User creation failed");
                Err(e.into())
            }
        }
    }

    /// Verify credentials and open a session.
    ///
    /// Credentials are checked before the existing session, so a caller who
    /// is already logged in still gets a credential error for bad input.
    pub async fn login(
        &self,
        current: Option<SessionId>,
        username: Option<&str>,
        password: Option<&str>,
    ) -> Result<LoginOutcome, AuthError> {
        let (username, password) = require_credentials(username, password)?;

        let user = self
            .users
            .find_user(username)
            .await
            .map_err(|e| {
                error!(username = %username, error = %e, "User lookup failed");
                AuthError::from(e)
            })?
            .ok_or(AuthError::NotRegistered)?;

        if !self.hasher.verify_password(password, &user.password_hash) {
            warn!(username = %username, "Login with incorrect password");
            return Err(AuthError::IncorrectPassword);
        }

        if let Some(id) = current {
            let existing = self.sessions.load(&id).await.map_err(|e| {
                error!(session_id = %id, error = %e, "Session load failed");
                AuthError::from(e)
            })?;
            if existing.is_some_and(|s| s.authenticated_user().is_some()) {
                return Ok(LoginOutcome::AlreadyLoggedIn);
            }
        }

        let session = Session::login(user.username, self.session_ttl);
        self.sessions.save(&session).await.map_err(|e| {
            error!(username = %username, error = %e, "Session save failed");
            AuthError::from(e)
        })?;
        info!(username = %username, session_id = %session.id, "User logged in");

        Ok(LoginOutcome::LoggedIn(session))
    }

    /// Destroy the caller's session.
    pub async fn logout(&self, current: Option<SessionId>) -> Result<(), AuthError> {
        let id = current.ok_or(AuthError::NotLoggedIn)?;
        let session = self
            .sessions
            .load(&id)
            .await
            .map_err(|e| {
                error!(session_id = %id, error = %e, "Session load failed");
                AuthError::from(e)
            })?
            .ok_or(AuthError::NotLoggedIn)?;
        let username = session
            .authenticated_user()
            .ok_or(AuthError::NotLoggedIn)?
            .to_string();

        self.sessions.delete(&id).await.map_err(|e| {
            error!(session_id = %id, error = %e, "Session delete failed");
            AuthError::from(e)
        })?;
        info!(username = %username, session_id = %id, "User logged out");
        Ok(())
    }

    pub async fn find_user(&self, username: &str) -> Result<Option<User>, AuthError> {
        self.users.find_user(username).await.map_err(|e| {
            error!(username = %username, error = %e, "User lookup failed");
            AuthError::from(e)
        })
    }

    /// Add tokens to a user's balance; returns the new balance.
    pub async fn grant(&self, username: &str, tokens: u64) -> Result<u64, AuthError> {
        match self.users.grant(username, tokens).await {
            Ok(balance) => {
                info!(username = %username, tokens, balance, "Tokens granted");
                Ok(balance)
            }
            Err(RepositoryError::NotFound) => Err(AuthError::NotRegistered),
            Err(e) => {
                error!(username = %username, error = %e, "Token grant failed");
                Err(e.into())
            }
        }
    }

    /// Sweep expired sessions out of the store.
    pub async fn purge_expired_sessions(&self) -> Result<u64, AuthError> {
        self.sessions.purge_expired().await.map_err(|e| {
            error!(error = %e, "Session purge failed");
            AuthError::from(e)
        })
    }
}

fn require_credentials<'a>(
    username: Option<&'a str>,
    password: Option<&'a str>,
) -> Result<(&'a str, &'a str), AuthError> {
    match (username, password) {
        (Some(u), Some(p)) if !u.is_empty() && !p.is_empty() => Ok((u, p)),
        _ => Err(AuthError::MissingCredentials),
    }
}
