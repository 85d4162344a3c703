//! In-memory port implementations shared by the service tests.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use chrono::Utc;
use meterchat_types::error::RepositoryError;
use meterchat_types::llm::{CompletionRequest, CompletionResponse, LlmError};
use meterchat_types::session::{Session, SessionId};
use meterchat_types::user::{NewUser, User};
use tokio::sync::Notify;

use crate::llm::provider::CompletionProvider;
use crate::repository::session::SessionStore;
use crate::repository::user::CredentialStore;
use crate::service::password::{HashError, PasswordHasher};

#[derive(Default)]
pub struct MemoryUsers {
    pub(crate) users: Mutex<HashMap<String, User>>,
    pub fail_lookups: bool,
    pub fail_debits: bool,
}

impl MemoryUsers {
    pub fn with_user(username: &str, balance: u64) -> Self {
        let store = Self::default();
        store.insert(username, "plain:pw", balance);
        store
    }

    pub fn insert(&self, username: &str, password_hash: &str, balance: u64) {
        self.users.lock().unwrap().insert(
            username.to_string(),
            User {
                username: username.to_string(),
                password_hash: password_hash.to_string(),
                token_balance: balance,
                created_at: Utc::now(),
                updated_at: Utc::now(),
            },
        );
    }

    pub fn balance_of(&self, username: &str) -> u64 {
        self.users.lock().unwrap()[username].token_balance
    }
}

impl CredentialStore for MemoryUsers {
    async fn find_user(&self, username: &str) -> Result<Option<User>, RepositoryError> {
        if self.fail_lookups {
            return Err(RepositoryError::Connection);
        }
        Ok(self.users.lock().unwrap().get(username).cloned())
    }

    async fn create_user(&self, user: &NewUser) -> Result<User, RepositoryError> {
        let mut users = self.users.lock().unwrap();
        if users.contains_key(&user.username) {
            return Err(RepositoryError::Conflict(user.username.clone()));
        }
        let created = User {
            username: user.username.clone(),
            password_hash: user.password_hash.clone(),
            token_balance: user.token_balance,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        users.insert(user.username.clone(), created.clone());
        Ok(created)
    }

    async fn balance(&self, username: &str) -> Result<u64, RepositoryError> {
        if self.fail_lookups {
            return Err(RepositoryError::Connection);
        }
        self.users
            .lock()
            .unwrap()
            .get(username)
            .map(|u| u.token_balance)
            .ok_or(RepositoryError::NotFound)
    }

    async fn debit(&self, username: &str, amount: u64) -> Result<u64, RepositoryError> {
        if self.fail_debits {
            return Err(RepositoryError::Connection);
        }
        let mut users = self.users.lock().unwrap();
        let user = users.get_mut(username).ok_or(RepositoryError::NotFound)?;
        if user.token_balance < amount {
            return Err(RepositoryError::InsufficientBalance { requested: amount });
        }
        user.token_balance -= amount;
        Ok(user.token_balance)
    }

    async fn grant(&self, username: &str, amount: u64) -> Result<u64, RepositoryError> {
        let mut users = self.users.lock().unwrap();
        let user = users.get_mut(username).ok_or(RepositoryError::NotFound)?;
        user.token_balance += amount;
        Ok(user.token_balance)
    }
}

#[derive(Default)]
pub struct MemorySessions {
    pub(crate) sessions: Mutex<HashMap<SessionId, Session>>,
    pub fail_saves: bool,
}

impl MemorySessions {
    pub fn get(&self, id: &SessionId) -> Option<Session> {
        self.sessions.lock().unwrap().get(id).cloned()
    }

    pub fn put(&self, session: Session) {
        self.sessions.lock().unwrap().insert(session.id, session);
    }
}

impl SessionStore for MemorySessions {
    async fn load(&self, id: &SessionId) -> Result<Option<Session>, RepositoryError> {
        Ok(self.get(id).filter(|s| !s.is_expired()))
    }

    async fn save(&self, session: &Session) -> Result<(), RepositoryError> {
        if self.fail_saves {
            return Err(RepositoryError::Query("disk full".to_string()));
        }
        self.put(session.clone());
        Ok(())
    }

    async fn update_history(&self, session: &Session) -> Result<bool, RepositoryError> {
        if self.fail_saves {
            return Err(RepositoryError::Query("disk full".to_string()));
        }
        let mut sessions = self.sessions.lock().unwrap();
        match sessions.get_mut(&session.id) {
            Some(stored) if stored.authenticated && !stored.is_expired() => {
                stored.history = session.history.clone();
                stored.expires_at = session.expires_at;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn delete(&self, id: &SessionId) -> Result<(), RepositoryError> {
        self.sessions.lock().unwrap().remove(id);
        Ok(())
    }

    async fn purge_expired(&self) -> Result<u64, RepositoryError> {
        let mut sessions = self.sessions.lock().unwrap();
        let before = sessions.len();
        sessions.retain(|_, s| !s.is_expired());
        Ok((before - sessions.len()) as u64)
    }
}

/// Stores passwords as `plain:<password>`.
pub struct PlainHasher;

impl PasswordHasher for PlainHasher {
    fn hash_password(&self, password: &str) -> Result<String, HashError> {
        Ok(format!("plain:{password}"))
    }

    fn verify_password(&self, password: &str, hash: &str) -> bool {
        hash.strip_prefix("plain:") == Some(password)
    }
}

pub enum Script {
    Reply(String),
    Fail,
    Hang,
    /// Wait for `release` before replying.
    Gated(String),
}

/// Provider that follows a fixed script and records what it was sent.
pub struct ScriptedProvider {
    script: Script,
    pub calls: AtomicUsize,
    pub last_request: Mutex<Option<CompletionRequest>>,
    pub started: Notify,
    pub release: Notify,
}

impl ScriptedProvider {
    pub fn new(script: Script) -> Self {
        Self {
            script,
            calls: AtomicUsize::new(0),
            last_request: Mutex::new(None),
            started: Notify::new(),
            release: Notify::new(),
        }
    }

    pub fn replying(content: &str) -> Self {
        Self::new(Script::Reply(content.to_string()))
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl CompletionProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_request.lock().unwrap() = Some(request.clone());
        self.started.notify_one();

        let content = match &self.script {
            Script::Reply(content) => content.clone(),
            Script::Fail => {
                return Err(LlmError::RateLimited {
                    retry_after_ms: None,
                });
            }
            Script::Hang => std::future::pending::<String>().await,
            Script::Gated(content) => {
                self.release.notified().await;
                content.clone()
            }
        };

        Ok(CompletionResponse {
            content,
            model: request.model.clone(),
            usage: None,
        })
    }
}
