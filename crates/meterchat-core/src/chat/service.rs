//! Chat turn orchestration.
//!
//! `ChatTurnService` ties the session store, the credential store, the budget
//! gate and the completion provider together for a single metered turn:
//!
//! ```text
//! session -> model -> message -> candidate -> [user lock] -> balance -> gate
//!     -> reject: limit message
//!     -> admit:  provider -> history saved -> balance debited -> reply
//! ```
//!
//! Turns for the same user are serialized by an in-process lock held from
//! the balance read to the debit, and the debit itself is a conditional
//! update at the store, so a balance can never be driven below zero.
//!
//! History is written back with `SessionStore::update_history`, which only
//! touches a session that is still live. A logout that lands while the
//! provider is answering stays a logout.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use meterchat_types::chat::ChatMessage;
use meterchat_types::config::RelayConfig;
use meterchat_types::llm::{CompletionRequest, CompletionResponse, LlmError};
use meterchat_types::session::{Session, SessionId};
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::chat::accumulator::{build_candidate, parse_message};
use crate::chat::budget::{BudgetGate, GateDecision};
use crate::error::ChatError;
use crate::llm::provider::CompletionProvider;
use crate::repository::session::SessionStore;
use crate::repository::user::CredentialStore;

/// Body returned when the budget gate rejects a turn.
pub const LIMIT_REACHED_MESSAGE: &str = "you've reached limits";

/// Per-turn policy knobs.
#[derive(Debug, Clone)]
pub struct TurnPolicy {
    /// Session TTL applied on every save.
    pub session_ttl: chrono::Duration,
    /// Keep the rejected user message in history.
    pub persist_on_reject: bool,
    /// Keep the user message in history when the provider call fails.
    pub persist_on_upstream_failure: bool,
    pub upstream_timeout: Duration,
    /// Route model id -> upstream model id.
    pub models: BTreeMap<String, String>,
}

impl TurnPolicy {
    pub fn from_config(config: &RelayConfig) -> Self {
        Self {
            session_ttl: config.session.ttl(),
            persist_on_reject: config.budget.persist_on_reject,
            persist_on_upstream_failure: config.budget.persist_on_upstream_failure,
            upstream_timeout: Duration::from_secs(config.provider.timeout_secs),
            models: config.models.clone(),
        }
    }
}

impl Default for TurnPolicy {
    fn default() -> Self {
        Self::from_config(&RelayConfig::default())
    }
}

/// One inbound chat turn.
#[derive(Debug, Clone)]
pub struct ChatTurnRequest {
    /// Session id from the cookie, if the client sent one.
    pub session_id: Option<SessionId>,
    /// Route model id, the `<model>` of `/chat/<model>`.
    pub model: String,
    pub message: Option<String>,
}

/// How a turn that did not fail ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    Replied {
        reply: String,
        /// Tokens debited for the reply.
        charged: u64,
        /// Balance after the debit; `None` if the debit failed.
        balance: Option<u64>,
        session_saved: bool,
    },
    /// The budget gate rejected the turn. Nothing was debited.
    LimitReached { session_saved: bool },
}

impl TurnOutcome {
    /// The exact text to send back to the caller.
    pub fn body(&self) -> &str {
        match self {
            TurnOutcome::Replied { reply, .. } => reply,
            TurnOutcome::LimitReached { .. } => LIMIT_REACHED_MESSAGE,
        }
    }

    /// Whether the session was written back with a fresh expiry.
    pub fn session_saved(&self) -> bool {
        match self {
            TurnOutcome::Replied { session_saved, .. }
            | TurnOutcome::LimitReached { session_saved } => *session_saved,
        }
    }
}

/// Runs metered chat turns.
pub struct ChatTurnService<U, S, P>
where
    U: CredentialStore,
    S: SessionStore,
    P: CompletionProvider,
{
    users: Arc<U>,
    sessions: Arc<S>,
    provider: Arc<P>,
    gate: BudgetGate,
    policy: TurnPolicy,
    user_locks: DashMap<String, Arc<Mutex<()>>>,
}

impl<U, S, P> ChatTurnService<U, S, P>
where
    U: CredentialStore,
    S: SessionStore,
    P: CompletionProvider,
{
    pub fn new(
        users: Arc<U>,
        sessions: Arc<S>,
        provider: Arc<P>,
        gate: BudgetGate,
        policy: TurnPolicy,
    ) -> Self {
        Self {
            users,
            sessions,
            provider,
            gate,
            policy,
            user_locks: DashMap::new(),
        }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Run one chat turn to completion.
    ///
    /// Dropping the returned future mid-call abandons the turn: nothing is
    /// persisted or debited. Use [`Self::run_detached`] when the caller may
    /// go away before the provider answers.
    pub async fn run_turn(&self, request: ChatTurnRequest) -> Result<TurnOutcome, ChatError> {
        let session_id = request.session_id.ok_or(ChatError::Unauthorized)?;
        let (_, username) = self.load_authenticated(&session_id).await?;
        let model = self
            .policy
            .models
            .get(&request.model)
            .cloned()
            .ok_or_else(|| ChatError::UnknownModel(request.model.clone()))?;
        let message = parse_message(request.message.as_deref())?.to_string();

        let lock = self.user_locks.entry(username.clone()).or_default().clone();
        let outcome = {
            let _guard = lock.lock_owned().await;
            self.run_locked(&session_id, &model, &message).await
        };
        self.user_locks
            .remove_if(&username, |_, lock| Arc::strong_count(lock) == 1);

        outcome
    }

    async fn run_locked(
        &self,
        session_id: &SessionId,
        model: &str,
        message: &str,
    ) -> Result<TurnOutcome, ChatError> {
        // Re-read under the lock: a concurrent turn may have grown the history.
        let (mut session, username) = self.load_authenticated(session_id).await?;
        let candidate = build_candidate(&session, message);

        let balance = self.users.balance(&username).await.map_err(|e| {
            error!(username = %username, error = %e, "Balance lookup failed");
            ChatError::from(e)
        })?;

        let max_output_tokens = match self.gate.check(&candidate, balance) {
            GateDecision::Reject { estimated_tokens } => {
                info!(
                    username = %username,
                    balance,
                    estimated_tokens,
                    "Budget exceeded, turn rejected"
                );
                let session_saved = if self.policy.persist_on_reject {
                    session.history = candidate;
                    self.save_history(&mut session).await
                } else {
                    false
                };
                return Ok(TurnOutcome::LimitReached { session_saved });
            }
            GateDecision::Admit {
                estimated_tokens,
                max_output_tokens,
            } => {
                debug!(
                    username = %username,
                    balance,
                    estimated_tokens,
                    max_output_tokens,
                    "Turn admitted"
                );
                max_output_tokens
            }
        };

        let completion = CompletionRequest {
            model: model.to_string(),
            messages: candidate.messages().to_vec(),
            max_output_tokens,
        };

        let response = match self.call_provider(&completion).await {
            Ok(response) => response,
            Err(e) => {
                error!(
                    username = %username,
                    provider = self.provider.name(),
                    model = %model,
                    error = %e,
                    "Completion failed"
                );
                let session_saved = if self.policy.persist_on_upstream_failure {
                    session.history = candidate;
                    self.save_history(&mut session).await
                } else {
                    false
                };
                return Err(ChatError::Upstream {
                    source: e,
                    session_saved,
                });
            }
        };

        let reply = response.content;
        let charged = self.gate.reply_cost(&reply);

        session.history = candidate;
        session.history.push(ChatMessage::assistant(reply.clone()));
        let session_saved = self.save_history(&mut session).await;

        let balance = match self.users.debit(&username, charged).await {
            Ok(remaining) => {
                info!(username = %username, charged, balance = remaining, "Turn completed");
                Some(remaining)
            }
            Err(e) => {
                error!(
                    username = %username,
                    charged,
                    error = %e,
                    accounting_drift = true,
                    "Debit failed after a successful completion"
                );
                None
            }
        };

        Ok(TurnOutcome::Replied {
            reply,
            charged,
            balance,
            session_saved,
        })
    }

    async fn load_authenticated(
        &self,
        session_id: &SessionId,
    ) -> Result<(Session, String), ChatError> {
        let session = self.sessions.load(session_id).await.map_err(|e| {
            error!(session_id = %session_id, error = %e, "Session load failed");
            ChatError::from(e)
        })?;
        let session = session.ok_or(ChatError::Unauthorized)?;
        let username = session
            .authenticated_user()
            .ok_or(ChatError::Unauthorized)?
            .to_string();
        Ok((session, username))
    }

    async fn call_provider(
        &self,
        request: &CompletionRequest,
    ) -> Result<CompletionResponse, LlmError> {
        let timeout = self.policy.upstream_timeout;
        match tokio::time::timeout(timeout, self.provider.complete(request)).await {
            Ok(result) => result,
            Err(_) => Err(LlmError::Timeout(timeout.as_secs())),
        }
    }

    /// Write the history back with a refreshed TTL. A failed save is logged
    /// and the turn goes on; returns whether the session was written.
    async fn save_history(&self, session: &mut Session) -> bool {
        session.refresh(self.policy.session_ttl);
        match self.sessions.update_history(session).await {
            Ok(true) => true,
            Ok(false) => {
                info!(session_id = %session.id, "Session ended during the turn, history dropped");
                false
            }
            Err(e) => {
                error!(session_id = %session.id, error = %e, "Session save failed");
                false
            }
        }
    }
}

impl<U, S, P> ChatTurnService<U, S, P>
where
    U: CredentialStore + 'static,
    S: SessionStore + 'static,
    P: CompletionProvider + 'static,
{
    /// Run the turn on its own task and wait for it.
    ///
    /// If the caller is dropped after the provider was called, the task still
    /// saves the history and debits the balance.
    pub async fn run_detached(
        self: &Arc<Self>,
        request: ChatTurnRequest,
    ) -> Result<TurnOutcome, ChatError> {
        let service = Arc::clone(self);
        tokio::spawn(async move { service.run_turn(request).await })
            .await
            .map_err(|e| {
                warn!(error = %e, "Chat turn task did not finish");
                ChatError::Internal(e.to_string())
            })?
    }
}
