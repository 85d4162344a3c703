//! SessionStore trait definition.

use meterchat_types::error::RepositoryError;
use meterchat_types::session::{Session, SessionId};

/// Server-side session persistence keyed by the cookie-carried id.
pub trait SessionStore: Send + Sync {
    /// Load a session. Expired sessions are reported as `None`.
    fn load(
        &self,
        id: &SessionId,
    ) -> impl std::future::Future<Output = Result<Option<Session>, RepositoryError>> + Send;

    /// Insert or replace a session, including its `expires_at`.
    fn save(
        &self,
        session: &Session,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Write `history` and `expires_at` of a session that is still live and
    /// authenticated. Never recreates a deleted or logged-out session;
    /// returns `false` when nothing was written.
    fn update_history(
        &self,
        session: &Session,
    ) -> impl std::future::Future<Output = Result<bool, RepositoryError>> + Send;

    /// Remove a session. Deleting an absent session is a no-op.
    fn delete(
        &self,
        id: &SessionId,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Remove every expired session; returns how many were removed.
    fn purge_expired(
        &self,
    ) -> impl std::future::Future<Output = Result<u64, RepositoryError>> + Send;
}
