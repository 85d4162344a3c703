//! SQLite session store.
//!
//! Implements `SessionStore` from `meterchat-core`. The conversation history
//! is stored as its JSON blob; the typed `Session` exists only above this
//! boundary.

use chrono::{DateTime, SecondsFormat, Utc};
use meterchat_core::repository::session::SessionStore;
use meterchat_types::chat::ConversationHistory;
use meterchat_types::error::RepositoryError;
use meterchat_types::session::{Session, SessionId};
use sqlx::Row;
use tracing::debug;

use super::pool::DatabasePool;
use super::{parse_datetime, query_error};

/// SQLite-backed implementation of `SessionStore`.
#[derive(Clone)]
pub struct SqliteSessionStore {
    pool: DatabasePool,
}

impl SqliteSessionStore {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

/// Fixed-width UTC timestamps so `expires_at` compares correctly as text.
fn format_expiry(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

struct SessionRow {
    id: String,
    authenticated: bool,
    username: Option<String>,
    history: String,
    expires_at: String,
}

impl SessionRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            authenticated: row.try_get("authenticated")?,
            username: row.try_get("username")?,
            history: row.try_get("history")?,
            expires_at: row.try_get("expires_at")?,
        })
    }

    fn into_session(self) -> Result<Session, RepositoryError> {
        let id = self
            .id
            .parse::<SessionId>()
            .map_err(|e| RepositoryError::Query(format!("invalid session id: {e}")))?;
        let history = ConversationHistory::from_json(&self.history)
            .map_err(|e| RepositoryError::Query(format!("invalid history JSON: {e}")))?;

        Ok(Session {
            id,
            authenticated: self.authenticated,
            username: self.username,
            history,
            expires_at: parse_datetime(&self.expires_at)?,
        })
    }
}

impl SessionStore for SqliteSessionStore {
    async fn load(&self, id: &SessionId) -> Result<Option<Session>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM sessions WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(query_error)?;

        let Some(row) = row else {
            return Ok(None);
        };
        let session = SessionRow::from_row(&row)
            .map_err(query_error)?
            .into_session()?;

        if session.is_expired() {
            debug!(session_id = %id, "Dropping expired session");
            self.delete(id).await?;
            return Ok(None);
        }
        Ok(Some(session))
    }

    async fn save(&self, session: &Session) -> Result<(), RepositoryError> {
        let history = session
            .history
            .to_json()
            .map_err(|e| RepositoryError::Query(format!("failed to serialize history: {e}")))?;

        sqlx::query(
            r#"INSERT INTO sessions (id, authenticated, username, history, expires_at)
               VALUES (?, ?, ?, ?, ?)
               ON CONFLICT (id) DO UPDATE SET
                   authenticated = excluded.authenticated,
                   username = excluded.username,
                   history = excluded.history,
                   expires_at = excluded.expires_at"#,
        )
        .bind(session.id.to_string())
        .bind(session.authenticated)
        .bind(&session.username)
        .bind(&history)
        .bind(format_expiry(&session.expires_at))
        .execute(&self.pool.writer)
        .await
        .map_err(query_error)?;

        Ok(())
    }

    async fn update_history(&self, session: &Session) -> Result<bool, RepositoryError> {
        let history = session
            .history
            .to_json()
            .map_err(|e| RepositoryError::Query(format!("failed to serialize history: {e}")))?;

        let result = sqlx::query(
            r#"UPDATE sessions SET history = ?, expires_at = ?
               WHERE id = ? AND authenticated = 1 AND expires_at > ?"#,
        )
        .bind(&history)
        .bind(format_expiry(&session.expires_at))
        .bind(session.id.to_string())
        .bind(format_expiry(&Utc::now()))
        .execute(&self.pool.writer)
        .await
        .map_err(query_error)?;

        Ok(result.rows_affected() == 1)
    }

    async fn delete(&self, id: &SessionId) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM sessions WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool.writer)
            .await
            .map_err(query_error)?;
        Ok(())
    }

    async fn purge_expired(&self) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= ?")
            .bind(format_expiry(&Utc::now()))
            .execute(&self.pool.writer)
            .await
            .map_err(query_error)?;
        Ok(result.rows_affected())
    }
}
