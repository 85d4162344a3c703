//! SQLite credential store.
//!
//! Implements `CredentialStore` from `meterchat-core`. Balance changes are
//! single `UPDATE ... RETURNING` statements on the writer pool, so a debit
//! either applies in full against the current balance or not at all.

use chrono::Utc;
use meterchat_core::repository::user::CredentialStore;
use meterchat_types::error::RepositoryError;
use meterchat_types::user::{NewUser, User};
use sqlx::Row;

use super::pool::DatabasePool;
use super::{format_datetime, parse_datetime, query_error};

/// SQLite-backed implementation of `CredentialStore`.
#[derive(Clone)]
pub struct SqliteCredentialStore {
    pool: DatabasePool,
}

impl SqliteCredentialStore {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }

    async fn exists(&self, username: &str) -> Result<bool, RepositoryError> {
        let row = sqlx::query("SELECT 1 FROM users WHERE username = ?")
            .bind(username)
            .fetch_optional(&self.pool.writer)
            .await
            .map_err(query_error)?;
        Ok(row.is_some())
    }
}

// ---------------------------------------------------------------------------
// Row mapping
// ---------------------------------------------------------------------------

struct UserRow {
    username: String,
    password_hash: String,
    token_balance: i64,
    created_at: String,
    updated_at: String,
}

impl UserRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            username: row.try_get("username")?,
            password_hash: row.try_get("password_hash")?,
            token_balance: row.try_get("token_balance")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn into_user(self) -> Result<User, RepositoryError> {
        Ok(User {
            token_balance: balance_from_db(self.token_balance)?,
            created_at: parse_datetime(&self.created_at)?,
            updated_at: parse_datetime(&self.updated_at)?,
            username: self.username,
            password_hash: self.password_hash,
        })
    }
}

fn balance_from_db(value: i64) -> Result<u64, RepositoryError> {
    u64::try_from(value).map_err(|_| RepositoryError::Query(format!("invalid balance: {value}")))
}

fn amount_to_db(amount: u64) -> Result<i64, RepositoryError> {
    i64::try_from(amount).map_err(|_| RepositoryError::Query(format!("amount out of range: {amount}")))
}

// ---------------------------------------------------------------------------
// CredentialStore implementation
// ---------------------------------------------------------------------------

impl CredentialStore for SqliteCredentialStore {
    async fn find_user(&self, username: &str) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM users WHERE username = ?")
            .bind(username)
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(query_error)?;

        match row {
            Some(row) => {
                let user_row = UserRow::from_row(&row).map_err(query_error)?;
                Ok(Some(user_row.into_user()?))
            }
            None => Ok(None),
        }
    }

    async fn create_user(&self, user: &NewUser) -> Result<User, RepositoryError> {
        let now = Utc::now();
        let result = sqlx::query(
            r#"INSERT INTO users (username, password_hash, token_balance, created_at, updated_at)
               VALUES (?, ?, ?, ?, ?)"#,
        )
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(amount_to_db(user.token_balance)?)
        .bind(format_datetime(&now))
        .bind(format_datetime(&now))
        .execute(&self.pool.writer)
        .await;

        match result {
            Ok(_) => Ok(User {
                username: user.username.clone(),
                password_hash: user.password_hash.clone(),
                token_balance: user.token_balance,
                created_at: now,
                updated_at: now,
            }),
            Err(sqlx::Error::Database(db_err)) if db_err.message().contains("UNIQUE") => Err(
                RepositoryError::Conflict(format!("username '{}' already exists", user.username)),
            ),
            Err(e) => Err(query_error(e)),
        }
    }

    async fn balance(&self, username: &str) -> Result<u64, RepositoryError> {
        // Writer pool: the balance must reflect every committed debit.
        let row = sqlx::query("SELECT token_balance FROM users WHERE username = ?")
            .bind(username)
            .fetch_optional(&self.pool.writer)
            .await
            .map_err(query_error)?
            .ok_or(RepositoryError::NotFound)?;

        let balance: i64 = row.try_get("token_balance").map_err(query_error)?;
        balance_from_db(balance)
    }

    async fn debit(&self, username: &str, amount: u64) -> Result<u64, RepositoryError> {
        let amount_db = amount_to_db(amount)?;
        let row = sqlx::query(
            r#"UPDATE users
               SET token_balance = token_balance - ?, updated_at = ?
               WHERE username = ? AND token_balance >= ?
               RETURNING token_balance"#,
        )
        .bind(amount_db)
        .bind(format_datetime(&Utc::now()))
        .bind(username)
        .bind(amount_db)
        .fetch_optional(&self.pool.writer)
        .await
        .map_err(query_error)?;

        match row {
            Some(row) => {
                let balance: i64 = row.try_get("token_balance").map_err(query_error)?;
                balance_from_db(balance)
            }
            None if self.exists(username).await? => {
                Err(RepositoryError::InsufficientBalance { requested: amount })
            }
            None => Err(RepositoryError::NotFound),
        }
    }

    async fn grant(&self, username: &str, amount: u64) -> Result<u64, RepositoryError> {
        let row = sqlx::query(
            r#"UPDATE users
               SET token_balance = token_balance + ?, updated_at = ?
               WHERE username = ?
               RETURNING token_balance"#,
        )
        .bind(amount_to_db(amount)?)
        .bind(format_datetime(&Utc::now()))
        .bind(username)
        .fetch_optional(&self.pool.writer)
        .await
        .map_err(query_error)?
        .ok_or(RepositoryError::NotFound)?;

        let balance: i64 = row.try_get("token_balance").map_err(query_error)?;
        balance_from_db(balance)
    }
}
