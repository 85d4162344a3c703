use thiserror::Error;

/// Errors from repository operations (credential and session stores).
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database connection error")]
    Connection,

    #[error("query error: {0}")]
    Query(String),

    #[error("entity not found")]
    NotFound,

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("insufficient balance: requested {requested}")]
    InsufficientBalance { requested: u64 },
}
