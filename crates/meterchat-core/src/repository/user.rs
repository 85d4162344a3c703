//! CredentialStore trait definition.

use meterchat_types::error::RepositoryError;
use meterchat_types::user::{NewUser, User};

/// Persistence for users and their token balances.
///
/// Balance mutations are single conditional statements at the store
/// boundary, so a debit can never take a balance below zero even when two
/// requests race past the budget gate.
pub trait CredentialStore: Send + Sync {
    /// Look up a user by username.
    fn find_user(
        &self,
        username: &str,
    ) -> impl std::future::Future<Output = Result<Option<User>, RepositoryError>> + Send;

    /// Create a user. Returns `RepositoryError::Conflict` if the username is taken.
    fn create_user(
        &self,
        user: &NewUser,
    ) -> impl std::future::Future<Output = Result<User, RepositoryError>> + Send;

    /// Current balance. Returns `RepositoryError::NotFound` for unknown users.
    fn balance(
        &self,
        username: &str,
    ) -> impl std::future::Future<Output = Result<u64, RepositoryError>> + Send;

    /// Subtract `amount` only if the balance covers it; returns the new balance.
    ///
    /// Fails with `RepositoryError::InsufficientBalance` (balance untouched)
    /// when it does not, or `RepositoryError::NotFound` for unknown users.
    fn debit(
        &self,
        username: &str,
        amount: u64,
    ) -> impl std::future::Future<Output = Result<u64, RepositoryError>> + Send;

    /// Add `amount` to the balance; returns the new balance.
    fn grant(
        &self,
        username: &str,
        amount: u64,
    ) -> impl std::future::Future<Output = Result<u64, RepositoryError>> + Send;
}
