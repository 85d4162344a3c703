//! PasswordHasher trait for credential hashing.
//!
//! Defined in meterchat-core so the auth service can hash and verify
//! passwords without coupling to an algorithm. The `Argon2PasswordHasher`
//! adapter lives in meterchat-infra.

/// Hashing failed (e.g., the algorithm rejected its parameters).
#[derive(Debug, thiserror::Error)]
#[error("password hashing failed: {0}")]
pub struct HashError(pub String);

/// Abstraction over password hashing.
pub trait PasswordHasher: Send + Sync {
    /// Produce a self-describing hash string (salt included).
    fn hash_password(&self, password: &str) -> Result<String, HashError>;

    /// Check a password against a stored hash. Malformed hashes verify as false.
    fn verify_password(&self, password: &str, hash: &str) -> bool;
}
