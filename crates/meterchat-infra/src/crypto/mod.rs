//! Cryptographic operations for meterchat.
//!
//! - `password`: Argon2id password hashing for user credentials

pub mod password;
