//! Infrastructure layer for meterchat.
//!
//! Contains implementations of the port traits defined in `meterchat-core`:
//! SQLite credential and session stores, Argon2id password hashing, the
//! OpenAI-compatible completion provider, and the config loader.

pub mod config;
pub mod crypto;
pub mod llm;
pub mod sqlite;
