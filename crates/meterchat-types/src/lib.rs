//! Shared domain types for meterchat.
//!
//! Users and their token balance, chat messages and conversation history,
//! server-side sessions, completion request/response shapes, configuration,
//! and the error enums shared by every other crate.
//!
//! Zero infrastructure dependencies -- only serde, uuid, chrono, thiserror.

pub mod chat;
pub mod config;
pub mod error;
pub mod llm;
pub mod session;
pub mod user;
