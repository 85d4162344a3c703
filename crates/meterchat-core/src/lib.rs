//! Business logic and port trait definitions for meterchat.
//!
//! This crate defines the "ports" (credential store, session store,
//! completion provider, password hasher) that the infrastructure layer
//! implements, plus the metered chat-turn orchestration built on them.
//! It depends only on `meterchat-types` -- never on `meterchat-infra` or any
//! database/IO crate.

pub mod chat;
pub mod error;
pub mod llm;
pub mod repository;
pub mod service;

#[cfg(test)]
pub(crate) mod test_support;
