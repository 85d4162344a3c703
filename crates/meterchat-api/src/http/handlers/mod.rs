//! Route handlers.

pub mod auth;
pub mod chat;
pub mod misc;
