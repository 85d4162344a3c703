//! HTTP layer for the chat relay.
//!
//! Plain-text responses, form-encoded request bodies, and a session cookie
//! carrying the server-side session id.

pub mod error;
pub mod extractors;
pub mod handlers;
pub mod router;
