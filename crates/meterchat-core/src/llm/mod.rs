//! Completion provider abstractions.
//!
//! `CompletionProvider` is the port every upstream model API implements;
//! `BoxCompletionProvider` erases the concrete type so application state can
//! hold a provider chosen (or faked) at runtime.

pub mod box_provider;
pub mod provider;
