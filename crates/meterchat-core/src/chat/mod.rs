//! Metered chat turns.
//!
//! - [`accumulator`] builds the candidate conversation for a turn.
//! - [`budget`] estimates its cost and admits or rejects it.
//! - [`service`] runs the whole turn against the stores and the provider.

pub mod accumulator;
pub mod budget;
pub mod service;
