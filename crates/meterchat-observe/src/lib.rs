//! Observability setup for meterchat: the global tracing subscriber and an
//! optional OpenTelemetry bridge.

pub mod tracing_setup;
