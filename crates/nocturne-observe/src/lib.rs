//! Observability setup for Nocturne.

pub mod tracing_setup;
