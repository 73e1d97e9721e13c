//! Observability setup for draftkeep binaries.

pub mod tracing_setup;
