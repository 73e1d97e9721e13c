//! Backend trait definitions (ports).
//!
//! These traits define the remote interface that the infrastructure layer
//! (draftkeep-infra) implements. The core crate never depends on any
//! specific transport.

pub mod backend;
