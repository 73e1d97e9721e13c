//! Shared domain types for draftkeep.
//!
//! This crate contains the types exchanged between the editing session,
//! the local draft store and the backend: documents, change lists, drafts,
//! session states, configuration, and their associated error types.
//!
//! No infrastructure dependencies: only serde, chrono and thiserror.

pub mod config;
pub mod document;
pub mod draft;
pub mod error;
pub mod session;
