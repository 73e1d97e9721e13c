//! Local draft persistence.
//!
//! Defines the `LocalStorage` medium trait, an in-process implementation,
//! and the `DraftStore` that keeps one pending change list per document.
//! Persistent media live in draftkeep-infra.

pub mod draft_store;
pub mod local_storage;
pub mod memory;
