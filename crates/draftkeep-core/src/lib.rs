//! Draft reconciliation logic and port trait definitions for draftkeep.
//!
//! This crate defines the "ports" (backend and local storage traits) that the
//! infrastructure layer implements, plus the services built on them: the
//! draft store, the read-only document cache, the editable-document gateway
//! and the editing session controller. It depends only on `draftkeep-types`
//! and never on `draftkeep-infra` or any database/HTTP crate.

pub mod document;
pub mod repository;
pub mod session;
pub mod storage;

#[cfg(test)]
pub(crate) mod testing;
