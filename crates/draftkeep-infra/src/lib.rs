//! Infrastructure layer for draftkeep.
//!
//! Contains implementations of the ports defined in `draftkeep-core`:
//! SQLite-backed local storage, the reqwest-based backend client, and the
//! configuration loader.

pub mod config;
pub mod http;
pub mod sqlite;
