//! SQLite storage layer.
//!
//! Local storage backed by SQLite with WAL mode and split read/write
//! connection pools.

pub mod local_storage;
pub mod pool;
