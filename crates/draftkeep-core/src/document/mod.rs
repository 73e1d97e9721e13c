//! Document access services.
//!
//! The read-only cache serves the published representation; the gateway
//! serves the editor representation and keeps the cache honest after writes.

pub mod gateway;
pub mod read_only_cache;
