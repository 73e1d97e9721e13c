//! Local key-value storage medium trait.
//!
//! Models a browser-style local store: string keys, string values, and the
//! possibility that the medium is disabled or full. Implementations live in
//! this crate (`memory`) and in draftkeep-infra (SQLite).

use draftkeep_types::error::RepositoryError;

/// Trait for a string key-value persistent medium.
///
/// Uses RPITIT (native async fn in traits, Rust 2024 edition).
pub trait LocalStorage: Send + Sync {
    /// Get a value by key. Returns None if the key does not exist.
    fn get_item(
        &self,
        key: &str,
    ) -> impl std::future::Future<Output = Result<Option<String>, RepositoryError>> + Send;

    /// Set a value for a key (upsert).
    fn set_item(
        &self,
        key: &str,
        value: &str,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Delete a key. No-op if key does not exist.
    fn remove_item(
        &self,
        key: &str,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// List all stored keys.
    fn keys(&self) -> impl std::future::Future<Output = Result<Vec<String>, RepositoryError>> + Send;
}
