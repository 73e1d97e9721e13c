//! In-process local storage backed by `DashMap`.
//!
//! Values live for the lifetime of the process. Cloning produces a shared
//! view of the same map. An optional byte capacity makes writes fail with
//! `QuotaExceeded` once full, and a disabled instance fails every call.

use std::sync::Arc;

use dashmap::DashMap;

use draftkeep_types::error::RepositoryError;

use super::local_storage::LocalStorage;

#[derive(Debug, Clone, Default)]
pub struct MemoryLocalStorage {
    entries: Arc<DashMap<String, String>>,
    capacity_bytes: Option<usize>,
    disabled: bool,
}

impl MemoryLocalStorage {
    /// Create an empty, unbounded store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that rejects writes once keys plus values exceed
    /// `capacity_bytes`.
    pub fn with_capacity_bytes(capacity_bytes: usize) -> Self {
        Self {
            capacity_bytes: Some(capacity_bytes),
            ..Self::default()
        }
    }

    /// Create a store that behaves like a medium the user has switched off.
    pub fn disabled() -> Self {
        Self {
            disabled: true,
            ..Self::default()
        }
    }

    fn check_enabled(&self) -> Result<(), RepositoryError> {
        if self.disabled {
            Err(RepositoryError::Unavailable)
        } else {
            Ok(())
        }
    }

    fn used_bytes_without(&self, key: &str) -> usize {
        self.entries
            .iter()
            .filter(|e| e.key() != key)
            .map(|e| e.key().len() + e.value().len())
            .sum()
    }
}

impl LocalStorage for MemoryLocalStorage {
    async fn get_item(&self, key: &str) -> Result<Option<String>, RepositoryError> {
        self.check_enabled()?;
        Ok(self.entries.get(key).map(|v| v.value().clone()))
    }

    async fn set_item(&self, key: &str, value: &str) -> Result<(), RepositoryError> {
        self.check_enabled()?;
        if let Some(capacity) = self.capacity_bytes {
            if self.used_bytes_without(key) + key.len() + value.len() > capacity {
                return Err(RepositoryError::QuotaExceeded);
            }
        }
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove_item(&self, key: &str) -> Result<(), RepositoryError> {
        self.check_enabled()?;
        self.entries.remove(key);
        Ok(())
    }

    async fn keys(&self) -> Result<Vec<String>, RepositoryError> {
        self.check_enabled()?;
        Ok(self.entries.iter().map(|e| e.key().clone()).collect())
    }
}
