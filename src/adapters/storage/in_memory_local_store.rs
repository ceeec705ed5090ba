//! In-Memory Local Store Adapter
//!
//! Keeps values in a map. Used by tests and by sessions that should not
//! touch the disk.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::ports::{LocalStore, StorageError};

/// In-memory key/value storage
#[derive(Debug, Clone, Default)]
pub struct InMemoryLocalStore {
    values: Arc<RwLock<HashMap<String, String>>>,
    fail_writes: Arc<RwLock<bool>>,
}

impl InMemoryLocalStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a value, e.g. a snapshot left over from a previous run
    pub async fn insert(&self, key: impl Into<String>, value: impl Into<String>) {
        self.values.write().await.insert(key.into(), value.into());
    }

    /// Make every subsequent `set` fail with an IO error
    pub async fn set_fail_writes(&self, fail: bool) {
        *self.fail_writes.write().await = fail;
    }

    pub async fn len(&self) -> usize {
        self.values.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.values.read().await.is_empty()
    }
}

#[async_trait]
impl LocalStore for InMemoryLocalStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.values.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        if *self.fail_writes.read().await {
            return Err(StorageError::IoError("simulated write failure".to_string()));
        }
        self.values
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.values.write().await.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_in_memory_set_get_remove() {
        let store = InMemoryLocalStore::new();
        assert!(store.is_empty().await);

        store.set("cart", "{}").await.unwrap();
        assert_eq!(store.get("cart").await.unwrap().as_deref(), Some("{}"));
        assert_eq!(store.len().await, 1);

        store.remove("cart").await.unwrap();
        assert_eq!(store.get("cart").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_in_memory_clones_share_state() {
        let store = InMemoryLocalStore::new();
        let clone = store.clone();

        store.set("wishlist", "[]").await.unwrap();

        assert_eq!(clone.get("wishlist").await.unwrap().as_deref(), Some("[]"));
    }

    #[tokio::test]
    async fn test_in_memory_write_failure() {
        let store = InMemoryLocalStore::new();
        store.set_fail_writes(true).await;

        let result = store.set("cart", "{}").await;

        assert!(matches!(result, Err(StorageError::IoError(_))));
        assert_eq!(store.get("cart").await.unwrap(), None);
    }
}
