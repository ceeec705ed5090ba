//! Local Store Port - durable key/value storage for guest snapshots.
//!
//! The sync coordinator keeps one JSON snapshot per aggregate under a fixed
//! key. Values are opaque strings at this boundary.

use async_trait::async_trait;

/// Errors that can occur during local storage operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StorageError {
    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Failed to serialize snapshot: {0}")]
    SerializationFailed(String),

    #[error("IO error: {0}")]
    IoError(String),
}

/// Port for reading and writing persisted snapshots
#[async_trait]
pub trait LocalStore: Send + Sync {
    /// Read the value stored under `key`.
    ///
    /// # Returns
    /// `None` when nothing has been stored yet
    ///
    /// # Errors
    /// Returns `StorageError` if the backing store cannot be read
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Store `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    /// Returns `StorageError` if the write fails
    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Delete the value under `key`. Missing keys are not an error.
    async fn remove(&self, key: &str) -> Result<(), StorageError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_error_displays_correctly() {
        let err = StorageError::IoError("disk full".to_string());
        assert_eq!(err.to_string(), "IO error: disk full");

        let err = StorageError::InvalidKey("../cart".to_string());
        assert!(err.to_string().contains("../cart"));
    }

    #[test]
    fn local_store_is_object_safe() {
        fn _accepts_dyn(_store: &dyn LocalStore) {}
    }
}
