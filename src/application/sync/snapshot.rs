//! Persisted guest snapshots.
//!
//! Layout: `{"items": [...], "lastUpdated": "<RFC 3339>"}`, one per key.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::domain::foundation::Timestamp;
use crate::ports::{LocalStore, StorageError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot<T> {
    pub items: Vec<T>,
    pub last_updated: Timestamp,
}

impl<T> Snapshot<T> {
    pub fn new(items: Vec<T>) -> Self {
        Self {
            items,
            last_updated: Timestamp::now(),
        }
    }
}

/// Read the snapshot under `key`.
///
/// A missing, unreadable or corrupted snapshot yields an empty list; the
/// session continues with an empty aggregate.
pub async fn read_items<T: DeserializeOwned>(store: &dyn LocalStore, key: &str) -> Vec<T> {
    let raw = match store.get(key).await {
        Ok(Some(raw)) => raw,
        Ok(None) => return Vec::new(),
        Err(e) => {
            tracing::warn!(key, error = %e, "Failed to read snapshot, starting empty");
            return Vec::new();
        }
    };

    match serde_json::from_str::<Snapshot<T>>(&raw) {
        Ok(snapshot) => snapshot.items,
        Err(e) => {
            tracing::warn!(key, error = %e, "Discarding unreadable snapshot");
            Vec::new()
        }
    }
}

/// Write `items` as the snapshot under `key`.
pub async fn write_items<T: Serialize + Clone>(
    store: &dyn LocalStore,
    key: &str,
    items: &[T],
) -> Result<(), StorageError> {
    let json = serde_json::to_string(&Snapshot::new(items.to_vec()))
        .map_err(|e| StorageError::SerializationFailed(e.to_string()))?;
    store.set(key, &json).await
}
