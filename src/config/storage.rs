//! Local snapshot storage configuration

use serde::Deserialize;
use std::path::PathBuf;

use super::error::ValidationError;

/// Where guest snapshots are kept
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Directory holding one JSON file per key
    #[serde(default = "default_dir")]
    pub dir: PathBuf,

    #[serde(default = "default_cart_key")]
    pub cart_key: String,

    #[serde(default = "default_wishlist_key")]
    pub wishlist_key: String,
}

impl StorageConfig {
    /// Validate storage configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.dir.as_os_str().is_empty() {
            return Err(ValidationError::MissingRequired("STORAGE_DIR"));
        }
        if !is_valid_key(&self.cart_key) {
            return Err(ValidationError::InvalidStorageKey("cart_key"));
        }
        if !is_valid_key(&self.wishlist_key) {
            return Err(ValidationError::InvalidStorageKey("wishlist_key"));
        }
        if self.cart_key == self.wishlist_key {
            return Err(ValidationError::DuplicateStorageKeys);
        }
        Ok(())
    }
}

fn is_valid_key(key: &str) -> bool {
    !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            dir: default_dir(),
            cart_key: default_cart_key(),
            wishlist_key: default_wishlist_key(),
        }
    }
}

fn default_dir() -> PathBuf {
    PathBuf::from("./data/storefront")
}

fn default_cart_key() -> String {
    "cart".to_string()
}

fn default_wishlist_key() -> String {
    "wishlist".to_string()
}
