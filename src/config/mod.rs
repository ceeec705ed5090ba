//! Application configuration module
//!
//! This module provides type-safe configuration loading from environment variables
//! using the `config` and `dotenvy` crates. Configuration is loaded with the
//! `STOREFRONT` prefix and nested values use double underscores as separators.
//! Every setting has a default, so an empty environment yields a working
//! development configuration.
//!
//! # Example
//!
//! ```no_run
//! use storefront_sync::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//!
//! println!("Backend at {}", config.api.base_url);
//! ```

mod api;
mod error;
mod notifications;
mod observability;
mod payment;
mod storage;

pub use api::ApiConfig;
pub use error::{ConfigError, ValidationError};
pub use notifications::NotificationConfig;
pub use observability::{LogFormat, ObservabilityConfig};
pub use payment::PaymentConfig;
pub use storage::StorageConfig;

use serde::Deserialize;

use crate::application::SessionSettings;

/// Root application configuration
///
/// Load using [`AppConfig::load()`] which reads from environment variables.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Storefront backend (base URL, timeout)
    #[serde(default)]
    pub api: ApiConfig,

    /// M-Pesa confirmation polling
    #[serde(default)]
    pub payment: PaymentConfig,

    /// Guest snapshot storage
    #[serde(default)]
    pub storage: StorageConfig,

    /// Toast defaults
    #[serde(default)]
    pub notifications: NotificationConfig,

    /// Logging
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// This function:
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads environment variables with `STOREFRONT` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    /// 4. Deserializes into typed configuration structs
    ///
    /// # Environment Variable Format
    ///
    /// - `STOREFRONT__API__BASE_URL=https://...` -> `api.base_url = ...`
    /// - `STOREFRONT__PAYMENT__MAX_POLL_ATTEMPTS=30` -> `payment.max_poll_attempts = 30`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if values cannot be parsed into expected types.
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present (development)
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("STOREFRONT")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if any configuration value is invalid.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.api.validate()?;
        self.payment.validate()?;
        self.storage.validate()?;
        self.observability.validate()?;
        Ok(())
    }

    /// Storage keys and checkout parameters for a session
    pub fn session_settings(&self) -> SessionSettings {
        SessionSettings {
            cart_key: self.storage.cart_key.clone(),
            wishlist_key: self.storage.wishlist_key.clone(),
            checkout: self.payment.checkout_settings(),
        }
    }
}
