//! Configuration error types

use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),
}

/// Errors that can occur during configuration validation
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Required configuration missing: {0}")]
    MissingRequired(&'static str),

    #[error("API base URL must start with http:// or https://")]
    InvalidApiUrl,

    #[error("Invalid request timeout")]
    InvalidTimeout,

    #[error("Payment poll interval must be at least one second")]
    InvalidPollInterval,

    #[error("Payment poll attempts must be between 1 and 1000")]
    InvalidPollAttempts,

    #[error("Country code must be 1 to 3 digits")]
    InvalidCountryCode,

    #[error("Subscriber digits must be between 4 and 12")]
    InvalidSubscriberDigits,

    #[error("Storage key {0} may only contain letters, digits, '-' and '_'")]
    InvalidStorageKey(&'static str),

    #[error("Cart and wishlist storage keys must differ")]
    DuplicateStorageKeys,

    #[error("Invalid log filter: {0}")]
    InvalidLogFilter(String),
}
