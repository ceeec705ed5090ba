//! Payment configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;
use crate::application::checkout::CheckoutSettings;
use crate::domain::payment::PhoneFormat;

/// M-Pesa confirmation polling and phone number format
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentConfig {
    /// Seconds between status checks
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,

    /// Status checks before giving up
    #[serde(default = "default_max_poll_attempts")]
    pub max_poll_attempts: u32,

    /// Country calling code prefixed to canonical phone numbers
    #[serde(default = "default_country_code")]
    pub country_code: String,

    /// Digits after the country code
    #[serde(default = "default_subscriber_digits")]
    pub subscriber_digits: usize,
}

impl PaymentConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    /// Longest a checkout can wait for confirmation
    pub fn poll_ceiling(&self) -> Duration {
        self.poll_interval() * self.max_poll_attempts
    }

    pub fn phone_format(&self) -> PhoneFormat {
        PhoneFormat {
            country_code: self.country_code.clone(),
            subscriber_digits: self.subscriber_digits,
        }
    }

    pub fn checkout_settings(&self) -> CheckoutSettings {
        CheckoutSettings {
            poll_interval: self.poll_interval(),
            max_attempts: self.max_poll_attempts,
            phone_format: self.phone_format(),
        }
    }

    /// Validate payment configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.poll_interval_secs == 0 {
            return Err(ValidationError::InvalidPollInterval);
        }
        if self.max_poll_attempts == 0 || self.max_poll_attempts > 1000 {
            return Err(ValidationError::InvalidPollAttempts);
        }
        if self.country_code.is_empty()
            || self.country_code.len() > 3
            || !self.country_code.chars().all(|c| c.is_ascii_digit())
        {
            return Err(ValidationError::InvalidCountryCode);
        }
        if !(4..=12).contains(&self.subscriber_digits) {
            return Err(ValidationError::InvalidSubscriberDigits);
        }
        Ok(())
    }
}

impl Default for PaymentConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval(),
            max_poll_attempts: default_max_poll_attempts(),
            country_code: default_country_code(),
            subscriber_digits: default_subscriber_digits(),
        }
    }
}

fn default_poll_interval() -> u64 {
    5
}

fn default_max_poll_attempts() -> u32 {
    30
}

fn default_country_code() -> String {
    "254".to_string()
}

fn default_subscriber_digits() -> usize {
    9
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_give_150_second_ceiling() {
        let config = PaymentConfig::default();
        assert_eq!(config.poll_ceiling(), Duration::from_secs(150));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_checkout_settings_mirror_config() {
        let config = PaymentConfig {
            poll_interval_secs: 2,
            max_poll_attempts: 10,
            ..Default::default()
        };
        let settings = config.checkout_settings();
        assert_eq!(settings.poll_interval, Duration::from_secs(2));
        assert_eq!(settings.max_attempts, 10);
        assert_eq!(settings.phone_format, PhoneFormat::default());
    }

    #[test]
    fn test_rejects_zero_attempts() {
        let config = PaymentConfig {
            max_poll_attempts: 0,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ValidationError::InvalidPollAttempts));
    }

    #[test]
    fn test_rejects_non_numeric_country_code() {
        let config = PaymentConfig {
            country_code: "+254".to_string(),
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ValidationError::InvalidCountryCode));
    }
}
