//! M-Pesa phone number value object.
//!
//! Canonical form is the country code followed by the subscriber number,
//! digits only (`254712345678`).

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::foundation::ValidationError;

/// Message shown when a number cannot be normalized.
pub const INVALID_PHONE_MESSAGE: &str = "Please enter a valid phone number (e.g., 0712345678)";

/// Target format for normalization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhoneFormat {
    pub country_code: String,
    pub subscriber_digits: usize,
}

impl Default for PhoneFormat {
    fn default() -> Self {
        Self {
            country_code: "254".to_string(),
            subscriber_digits: 9,
        }
    }
}

impl PhoneFormat {
    /// Total digits of a canonical number.
    pub fn canonical_len(&self) -> usize {
        self.country_code.len() + self.subscriber_digits
    }

    /// Rewrites user input toward the canonical form without validating it.
    ///
    /// Separators and a leading `+` are dropped; a trunk-prefixed local number
    /// (`0712345678`) gets the country code instead of the `0`.
    pub fn normalize(&self, raw: &str) -> String {
        let digits: String = raw.chars().filter(char::is_ascii_digit).collect();

        if digits.starts_with(&self.country_code) && digits.len() == self.canonical_len() {
            digits
        } else if digits.starts_with('0') && digits.len() == self.subscriber_digits + 1 {
            format!("{}{}", self.country_code, &digits[1..])
        } else {
            digits
        }
    }
}

/// A phone number in canonical form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PhoneNumber(String);

impl PhoneNumber {
    /// Normalizes and validates against the default (Kenyan) format.
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        Self::parse_with(raw, &PhoneFormat::default())
    }

    /// Normalizes and validates against `format`.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::InvalidFormat` when the normalized digits are
    /// not exactly the country code followed by the subscriber digits.
    pub fn parse_with(raw: &str, format: &PhoneFormat) -> Result<Self, ValidationError> {
        let normalized = format.normalize(raw);
        if normalized.len() != format.canonical_len()
            || !normalized.starts_with(&format.country_code)
        {
            return Err(ValidationError::invalid_format(
                "phone_number",
                INVALID_PHONE_MESSAGE,
            ));
        }
        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PhoneNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_number_is_kept() {
        assert_eq!(PhoneNumber::parse("254712345678").unwrap().as_str(), "254712345678");
    }

    #[test]
    fn trunk_prefix_is_replaced_by_country_code() {
        assert_eq!(PhoneNumber::parse("0712345678").unwrap().as_str(), "254712345678");
    }

    #[test]
    fn separators_and_plus_are_stripped() {
        assert_eq!(
            PhoneNumber::parse("+254 712-345 678").unwrap().as_str(),
            "254712345678"
        );
        assert_eq!(PhoneNumber::parse("(0712) 345 678").unwrap().as_str(), "254712345678");
    }

    #[test]
    fn nine_digit_number_is_rejected() {
        let err = PhoneNumber::parse("712345678").unwrap_err();
        assert!(err.to_string().contains(INVALID_PHONE_MESSAGE));
    }

    #[test]
    fn too_long_or_foreign_numbers_are_rejected() {
        assert!(PhoneNumber::parse("2547123456789").is_err());
        assert!(PhoneNumber::parse("255712345678").is_err());
        assert!(PhoneNumber::parse("").is_err());
    }

    #[test]
    fn custom_format_is_honoured() {
        let format = PhoneFormat {
            country_code: "255".into(),
            subscriber_digits: 9,
        };
        assert_eq!(
            PhoneNumber::parse_with("0754000111", &format).unwrap().as_str(),
            "255754000111"
        );
    }
}
