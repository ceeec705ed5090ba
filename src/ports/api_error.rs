//! Errors shared by every remote port.

use crate::domain::foundation::{DomainError, ErrorCode};

/// Failure of a call to the storefront backend.
///
/// A 401 is reported as [`ApiError::Unauthorized`] and is never retried by
/// the core; the surrounding app is expected to send the user to sign in.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Request rejected ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("Failed to decode response: {0}")]
    Decode(String),
}

impl ApiError {
    pub fn network(message: impl Into<String>) -> Self {
        ApiError::Network(message.into())
    }

    pub fn rejected(status: u16, message: impl Into<String>) -> Self {
        ApiError::Rejected {
            status,
            message: message.into(),
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Unauthorized)
    }

    /// The upstream message of a rejection, if it carried a non-empty one.
    pub fn upstream_message(&self) -> Option<&str> {
        match self {
            ApiError::Rejected { message, .. } if !message.trim().is_empty() => Some(message),
            _ => None,
        }
    }
}

impl From<ApiError> for DomainError {
    fn from(err: ApiError) -> Self {
        let code = match err {
            ApiError::Network(_) => ErrorCode::NetworkError,
            ApiError::Unauthorized => ErrorCode::Unauthorized,
            ApiError::Rejected { .. } => ErrorCode::UpstreamRejected,
            ApiError::Decode(_) => ErrorCode::InternalError,
        };
        DomainError::new(code, err.to_string())
    }
}
