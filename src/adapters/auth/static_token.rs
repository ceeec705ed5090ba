//! In-process bearer token holder.

use secrecy::SecretString;
use std::sync::{PoisonError, RwLock};

use crate::ports::TokenProvider;

/// Token provider backed by a value set at sign-in.
///
/// # Example
///
/// ```ignore
/// let tokens = StaticTokenProvider::anonymous();
/// tokens.set_token(SecretString::new(access_token));
/// assert!(tokens.session_mode().is_authenticated());
/// ```
#[derive(Debug, Default)]
pub struct StaticTokenProvider {
    token: RwLock<Option<SecretString>>,
}

impl StaticTokenProvider {
    /// No token; the session starts in guest mode.
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Starts signed in with `token`.
    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: RwLock::new(Some(SecretString::new(token.into()))),
        }
    }
}

impl TokenProvider for StaticTokenProvider {
    fn bearer_token(&self) -> Option<SecretString> {
        self.token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn set_token(&self, token: SecretString) {
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = Some(token);
    }

    fn clear_token(&self) {
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::SessionMode;
    use secrecy::ExposeSecret;

    #[test]
    fn anonymous_is_guest() {
        let tokens = StaticTokenProvider::anonymous();
        assert!(tokens.bearer_token().is_none());
        assert_eq!(tokens.session_mode(), SessionMode::Guest);
    }

    #[test]
    fn set_and_clear_token() {
        let tokens = StaticTokenProvider::anonymous();

        tokens.set_token(SecretString::new("abc".to_string()));
        assert_eq!(tokens.session_mode(), SessionMode::Authenticated);
        assert_eq!(tokens.bearer_token().unwrap().expose_secret(), "abc");

        tokens.clear_token();
        assert_eq!(tokens.session_mode(), SessionMode::Guest);
    }

    #[test]
    fn with_token_starts_authenticated() {
        let tokens = StaticTokenProvider::with_token("xyz");
        assert!(tokens.session_mode().is_authenticated());
    }
}
