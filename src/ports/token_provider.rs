//! Token provider port - the bearer token that decides guest vs signed in.

use secrecy::SecretString;

use crate::domain::foundation::SessionMode;

/// Holds the current bearer token, if any.
///
/// Refresh and expiry are handled elsewhere; the core only cares whether a
/// token is present.
pub trait TokenProvider: Send + Sync {
    fn bearer_token(&self) -> Option<SecretString>;

    fn set_token(&self, token: SecretString);

    fn clear_token(&self);

    fn session_mode(&self) -> SessionMode {
        SessionMode::from_token_present(self.bearer_token().is_some())
    }
}
