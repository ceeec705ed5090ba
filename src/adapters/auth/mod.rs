//! Authentication adapters.
//!
//! Implementations of the `TokenProvider` port:
//!
//! - `StaticTokenProvider` - Holds the token handed over at sign-in

mod static_token;

pub use static_token::StaticTokenProvider;
