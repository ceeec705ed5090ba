//! StorefrontSession - everything one UI lifetime needs, wired once.
//!
//! The session owns both sync coordinators and the token provider, and hands
//! out checkout flows configured from the same settings. Signing in sets the
//! token and migrates both aggregates; signing out clears the token and puts
//! both back in guest mode.

use std::sync::Arc;

use secrecy::SecretString;
use tracing::{info, warn};

use crate::application::checkout::{CheckoutSettings, MpesaCheckout};
use crate::application::sync::{CartSync, SyncError, WishlistSync};
use crate::domain::foundation::SessionMode;
use crate::ports::{
    CartApi, LocalStore, NotificationSink, PaymentGateway, Scheduler, TokenProvider, WishlistApi,
};

/// Adapters a session is built from.
#[derive(Clone)]
pub struct SessionPorts {
    pub local_store: Arc<dyn LocalStore>,
    pub cart_api: Arc<dyn CartApi>,
    pub wishlist_api: Arc<dyn WishlistApi>,
    pub gateway: Arc<dyn PaymentGateway>,
    pub scheduler: Arc<dyn Scheduler>,
    pub sink: Arc<dyn NotificationSink>,
    pub tokens: Arc<dyn TokenProvider>,
}

/// Storage keys and checkout parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSettings {
    pub cart_key: String,
    pub wishlist_key: String,
    pub checkout: CheckoutSettings,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            cart_key: "cart".to_string(),
            wishlist_key: "wishlist".to_string(),
            checkout: CheckoutSettings::default(),
        }
    }
}

pub struct StorefrontSession {
    cart: CartSync,
    wishlist: WishlistSync,
    ports: SessionPorts,
    checkout: CheckoutSettings,
}

impl StorefrontSession {
    /// Builds a session in the mode implied by the token provider.
    pub fn new(ports: SessionPorts, settings: SessionSettings) -> Self {
        let mode = ports.tokens.session_mode();
        let cart = CartSync::with_ports(
            Arc::clone(&ports.local_store),
            settings.cart_key,
            Arc::clone(&ports.cart_api),
            Arc::clone(&ports.sink),
            mode,
        );
        let wishlist = WishlistSync::with_ports(
            Arc::clone(&ports.local_store),
            settings.wishlist_key,
            Arc::clone(&ports.wishlist_api),
            Arc::clone(&ports.sink),
            mode,
        );

        Self {
            cart,
            wishlist,
            ports,
            checkout: settings.checkout,
        }
    }

    pub fn cart(&self) -> &CartSync {
        &self.cart
    }

    pub fn wishlist(&self) -> &WishlistSync {
        &self.wishlist
    }

    pub fn mode(&self) -> SessionMode {
        self.ports.tokens.session_mode()
    }

    /// Loads both aggregates from their active stores.
    ///
    /// # Errors
    ///
    /// The first failure; both loads are attempted regardless.
    pub async fn hydrate(&self) -> Result<(), SyncError> {
        let cart = self.cart.hydrate().await;
        let wishlist = self.wishlist.hydrate().await;
        cart?;
        wishlist?;
        Ok(())
    }

    /// Stores the token and migrates guest contents to the server.
    ///
    /// Migration runs once per sign-in; calling this again with the session
    /// already migrated only replaces the token.
    ///
    /// # Errors
    ///
    /// The first migration failure; both aggregates are attempted and a
    /// retry resumes where each one stopped.
    pub async fn sign_in(&self, token: SecretString) -> Result<(), SyncError> {
        self.ports.tokens.set_token(token);

        let cart = self.cart.sign_in().await;
        let wishlist = self.wishlist.sign_in().await;

        match (&cart, &wishlist) {
            (Ok(c), Ok(w)) => info!(cart_lines = c.len(), wishlist_items = w.count(), "Signed in"),
            _ => warn!("Signed in with incomplete migration"),
        }
        cart?;
        wishlist?;
        Ok(())
    }

    pub async fn sign_out(&self) {
        self.ports.tokens.clear_token();
        self.cart.sign_out().await;
        self.wishlist.sign_out().await;
        info!("Signed out");
    }

    /// A checkout flow using this session's gateway, scheduler and sink.
    pub fn checkout(&self) -> MpesaCheckout {
        MpesaCheckout::new(
            Arc::clone(&self.ports.gateway),
            Arc::clone(&self.ports.scheduler),
            Arc::clone(&self.ports.sink),
            self.checkout.clone(),
        )
    }
}
