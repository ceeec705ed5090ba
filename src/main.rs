//! Headless storefront session.
//!
//! Loads configuration, restores the session from disk (or from the server
//! when a bearer token is configured) and logs what it found.

use std::sync::Arc;

use tracing::{error, info};

use storefront_sync::adapters::{
    FileLocalStore, HttpCommerceApi, StaticTokenProvider, TokioScheduler, TracingNotificationSink,
};
use storefront_sync::application::{SessionPorts, StorefrontSession};
use storefront_sync::config::AppConfig;
use storefront_sync::ports::TokenProvider;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    config.observability.init_tracing()?;
    config.validate()?;

    let tokens = Arc::new(StaticTokenProvider::anonymous());
    if let Some(token) = &config.api.bearer_token {
        tokens.set_token(token.clone());
    }

    let api = Arc::new(HttpCommerceApi::new(
        config.api.base_url.clone(),
        config.api.timeout(),
        tokens.clone(),
    )?);

    let session = StorefrontSession::new(
        SessionPorts {
            local_store: Arc::new(FileLocalStore::new(&config.storage.dir)),
            cart_api: api.clone(),
            wishlist_api: api.clone(),
            gateway: api,
            scheduler: Arc::new(TokioScheduler::new()),
            sink: Arc::new(TracingNotificationSink::new()),
            tokens,
        },
        config.session_settings(),
    );

    if let Err(e) = session.hydrate().await {
        error!(error = %e, "Failed to restore session");
    }

    let cart = session.cart().snapshot().await;
    let wishlist = session.wishlist().snapshot().await;
    info!(
        mode = ?session.mode(),
        backend = %config.api.base_url,
        storage = %config.storage.dir.display(),
        cart_lines = cart.len(),
        cart_units = cart.count(),
        cart_total = %cart.total(),
        wishlist_items = wishlist.count(),
        "Storefront session ready"
    );

    Ok(())
}
