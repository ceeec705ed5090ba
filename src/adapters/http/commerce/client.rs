//! Storefront backend client.
//!
//! Implements `CartApi`, `WishlistApi` and `PaymentGateway` over the
//! backend's REST endpoints using `reqwest`.
//!
//! Mutating cart and wishlist endpoints do not return a reliable canonical
//! list, so each mutation is followed by a fetch of the whole list.
//!
//! # Configuration
//!
//! ```ignore
//! let api = HttpCommerceApi::new("http://localhost:8000/api", Duration::from_secs(30), tokens)?;
//! ```

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{RequestBuilder, StatusCode};
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;

use crate::domain::cart::{LineItem, NewLineItem};
use crate::domain::foundation::{ItemId, ProductId, TransactionId};
use crate::domain::wishlist::{NewSavedItem, SavedItem};
use crate::ports::{
    ApiError, CartApi, InitiationRequest, InitiationResponse, PaymentGateway,
    PaymentStatusReport, TokenProvider, WishlistApi,
};

use super::dto::{
    error_message, into_lines, into_saved_items, AddCartItemBody, AddWishlistItemBody,
    CartItemDto, ListPayload, MpesaInitiateBody, MpesaInitiateDto, UpdateCartItemBody,
    WishlistItemDto,
};

/// HTTP client for the storefront backend.
pub struct HttpCommerceApi {
    base_url: String,
    http_client: reqwest::Client,
    tokens: Arc<dyn TokenProvider>,
}

impl HttpCommerceApi {
    /// Create a client for `base_url` (e.g. `http://localhost:8000/api`).
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Network` if the HTTP client cannot be built.
    pub fn new(
        base_url: impl Into<String>,
        timeout: Duration,
        tokens: Arc<dyn TokenProvider>,
    ) -> Result<Self, ApiError> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::network(e.to_string()))?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http_client,
            tokens,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorize(&self, builder: RequestBuilder) -> RequestBuilder {
        match self.tokens.bearer_token() {
            Some(token) => builder.bearer_auth(token.expose_secret()),
            None => builder,
        }
    }

    /// Sends the request and maps transport and status failures.
    async fn dispatch(&self, builder: RequestBuilder) -> Result<reqwest::Response, ApiError> {
        let response = self
            .authorize(builder)
            .send()
            .await
            .map_err(|e| ApiError::network(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            tracing::warn!("Backend rejected bearer token");
            return Err(ApiError::Unauthorized);
        }

        if !status.is_success() {
            let body: serde_json::Value = response.json().await.unwrap_or_default();
            let message = error_message(&body).unwrap_or_else(|| {
                format!(
                    "API Error: {} {}",
                    status.as_u16(),
                    status.canonical_reason().unwrap_or_default()
                )
            });
            tracing::warn!(status = status.as_u16(), error = %message, "Backend request failed");
            return Err(ApiError::rejected(status.as_u16(), message));
        }

        Ok(response)
    }

    async fn send_json<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, ApiError> {
        self.dispatch(builder)
            .await?
            .json::<T>()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))
    }

    async fn send_ignoring_body(&self, builder: RequestBuilder) -> Result<(), ApiError> {
        self.dispatch(builder).await.map(|_| ())
    }
}

#[async_trait]
impl CartApi for HttpCommerceApi {
    async fn fetch_cart(&self) -> Result<Vec<LineItem>, ApiError> {
        let payload: ListPayload<CartItemDto> = self
            .send_json(self.http_client.get(self.url("/cart/")))
            .await?;
        into_lines(payload.into_vec())
    }

    async fn add_cart_item(&self, item: &NewLineItem) -> Result<Vec<LineItem>, ApiError> {
        let request = self
            .http_client
            .post(self.url("/cart/items/"))
            .json(&AddCartItemBody::from(item));
        self.send_ignoring_body(request).await?;
        self.fetch_cart().await
    }

    async fn update_cart_item(
        &self,
        id: &ItemId,
        quantity: u32,
    ) -> Result<Vec<LineItem>, ApiError> {
        let request = self
            .http_client
            .patch(self.url(&format!("/cart/items/{}/", id)))
            .json(&UpdateCartItemBody { quantity });
        self.send_ignoring_body(request).await?;
        self.fetch_cart().await
    }

    async fn remove_cart_item(&self, id: &ItemId) -> Result<Vec<LineItem>, ApiError> {
        let request = self
            .http_client
            .delete(self.url(&format!("/cart/items/{}/", id)));
        self.send_ignoring_body(request).await?;
        self.fetch_cart().await
    }

    async fn clear_cart(&self) -> Result<Vec<LineItem>, ApiError> {
        self.send_ignoring_body(self.http_client.post(self.url("/cart/clear/")))
            .await?;
        self.fetch_cart().await
    }
}

#[async_trait]
impl WishlistApi for HttpCommerceApi {
    async fn fetch_wishlist(&self) -> Result<Vec<SavedItem>, ApiError> {
        let payload: ListPayload<WishlistItemDto> = self
            .send_json(self.http_client.get(self.url("/wishlist/")))
            .await?;
        into_saved_items(payload.into_vec())
    }

    async fn add_wishlist_item(&self, item: &NewSavedItem) -> Result<Vec<SavedItem>, ApiError> {
        let request = self
            .http_client
            .post(self.url("/wishlist/"))
            .json(&AddWishlistItemBody::from(item));
        self.send_ignoring_body(request).await?;
        self.fetch_wishlist().await
    }

    async fn remove_wishlist_item(
        &self,
        product_id: &ProductId,
    ) -> Result<Vec<SavedItem>, ApiError> {
        let request = self
            .http_client
            .delete(self.url(&format!("/wishlist/{}/", product_id)));
        self.send_ignoring_body(request).await?;
        self.fetch_wishlist().await
    }

    async fn clear_wishlist(&self) -> Result<Vec<SavedItem>, ApiError> {
        self.send_ignoring_body(self.http_client.post(self.url("/wishlist/clear/")))
            .await?;
        self.fetch_wishlist().await
    }
}

#[async_trait]
impl PaymentGateway for HttpCommerceApi {
    async fn initiate_push(
        &self,
        request: &InitiationRequest,
    ) -> Result<InitiationResponse, ApiError> {
        let builder = self
            .http_client
            .post(self.url("/payments/mpesa/initiate/"))
            .json(&MpesaInitiateBody::from(request));
        let dto: MpesaInitiateDto = self.send_json(builder).await?;
        dto.into_response()
    }

    async fn transaction_status(
        &self,
        transaction_id: &TransactionId,
    ) -> Result<PaymentStatusReport, ApiError> {
        let url = self.url(&format!(
            "/payments/mpesa/transactions/{}/status/",
            transaction_id
        ));
        self.send_json(self.http_client.get(url)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::auth::StaticTokenProvider;

    fn client(base_url: &str) -> HttpCommerceApi {
        HttpCommerceApi::new(
            base_url,
            Duration::from_secs(5),
            Arc::new(StaticTokenProvider::anonymous()),
        )
        .unwrap()
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let api = client("http://localhost:8000/api/");
        assert_eq!(api.url("/cart/"), "http://localhost:8000/api/cart/");
    }

    #[tokio::test]
    async fn unreachable_backend_is_a_network_error() {
        // Port 9 (discard) on localhost is not served in test environments
        let api = client("http://127.0.0.1:9/api");

        let result = api.fetch_cart().await;

        assert!(matches!(result, Err(ApiError::Network(_))));
    }
}
