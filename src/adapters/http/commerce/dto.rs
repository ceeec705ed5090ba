//! Wire DTOs for the storefront backend.
//!
//! The backend is a REST service whose ids may be numbers or strings and
//! whose decimals may arrive as JSON strings; these types absorb that and
//! convert into domain values.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::cart::{LineItem, NewLineItem, VariantKey};
use crate::domain::foundation::{ItemId, ProductId, Timestamp, TransactionId};
use crate::domain::wishlist::{NewSavedItem, SavedItem};
use crate::ports::{ApiError, InitiationRequest, InitiationResponse};

// ════════════════════════════════════════════════════════════════════════════════
// Shared
// ════════════════════════════════════════════════════════════════════════════════

/// Identifier that may be serialized as a string or an integer.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum RawId {
    Text(String),
    Number(u64),
}

impl RawId {
    pub fn into_string(self) -> String {
        match self {
            RawId::Text(s) => s,
            RawId::Number(n) => n.to_string(),
        }
    }
}

/// A list response, either bare, wrapped in `items`, or paginated.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ListPayload<T> {
    List(Vec<T>),
    Items { items: Vec<T> },
    Page { results: Vec<T> },
}

impl<T> ListPayload<T> {
    pub fn into_vec(self) -> Vec<T> {
        match self {
            ListPayload::List(items) => items,
            ListPayload::Items { items } => items,
            ListPayload::Page { results } => results,
        }
    }
}

/// Error body message: `error`, then `detail`.
pub fn error_message(body: &serde_json::Value) -> Option<String> {
    ["error", "detail"]
        .iter()
        .filter_map(|key| body.get(key).and_then(|v| v.as_str()))
        .map(str::trim)
        .find(|s| !s.is_empty())
        .map(str::to_string)
}

fn decode_err(e: impl std::fmt::Display) -> ApiError {
    ApiError::Decode(e.to_string())
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantOptionsDto {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl From<&VariantKey> for VariantOptionsDto {
    fn from(key: &VariantKey) -> Self {
        Self {
            size: key.size.clone(),
            color: key.color.clone(),
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Cart
// ════════════════════════════════════════════════════════════════════════════════

/// Body of `POST /cart/items/`.
#[derive(Debug, Clone, Serialize)]
pub struct AddCartItemBody {
    pub product: String,
    pub quantity: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variant_options: Option<VariantOptionsDto>,
}

impl From<&NewLineItem> for AddCartItemBody {
    fn from(item: &NewLineItem) -> Self {
        Self {
            product: item.product_id.to_string(),
            quantity: item.quantity,
            variant_options: item.variant.as_ref().map(VariantOptionsDto::from),
        }
    }
}

/// Body of `PATCH /cart/items/{id}/`.
#[derive(Debug, Clone, Serialize)]
pub struct UpdateCartItemBody {
    pub quantity: u32,
}

/// One cart row as returned by the backend.
#[derive(Debug, Clone, Deserialize)]
pub struct CartItemDto {
    pub id: RawId,
    pub product: RawId,
    pub quantity: u32,
    pub price: Decimal,
    #[serde(default)]
    pub product_name: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub variant_options: Option<VariantOptionsDto>,
}

impl CartItemDto {
    pub fn into_line(self) -> Result<LineItem, ApiError> {
        let product_id = ProductId::new(self.product.into_string()).map_err(decode_err)?;
        let variant = self
            .variant_options
            .and_then(|v| VariantKey::from_parts(v.size, v.color));
        Ok(LineItem {
            id: ItemId::new(self.id.into_string()).map_err(decode_err)?,
            display_name: self
                .product_name
                .unwrap_or_else(|| product_id.to_string()),
            product_id,
            variant,
            unit_price: self.price,
            quantity: self.quantity,
            image_url: self.image_url.filter(|url| !url.is_empty()),
        })
    }
}

pub fn into_lines(items: Vec<CartItemDto>) -> Result<Vec<LineItem>, ApiError> {
    items.into_iter().map(CartItemDto::into_line).collect()
}

// ════════════════════════════════════════════════════════════════════════════════
// Wishlist
// ════════════════════════════════════════════════════════════════════════════════

/// Body of `POST /wishlist/`.
#[derive(Debug, Clone, Serialize)]
pub struct AddWishlistItemBody {
    pub product_id: String,
}

impl From<&NewSavedItem> for AddWishlistItemBody {
    fn from(item: &NewSavedItem) -> Self {
        Self {
            product_id: item.product_id.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductDetailsDto {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub price: Option<Decimal>,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub in_stock: Option<bool>,
    #[serde(default, alias = "primary_image")]
    pub image_url: Option<String>,
}

/// One wishlist entry as returned by the backend.
#[derive(Debug, Clone, Deserialize)]
pub struct WishlistItemDto {
    pub id: RawId,
    pub product: RawId,
    #[serde(default)]
    pub product_details: Option<ProductDetailsDto>,
    #[serde(default)]
    pub added_at: Option<DateTime<Utc>>,
}

impl WishlistItemDto {
    pub fn into_saved(self) -> Result<SavedItem, ApiError> {
        let product_id = ProductId::new(self.product.into_string()).map_err(decode_err)?;
        let details = self.product_details.unwrap_or_default();
        Ok(SavedItem {
            id: ItemId::new(self.id.into_string()).map_err(decode_err)?,
            display_name: details.name.unwrap_or_else(|| product_id.to_string()),
            product_id,
            variant: None,
            unit_price: details.price.unwrap_or(Decimal::ZERO),
            image_url: details.image_url.filter(|url| !url.is_empty()),
            slug: details.slug,
            in_stock: details.in_stock.unwrap_or(true),
            added_at: self
                .added_at
                .map(Timestamp::from_datetime)
                .unwrap_or_else(Timestamp::now),
        })
    }
}

pub fn into_saved_items(items: Vec<WishlistItemDto>) -> Result<Vec<SavedItem>, ApiError> {
    items.into_iter().map(WishlistItemDto::into_saved).collect()
}

// ════════════════════════════════════════════════════════════════════════════════
// M-Pesa
// ════════════════════════════════════════════════════════════════════════════════

/// Body of `POST /payments/mpesa/initiate/`.
#[derive(Debug, Clone, Serialize)]
pub struct MpesaInitiateBody {
    pub phone_number: String,
    pub order: String,
    pub amount: Decimal,
}

impl From<&InitiationRequest> for MpesaInitiateBody {
    fn from(request: &InitiationRequest) -> Self {
        Self {
            phone_number: request.phone_number.to_string(),
            order: request.order_id.to_string(),
            amount: request.amount,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MpesaInitiateDto {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub transaction_id: Option<RawId>,
    #[serde(default)]
    pub error: Option<String>,
}

impl MpesaInitiateDto {
    pub fn into_response(self) -> Result<InitiationResponse, ApiError> {
        let transaction_id = self
            .transaction_id
            .map(|id| TransactionId::new(id.into_string()))
            .transpose()
            .map_err(decode_err)?;
        Ok(InitiationResponse {
            success: self.success && transaction_id.is_some(),
            transaction_id,
            error: self.error,
        })
    }
}
