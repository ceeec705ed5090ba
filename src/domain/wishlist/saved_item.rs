//! Wishlist entries.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::cart::VariantKey;
use crate::domain::foundation::{ItemId, ProductId, Timestamp, ValidationError};

/// A saved product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedItem {
    pub id: ItemId,
    pub product_id: ProductId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant: Option<VariantKey>,
    pub display_name: String,
    pub unit_price: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(default = "default_in_stock")]
    pub in_stock: bool,
    pub added_at: Timestamp,
}

fn default_in_stock() -> bool {
    true
}

impl SavedItem {
    pub fn matches(&self, product_id: &ProductId, variant: Option<&VariantKey>) -> bool {
        &self.product_id == product_id && self.variant.as_ref() == variant
    }
}

/// Request to save a product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSavedItem {
    pub product_id: ProductId,
    pub variant: Option<VariantKey>,
    pub display_name: String,
    pub unit_price: Decimal,
    pub image_url: Option<String>,
    pub slug: Option<String>,
    pub in_stock: bool,
}

impl NewSavedItem {
    /// # Errors
    ///
    /// Returns `ValidationError` when the price is negative.
    pub fn new(
        product_id: ProductId,
        display_name: impl Into<String>,
        unit_price: Decimal,
    ) -> Result<Self, ValidationError> {
        if unit_price.is_sign_negative() {
            return Err(ValidationError::invalid_format(
                "unit_price",
                "price cannot be negative",
            ));
        }
        Ok(Self {
            product_id,
            variant: None,
            display_name: display_name.into(),
            unit_price,
            image_url: None,
            slug: None,
            in_stock: true,
        })
    }

    pub fn with_variant(mut self, variant: Option<VariantKey>) -> Self {
        self.variant = variant;
        self
    }

    pub fn with_image(mut self, image_url: impl Into<String>) -> Self {
        self.image_url = Some(image_url.into());
        self
    }

    pub fn with_slug(mut self, slug: impl Into<String>) -> Self {
        self.slug = Some(slug.into());
        self
    }

    pub fn out_of_stock(mut self) -> Self {
        self.in_stock = false;
        self
    }

    pub(crate) fn into_saved(self, id: ItemId, added_at: Timestamp) -> SavedItem {
        SavedItem {
            id,
            product_id: self.product_id,
            variant: self.variant,
            display_name: self.display_name,
            unit_price: self.unit_price,
            image_url: self.image_url,
            slug: self.slug,
            in_stock: self.in_stock,
            added_at,
        }
    }
}

impl From<&SavedItem> for NewSavedItem {
    fn from(item: &SavedItem) -> Self {
        Self {
            product_id: item.product_id.clone(),
            variant: item.variant.clone(),
            display_name: item.display_name.clone(),
            unit_price: item.unit_price,
            image_url: item.image_url.clone(),
            slug: item.slug.clone(),
            in_stock: item.in_stock,
        }
    }
}
