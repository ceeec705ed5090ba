//! Cart line items and the variant key that distinguishes SKUs of one product.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::foundation::{ItemId, ProductId, ValidationError};

/// Size/colour pair distinguishing stock-keeping units of one product.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct VariantKey {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl VariantKey {
    /// Builds a variant key, returning `None` when neither size nor colour is set.
    pub fn from_parts(size: Option<String>, color: Option<String>) -> Option<Self> {
        let size = size.filter(|s| !s.trim().is_empty());
        let color = color.filter(|c| !c.trim().is_empty());
        if size.is_none() && color.is_none() {
            None
        } else {
            Some(Self { size, color })
        }
    }

    /// Compact `size/color` label used by the HTTP adapter and in logs.
    pub fn label(&self) -> String {
        format!(
            "{}/{}",
            self.size.as_deref().unwrap_or(""),
            self.color.as_deref().unwrap_or("")
        )
    }
}

/// One row of the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    pub id: ItemId,
    pub product_id: ProductId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant: Option<VariantKey>,
    /// Price snapshotted when the line was first added.
    pub unit_price: Decimal,
    pub quantity: u32,
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl LineItem {
    /// `unit_price × quantity`.
    pub fn line_total(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }

    /// True when this line is the same SKU as `(product_id, variant)`.
    pub fn matches(&self, product_id: &ProductId, variant: Option<&VariantKey>) -> bool {
        &self.product_id == product_id && self.variant.as_ref() == variant
    }
}

/// Request to put a product into the cart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLineItem {
    pub product_id: ProductId,
    pub variant: Option<VariantKey>,
    pub unit_price: Decimal,
    pub quantity: u32,
    pub display_name: String,
    pub image_url: Option<String>,
}

impl NewLineItem {
    /// Creates a request for `quantity` units of a product at `unit_price`.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` when quantity is zero or the price is negative.
    pub fn new(
        product_id: ProductId,
        display_name: impl Into<String>,
        unit_price: Decimal,
        quantity: u32,
    ) -> Result<Self, ValidationError> {
        let request = Self {
            product_id,
            variant: None,
            unit_price,
            quantity,
            display_name: display_name.into(),
            image_url: None,
        };
        request.validate()?;
        Ok(request)
    }

    /// Checks the rules `new` enforces, for requests built or edited in place.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` when quantity is zero or the price is negative.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.quantity == 0 {
            return Err(ValidationError::out_of_range(
                "quantity",
                1,
                i64::from(u32::MAX),
                i64::from(self.quantity),
            ));
        }
        if self.unit_price.is_sign_negative() {
            return Err(ValidationError::invalid_format(
                "unit_price",
                "price cannot be negative",
            ));
        }
        Ok(())
    }

    pub fn with_variant(mut self, variant: Option<VariantKey>) -> Self {
        self.variant = variant;
        self
    }

    pub fn with_image(mut self, image_url: impl Into<String>) -> Self {
        self.image_url = Some(image_url.into());
        self
    }

    /// Materializes the request as a fresh guest line.
    pub(crate) fn into_line(self, id: ItemId) -> LineItem {
        LineItem {
            id,
            product_id: self.product_id,
            variant: self.variant,
            unit_price: self.unit_price,
            quantity: self.quantity,
            display_name: self.display_name,
            image_url: self.image_url,
        }
    }
}

impl From<&LineItem> for NewLineItem {
    /// Replays an existing line as an add request, e.g. when pushing guest
    /// lines to the server.
    fn from(line: &LineItem) -> Self {
        Self {
            product_id: line.product_id.clone(),
            variant: line.variant.clone(),
            unit_price: line.unit_price,
            quantity: line.quantity,
            display_name: line.display_name.clone(),
            image_url: line.image_url.clone(),
        }
    }
}
