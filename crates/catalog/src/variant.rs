//! Sellable variant: a concrete SKU of a parent product.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use storefront_core::{ProductId, VariantId};

use crate::discount::{FixedDiscount, TieredDiscount};

/// A sellable SKU. Carries its own price, stock, display data, and at most
/// two discount slots (one fixed, one tiered). Belongs to exactly one
/// [`crate::ProductParent`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Variant {
    pub id: VariantId,
    pub product_id: ProductId,
    pub sku: String,
    pub name: String,
    /// Base unit price in smallest currency units, pre-discount.
    pub price: i64,
    pub stock: i64,
    pub allow_backorder: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fixed_discount: Option<FixedDiscount>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tiered_discount: Option<TieredDiscount>,
}

impl Variant {
    /// Can this variant satisfy `quantity` units right now?
    ///
    /// Backorderable variants always can; otherwise stock must cover it.
    pub fn can_fulfill(&self, quantity: u32) -> bool {
        self.allow_backorder || self.stock >= i64::from(quantity)
    }
}
