//! Parent product: the legacy discount holder a variant belongs to.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use storefront_core::ProductId;

use crate::discount::LegacyDiscount;

/// The catalog entry a [`crate::Variant`] belongs to.
///
/// Carries zero or more deprecated tiered discounts, consulted by the pricing
/// engine only when the variant itself defines no applicable discount.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductParent {
    pub id: ProductId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tiered_discounts: Vec<LegacyDiscount>,
}

impl ProductParent {
    /// First legacy discount entry that is active at `now`, in declaration
    /// order. Entries are never merged.
    pub fn active_legacy_discount(&self, now: DateTime<Utc>) -> Option<&LegacyDiscount> {
        self.tiered_discounts.iter().find(|d| d.is_active_at(now))
    }
}
