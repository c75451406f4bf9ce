//! Discount application pipeline.
//!
//! Order of application, per unit:
//!
//! 1. fixed discount (if enabled and inside its date window);
//! 2. variant tiered discount, compounding onto the already-discounted price;
//! 3. legacy parent tiered discount, only when steps 1–2 produced nothing,
//!    computed against the *original* price (this path never compounds).
//!
//! The engine never fails: inactive, expired, or malformed configuration
//! degrades to "no discount". The final price is clamped at zero.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use storefront_catalog::{DiscountKind, ProductParent, Tier, Variant};

/// Where an applied discount came from.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscountSource {
    Fixed,
    VariantTier,
    LegacyTier,
}

/// Descriptor of one applied discount, for display and auditing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppliedDiscount {
    pub source: DiscountSource,
    pub kind: DiscountKind,
    /// The configured value (percent or flat amount).
    pub value: i64,
    /// What it took off one unit, in smallest currency units.
    pub amount_per_unit: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub badge: Option<String>,
}

/// Result of pricing one variant at one quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceQuote {
    /// The variant's base unit price, pre-discount.
    pub original_price: i64,
    /// Per-unit price after all applicable discounts, clamped at zero.
    pub final_price: i64,
    pub discount_per_unit: i64,
    /// `discount_per_unit * quantity`.
    pub total_discount: i64,
    #[serde(rename = "appliedFixedDiscount")]
    pub applied_fixed: Option<AppliedDiscount>,
    #[serde(rename = "appliedTier")]
    pub applied_tier: Option<AppliedDiscount>,
    /// Human-readable summary of what applied, `"; "`-joined.
    pub details: String,
}

impl PriceQuote {
    /// True when no discount applied at all.
    pub fn is_undiscounted(&self) -> bool {
        self.discount_per_unit == 0
    }
}

/// Select the matching tier with the highest `min_quantity`, if any.
///
/// This is the single tier-selection rule; display helpers reuse it so the
/// tier shown as "selected" can never diverge from the one priced.
pub fn best_tier(tiers: &[Tier], quantity: u32) -> Option<&Tier> {
    tiers
        .iter()
        .filter(|t| t.matches(quantity))
        .max_by_key(|t| t.min_quantity)
}

/// Price `quantity` units of `variant` at time `now`.
///
/// `parent` must be the product the variant belongs to; it is consulted only
/// for the legacy fallback. Callers pass `quantity >= 1`; a zero quantity
/// still prices cleanly (no tier can match it). Pure and deterministic for a
/// fixed `now`.
pub fn price_variant(
    variant: &Variant,
    quantity: u32,
    parent: &ProductParent,
    now: DateTime<Utc>,
) -> PriceQuote {
    let original_price = variant.price;
    let mut price = original_price;
    let mut applied_fixed = None;
    let mut applied_tier = None;
    let mut details: Vec<String> = Vec::new();

    if let Some(fixed) = variant
        .fixed_discount
        .as_ref()
        .filter(|d| d.is_active_at(now))
    {
        let amount = unit_amount(fixed.kind, fixed.value, price);
        if amount > 0 {
            price -= amount;
            details.push(describe_fixed(fixed.kind, fixed.value));
            applied_fixed = Some(AppliedDiscount {
                source: DiscountSource::Fixed,
                kind: fixed.kind,
                value: fixed.value,
                amount_per_unit: amount,
                badge: fixed.badge.clone(),
            });
        }
    }

    if let Some(tiered) = variant
        .tiered_discount
        .as_ref()
        .filter(|d| d.is_active_at(now))
    {
        if let Some(tier) = best_tier(&tiered.tiers, quantity) {
            // Percentage tiers compound onto the already-fixed-discounted price.
            let amount = unit_amount(tier.kind, tier.value, price);
            if amount > 0 {
                price -= amount;
                details.push(describe_tier(tier));
                applied_tier = Some(AppliedDiscount {
                    source: DiscountSource::VariantTier,
                    kind: tier.kind,
                    value: tier.value,
                    amount_per_unit: amount,
                    badge: tiered.badge.clone(),
                });
            }
        }
    }

    // Legacy fallback: only when the variant's own slots took nothing off,
    // and always against the original price.
    if price == original_price {
        if let Some(legacy) = parent.active_legacy_discount(now) {
            if let Some(tier) = best_tier(&legacy.tiers, quantity) {
                let amount = unit_amount(tier.kind, tier.value, original_price);
                if amount > 0 {
                    price -= amount;
                    details.push(describe_tier(tier));
                    applied_tier = Some(AppliedDiscount {
                        source: DiscountSource::LegacyTier,
                        kind: tier.kind,
                        value: tier.value,
                        amount_per_unit: amount,
                        badge: None,
                    });
                }
            }
        }
    }

    let final_price = price.max(0);
    let discount_per_unit = original_price - final_price;

    PriceQuote {
        original_price,
        final_price,
        discount_per_unit,
        total_discount: discount_per_unit * i64::from(quantity),
        applied_fixed,
        applied_tier,
        details: details.join("; "),
    }
}

fn unit_amount(kind: DiscountKind, value: i64, base: i64) -> i64 {
    match kind {
        DiscountKind::Percentage => base * value / 100,
        DiscountKind::Amount => value,
    }
}

fn describe_fixed(kind: DiscountKind, value: i64) -> String {
    match kind {
        DiscountKind::Percentage => format!("{value}% off"),
        DiscountKind::Amount => format!("{value} off per unit"),
    }
}

fn describe_tier(tier: &Tier) -> String {
    match tier.kind {
        DiscountKind::Percentage => {
            format!("{}% off for {}+ units", tier.value, tier.min_quantity)
        }
        DiscountKind::Amount => {
            format!("{} off per unit for {}+ units", tier.value, tier.min_quantity)
        }
    }
}
