//! Discount configuration attached to variants and parent products.
//!
//! A variant carries at most two discount slots: one fixed discount and one
//! tiered (quantity-based) schedule. Parent products may additionally carry
//! deprecated percentage-only tiered discounts that apply only as a fallback.
//!
//! Configuration here is *data*; whether and how a discount applies to a
//! concrete quantity is decided by the pricing engine. Activation checks are
//! deterministic for a fixed `now`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use storefront_core::{DomainError, DomainResult};

/// How a discount value is interpreted.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiscountKind {
    /// `value` is a percentage of the price the discount applies to.
    Percentage,
    /// `value` is a flat amount in smallest currency units, per unit.
    Amount,
}

/// One row of a quantity-based discount schedule.
///
/// `max_quantity == None` means the tier is open-ended upward.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tier {
    pub min_quantity: u32,
    pub max_quantity: Option<u32>,
    #[serde(rename = "type")]
    pub kind: DiscountKind,
    pub value: i64,
}

impl Tier {
    /// Does `quantity` fall inside this tier's `[min_quantity, max_quantity]` range?
    pub fn matches(&self, quantity: u32) -> bool {
        quantity >= self.min_quantity
            && self.max_quantity.is_none_or(|max| quantity <= max)
    }
}

/// A single percentage-or-amount reduction with an optional active window,
/// independent of quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FixedDiscount {
    pub enabled: bool,
    #[serde(rename = "type")]
    pub kind: DiscountKind,
    pub value: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub badge: Option<String>,
}

impl FixedDiscount {
    /// Active iff enabled and `now` falls within `[start_date, end_date]`
    /// (either bound may be absent, meaning unbounded on that side).
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        self.enabled && within_window(now, self.start_date, self.end_date)
    }
}

/// A quantity-based discount schedule on a variant, with an optional window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TieredDiscount {
    pub active: bool,
    pub tiers: Vec<Tier>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub badge: Option<String>,
}

impl TieredDiscount {
    /// Active iff flagged active, non-empty, and `now` is inside the window.
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        self.active
            && !self.tiers.is_empty()
            && within_window(now, self.start_date, self.end_date)
    }

    /// Check the schedule invariants: `min_quantity >= 1`, bounded ranges
    /// ordered (`max >= min`), non-overlapping ranges, and at most one
    /// open-ended tier (necessarily the highest).
    ///
    /// The pricing engine never calls this; a malformed schedule simply
    /// yields no discount there. Catalog writes should validate up front.
    pub fn validate(&self) -> DomainResult<()> {
        validate_tiers(&self.tiers)
    }
}

/// Deprecated product-level tiered discount, percentage-only in practice.
/// No start date and no badge; only an optional expiry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyDiscount {
    pub active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<DateTime<Utc>>,
    pub tiers: Vec<Tier>,
}

impl LegacyDiscount {
    /// Active iff flagged active and the expiry (if any) is still in the future.
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        self.active && self.end_date.is_none_or(|end| end > now)
    }
}

fn within_window(
    now: DateTime<Utc>,
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
) -> bool {
    start.is_none_or(|s| now >= s) && end.is_none_or(|e| now <= e)
}

fn validate_tiers(tiers: &[Tier]) -> DomainResult<()> {
    for tier in tiers {
        if tier.min_quantity < 1 {
            return Err(DomainError::validation("tier min_quantity must be >= 1"));
        }
        if let Some(max) = tier.max_quantity {
            if max < tier.min_quantity {
                return Err(DomainError::validation(format!(
                    "tier range [{}, {max}] is inverted",
                    tier.min_quantity
                )));
            }
        }
    }

    let mut sorted: Vec<&Tier> = tiers.iter().collect();
    sorted.sort_by_key(|t| t.min_quantity);
    for pair in sorted.windows(2) {
        let (lower, upper) = (pair[0], pair[1]);
        match lower.max_quantity {
            None => {
                return Err(DomainError::validation(format!(
                    "open-ended tier starting at {} overlaps tier starting at {}",
                    lower.min_quantity, upper.min_quantity
                )));
            }
            Some(max) if max >= upper.min_quantity => {
                return Err(DomainError::validation(format!(
                    "tier ranges [{}, {max}] and [{}, ..] overlap",
                    lower.min_quantity, upper.min_quantity
                )));
            }
            Some(_) => {}
        }
    }

    Ok(())
}
