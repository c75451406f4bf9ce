//! Display-side derivations of the discount configuration.
//!
//! These helpers answer "what should the product page show" — the badge and
//! the tier schedule — from the same data the engine prices with, reusing
//! [`crate::engine::best_tier`] so the highlighted tier always matches the
//! one the engine would charge.

use chrono::{DateTime, Utc};

use storefront_catalog::{DiscountKind, ProductParent, Tier, Variant};

use crate::engine::{best_tier, DiscountSource};

/// The tier list a buyer of this variant is currently subject to, if any.
///
/// Variant-level schedules win outright. The legacy parent schedule is shown
/// only when the variant defines no active discount of its own — mirroring
/// the engine's fallback rule.
pub fn tier_schedule<'a>(
    variant: &'a Variant,
    parent: &'a ProductParent,
    now: DateTime<Utc>,
) -> Option<(DiscountSource, &'a [Tier])> {
    if let Some(tiered) = variant
        .tiered_discount
        .as_ref()
        .filter(|d| d.is_active_at(now))
    {
        return Some((DiscountSource::VariantTier, &tiered.tiers));
    }

    let fixed_active = variant
        .fixed_discount
        .as_ref()
        .is_some_and(|d| d.is_active_at(now));
    if !fixed_active {
        if let Some(legacy) = parent.active_legacy_discount(now) {
            return Some((DiscountSource::LegacyTier, &legacy.tiers));
        }
    }

    None
}

/// The tier a given quantity would land in, from the visible schedule.
pub fn applicable_tier<'a>(
    variant: &'a Variant,
    parent: &'a ProductParent,
    quantity: u32,
    now: DateTime<Utc>,
) -> Option<(DiscountSource, &'a Tier)> {
    let (source, tiers) = tier_schedule(variant, parent, now)?;
    best_tier(tiers, quantity).map(|tier| (source, tier))
}

/// The promotional badge for this variant, if a discount is live.
///
/// Explicit badge text wins; otherwise a default is derived from the
/// discount's headline value. Legacy parent discounts carry no badge, so
/// only the variant's own slots are consulted.
pub fn discount_badge(variant: &Variant, now: DateTime<Utc>) -> Option<String> {
    if let Some(fixed) = variant
        .fixed_discount
        .as_ref()
        .filter(|d| d.is_active_at(now))
    {
        return Some(fixed.badge.clone().unwrap_or_else(|| match fixed.kind {
            DiscountKind::Percentage => format!("-{}%", fixed.value),
            DiscountKind::Amount => format!("-{}", fixed.value),
        }));
    }

    if let Some(tiered) = variant
        .tiered_discount
        .as_ref()
        .filter(|d| d.is_active_at(now))
    {
        if let Some(badge) = &tiered.badge {
            return Some(badge.clone());
        }
        // Headline the top tier of the schedule.
        let top = tiered.tiers.iter().max_by_key(|t| t.min_quantity)?;
        return Some(match top.kind {
            DiscountKind::Percentage => format!("up to -{}%", top.value),
            DiscountKind::Amount => format!("up to -{}", top.value),
        });
    }

    None
}
