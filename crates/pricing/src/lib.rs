//! Pricing engine: per-unit discount computation for sellable variants.
//!
//! One pure function, [`price_variant`], owns all discount math. Every call
//! site (cart, staff order edits, catalog display) delegates here; nothing
//! else in the workspace selects tiers or applies discount sequencing. The
//! current time is always a parameter, never read from a clock.

pub mod engine;
pub mod presentation;

pub use engine::{price_variant, AppliedDiscount, DiscountSource, PriceQuote};
pub use presentation::{applicable_tier, discount_badge, tier_schedule};
