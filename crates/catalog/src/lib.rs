//! Catalog domain module: sellable variants and their discount configuration.
//!
//! This crate contains the data model consumed by the pricing engine and the
//! order controller, implemented purely as deterministic domain logic (no IO,
//! no HTTP, no storage). Discount activation is always evaluated against a
//! caller-supplied `now`.

pub mod discount;
pub mod product;
pub mod variant;

pub use discount::{DiscountKind, FixedDiscount, LegacyDiscount, Tier, TieredDiscount};
pub use product::ProductParent;
pub use variant::Variant;
