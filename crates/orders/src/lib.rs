//! Order lifecycle domain module.
//!
//! This crate owns the order's status machine and every legal mutation of an
//! order document. Item and shipping edits delegate per-line pricing to
//! `storefront-pricing`; stock side effects are delegated to an injected
//! inventory collaborator. All business rules are deterministic for a
//! caller-supplied `now` (no IO, no HTTP, no clock reads).

pub mod order;
pub mod service;
pub mod store;

pub use order::{
    Actor, Customer, Order, OrderItem, OrderStatus, VariantSnapshot,
};
pub use service::{
    AdvanceOrderStatus, CancelOrder, ConfirmOrder, EditOrderItems, InventoryService, ItemEdit,
    OrderService, PlaceOrder, UpdateShippingCost, VariantLookup,
};
pub use store::{InMemoryOrderStore, OrderStore};
