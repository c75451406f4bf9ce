//! Order lifecycle orchestration.
//!
//! [`OrderService`] composes the order store, the variant lookup, and the
//! inventory collaborator behind trait seams, enforces the optimistic
//! concurrency check, and delegates per-line pricing to the engine. Domain
//! decisions stay on [`Order`]; this layer only sequences them and emits the
//! stock side effects once the decision succeeded.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use storefront_catalog::{ProductParent, Variant};
use storefront_core::{DomainError, DomainResult, ExpectedVersion, OrderId, VariantId};
use storefront_pricing::price_variant;

use crate::order::{Actor, Customer, Order, OrderItem, OrderStatus};
use crate::store::OrderStore;

const STOCK_PLACED: &str = "order_placed";
const STOCK_CANCELLED: &str = "order_cancelled";
const STOCK_EDITED: &str = "order_edited";

/// Catalog read access, used to re-snapshot items during edits.
pub trait VariantLookup {
    fn variant(&self, id: VariantId) -> Option<Variant>;
    fn parent(&self, variant: &Variant) -> Option<ProductParent>;
}

impl<T: VariantLookup + ?Sized> VariantLookup for Arc<T> {
    fn variant(&self, id: VariantId) -> Option<Variant> {
        (**self).variant(id)
    }

    fn parent(&self, variant: &Variant) -> Option<ProductParent> {
        (**self).parent(variant)
    }
}

/// Inventory collaborator. Positive deltas restore stock, negative consume it.
///
/// Notification-style: the call records intent and cannot veto the order
/// mutation (reservation protocols are out of scope).
pub trait InventoryService {
    fn adjust_stock(&self, variant_id: VariantId, delta: i64, reason: &str);
}

impl<T: InventoryService + ?Sized> InventoryService for Arc<T> {
    fn adjust_stock(&self, variant_id: VariantId, delta: i64, reason: &str) {
        (**self).adjust_stock(variant_id, delta, reason)
    }
}

/// One requested order line: which variant, how many.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemEdit {
    pub variant_id: VariantId,
    pub quantity: u32,
}

/// Payload: submit a cart as a new order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceOrder {
    pub order_number: String,
    pub customer: Customer,
    pub items: Vec<ItemEdit>,
}

/// Payload: confirm a pending order, assigning its shipping cost.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmOrder {
    pub shipping_cost: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin_notes: Option<String>,
}

/// Payload: move an order one step forward, or cancel it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdvanceOrderStatus {
    pub new_status: OrderStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin_notes: Option<String>,
}

/// Payload: cancel an order with a reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelOrder {
    pub reason: String,
    pub actor: Actor,
}

/// Payload: replace the order's items wholesale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditOrderItems {
    pub items: Vec<ItemEdit>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin_notes: Option<String>,
}

/// Payload: update the shipping cost only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateShippingCost {
    pub shipping_cost: i64,
}

/// The lifecycle controller consumed by every UI surface.
///
/// Every mutating operation takes an [`ExpectedVersion`]; a mismatch fails
/// with `ConcurrentModification` before any state or stock changes.
#[derive(Debug)]
pub struct OrderService<S, V, I> {
    orders: S,
    catalog: V,
    inventory: I,
}

impl<S, V, I> OrderService<S, V, I>
where
    S: OrderStore,
    V: VariantLookup,
    I: InventoryService,
{
    pub fn new(orders: S, catalog: V, inventory: I) -> Self {
        Self {
            orders,
            catalog,
            inventory,
        }
    }

    pub fn get_order(&self, id: OrderId) -> DomainResult<Order> {
        self.orders.get(id).ok_or_else(DomainError::not_found)
    }

    /// Submit a cart: price every line, snapshot the variants, decrement
    /// stock, and persist the order in `pending_whatsapp`.
    pub fn place_order(&self, request: PlaceOrder, now: DateTime<Utc>) -> DomainResult<Order> {
        check_lines(&request.items).map_err(DomainError::validation)?;

        let mut items = Vec::with_capacity(request.items.len());
        for line in &request.items {
            let (variant, parent) = self.resolve(line.variant_id)?;
            if !variant.can_fulfill(line.quantity) {
                return Err(DomainError::validation(format!(
                    "insufficient stock for {}",
                    variant.sku
                )));
            }
            let quote = price_variant(&variant, line.quantity, &parent, now);
            items.push(OrderItem::priced(&variant, line.quantity, &quote));
        }

        let order = Order::place(
            OrderId::new(),
            request.order_number,
            request.customer,
            items,
            now,
        )?;

        for item in order.items() {
            self.inventory
                .adjust_stock(item.variant_id, -i64::from(item.quantity), STOCK_PLACED);
        }

        tracing::info!(
            order_id = %order.id(),
            order_number = %order.order_number(),
            total = order.total(),
            "order placed"
        );
        self.orders.put(order.clone());
        Ok(order)
    }

    /// Confirm a pending order, setting its shipping cost.
    pub fn confirm_order(
        &self,
        id: OrderId,
        expected: ExpectedVersion,
        request: ConfirmOrder,
        now: DateTime<Utc>,
    ) -> DomainResult<Order> {
        let mut order = self.load_checked(id, expected)?;
        order.confirm(request.shipping_cost, request.admin_notes.as_deref(), now)?;

        tracing::info!(
            order_id = %id,
            shipping_cost = request.shipping_cost,
            "order confirmed"
        );
        self.orders.put(order.clone());
        Ok(order)
    }

    /// Advance the order one forward step, or cancel it. Cancelling through
    /// this path restores stock exactly like [`Self::cancel_order`].
    pub fn advance_order_status(
        &self,
        id: OrderId,
        expected: ExpectedVersion,
        request: AdvanceOrderStatus,
        now: DateTime<Utc>,
    ) -> DomainResult<Order> {
        let mut order = self.load_checked(id, expected)?;
        let from = order.status();
        order.advance_to(request.new_status, request.admin_notes.as_deref(), now)?;

        if order.status() == OrderStatus::Cancelled {
            self.restore_stock(&order);
        }

        tracing::info!(order_id = %id, %from, to = %order.status(), "order status changed");
        self.orders.put(order.clone());
        Ok(order)
    }

    /// Cancel the order and restore any stock it had consumed.
    pub fn cancel_order(
        &self,
        id: OrderId,
        expected: ExpectedVersion,
        request: CancelOrder,
        now: DateTime<Utc>,
    ) -> DomainResult<Order> {
        let mut order = self.load_checked(id, expected)?;
        order.cancel(Some(&request.reason), request.actor, now)?;
        self.restore_stock(&order);

        tracing::info!(order_id = %id, actor = ?request.actor, "order cancelled");
        self.orders.put(order.clone());
        Ok(order)
    }

    /// Replace the order's items, re-snapshotting and re-pricing every line
    /// against the catalog as it exists now.
    pub fn edit_order_items(
        &self,
        id: OrderId,
        expected: ExpectedVersion,
        request: EditOrderItems,
        now: DateTime<Utc>,
    ) -> DomainResult<Order> {
        let mut order = self.load_checked(id, expected)?;
        if !order.can_edit_items() {
            return Err(DomainError::invalid_edit(format!(
                "items cannot be edited in status {}",
                order.status()
            )));
        }
        check_lines(&request.items).map_err(DomainError::invalid_edit)?;

        let previous: BTreeMap<VariantId, i64> = order
            .items()
            .iter()
            .map(|i| (i.variant_id, i64::from(i.quantity)))
            .collect();

        let mut items = Vec::with_capacity(request.items.len());
        for line in &request.items {
            let (variant, parent) = self.resolve(line.variant_id)?;
            let held = previous.get(&line.variant_id).copied().unwrap_or(0);
            let increase = i64::from(line.quantity) - held;
            // Units already held by this order are not re-checked; only the
            // increase has to come out of the remaining stock.
            if increase > 0 && !variant.allow_backorder && increase > variant.stock {
                return Err(DomainError::invalid_edit(format!(
                    "insufficient stock for {}",
                    variant.sku
                )));
            }
            let quote = price_variant(&variant, line.quantity, &parent, now);
            items.push(OrderItem::priced(&variant, line.quantity, &quote));
        }

        order.replace_items(items, request.admin_notes.as_deref(), now)?;

        let current: BTreeMap<VariantId, i64> = order
            .items()
            .iter()
            .map(|i| (i.variant_id, i64::from(i.quantity)))
            .collect();
        for (variant_id, held) in &previous {
            let delta = current.get(variant_id).copied().unwrap_or(0) - held;
            if delta != 0 {
                self.inventory.adjust_stock(*variant_id, -delta, STOCK_EDITED);
            }
        }
        for (variant_id, quantity) in &current {
            if !previous.contains_key(variant_id) {
                self.inventory.adjust_stock(*variant_id, -quantity, STOCK_EDITED);
            }
        }

        tracing::info!(
            order_id = %id,
            items = order.items().len(),
            total = order.total(),
            "order items edited"
        );
        self.orders.put(order.clone());
        Ok(order)
    }

    /// Update the shipping cost; recomputes the total only.
    pub fn update_shipping_cost(
        &self,
        id: OrderId,
        expected: ExpectedVersion,
        request: UpdateShippingCost,
        now: DateTime<Utc>,
    ) -> DomainResult<Order> {
        let mut order = self.load_checked(id, expected)?;
        order.set_shipping_cost(request.shipping_cost, now)?;

        tracing::info!(
            order_id = %id,
            shipping_cost = request.shipping_cost,
            total = order.total(),
            "shipping cost updated"
        );
        self.orders.put(order.clone());
        Ok(order)
    }

    fn load_checked(&self, id: OrderId, expected: ExpectedVersion) -> DomainResult<Order> {
        let order = self.get_order(id)?;
        expected.check(order.version())?;
        Ok(order)
    }

    fn resolve(&self, variant_id: VariantId) -> DomainResult<(Variant, ProductParent)> {
        let variant = self
            .catalog
            .variant(variant_id)
            .ok_or_else(DomainError::not_found)?;
        let parent = self
            .catalog
            .parent(&variant)
            .ok_or_else(DomainError::not_found)?;
        Ok((variant, parent))
    }

    fn restore_stock(&self, order: &Order) {
        for item in order.items() {
            self.inventory
                .adjust_stock(item.variant_id, i64::from(item.quantity), STOCK_CANCELLED);
        }
    }
}

fn check_lines(lines: &[ItemEdit]) -> Result<(), String> {
    if lines.is_empty() {
        return Err("at least one item is required".to_string());
    }
    let mut seen = BTreeSet::new();
    for line in lines {
        if line.quantity < 1 {
            return Err("item quantity must be at least 1".to_string());
        }
        if !seen.insert(line.variant_id) {
            return Err(format!("duplicate variant {}", line.variant_id));
        }
    }
    Ok(())
}
