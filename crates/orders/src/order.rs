//! The order aggregate: status machine, guarded mutations, totals.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use storefront_catalog::Variant;
use storefront_core::{DomainError, DomainResult, OrderId, VariantId};
use storefront_pricing::PriceQuote;

/// Order status lifecycle.
///
/// Forward chain: `pending_whatsapp → confirmed → preparing → shipped →
/// completed`. `cancelled` is reachable from any non-terminal state.
/// `completed` and `cancelled` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    PendingWhatsapp,
    Confirmed,
    Preparing,
    Shipped,
    Completed,
    Cancelled,
}

impl OrderStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Completed | OrderStatus::Cancelled)
    }

    /// The window during which items and shipping cost may be mutated.
    pub fn is_editable(self) -> bool {
        matches!(
            self,
            OrderStatus::PendingWhatsapp | OrderStatus::Confirmed | OrderStatus::Preparing
        )
    }

    /// The single legal next step for `advance`, if any.
    ///
    /// `pending_whatsapp` has no advance target: confirmation goes through
    /// [`Order::confirm`], which is where the shipping cost is set.
    pub fn next_forward(self) -> Option<OrderStatus> {
        match self {
            OrderStatus::Confirmed => Some(OrderStatus::Preparing),
            OrderStatus::Preparing => Some(OrderStatus::Shipped),
            OrderStatus::Shipped => Some(OrderStatus::Completed),
            OrderStatus::PendingWhatsapp | OrderStatus::Completed | OrderStatus::Cancelled => None,
        }
    }
}

impl core::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let s = match self {
            OrderStatus::PendingWhatsapp => "pending_whatsapp",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Preparing => "preparing",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}

/// Who is asking for a mutation. Customers get a stricter cancel window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Actor {
    Staff,
    Customer,
}

/// The buyer the order belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub name: String,
    pub phone: String,
}

/// Display data frozen from the variant at snapshot time.
///
/// Never re-derived from the live catalog: later product edits or deletions
/// must not change what the order shows. Only an explicit item edit takes a
/// fresh snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariantSnapshot {
    pub sku: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, String>,
}

impl VariantSnapshot {
    pub fn of(variant: &Variant) -> Self {
        Self {
            sku: variant.sku.clone(),
            name: variant.name.clone(),
            image: variant.image.clone(),
            attributes: variant.attributes.clone(),
        }
    }
}

/// One order line: a frozen variant snapshot plus the priced quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub variant_id: VariantId,
    pub variant_snapshot: VariantSnapshot,
    /// The variant's base unit price at snapshot time, pre-discount.
    pub price_per_unit: i64,
    pub quantity: u32,
    /// Total discount for this line, from the pricing engine.
    pub discount: i64,
    /// Gross line total: `price_per_unit * quantity`.
    pub subtotal: i64,
}

impl OrderItem {
    /// Build a line from a live variant and the engine's quote for it.
    pub fn priced(variant: &Variant, quantity: u32, quote: &PriceQuote) -> Self {
        Self {
            variant_id: variant.id,
            variant_snapshot: VariantSnapshot::of(variant),
            price_per_unit: variant.price,
            quantity,
            discount: quote.total_discount,
            subtotal: variant.price * i64::from(quantity),
        }
    }

    /// What the customer pays for this line.
    pub fn net_total(&self) -> i64 {
        self.subtotal - self.discount
    }
}

/// Aggregate root: a customer order, owned by staff after submission.
///
/// All mutation goes through the guarded operations below; every successful
/// mutation bumps `version` by one, which backs the optimistic concurrency
/// check in the service layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    id: OrderId,
    /// Human-facing number, immutable after creation.
    order_number: String,
    status: OrderStatus,
    customer: Customer,
    items: Vec<OrderItem>,
    subtotal: i64,
    total_discount: i64,
    shipping_cost: i64,
    total: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    cancellation_reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    admin_notes: Option<String>,
    whatsapp_sent: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    whatsapp_sent_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    cancelled_at: Option<DateTime<Utc>>,
    version: u64,
}

impl Order {
    /// Create a new order from a submitted cart, in `pending_whatsapp`.
    pub fn place(
        id: OrderId,
        order_number: impl Into<String>,
        customer: Customer,
        items: Vec<OrderItem>,
        now: DateTime<Utc>,
    ) -> DomainResult<Self> {
        if items.is_empty() {
            return Err(DomainError::validation("order must contain at least one item"));
        }

        let mut order = Self {
            id,
            order_number: order_number.into(),
            status: OrderStatus::PendingWhatsapp,
            customer,
            items,
            subtotal: 0,
            total_discount: 0,
            shipping_cost: 0,
            total: 0,
            cancellation_reason: None,
            admin_notes: None,
            whatsapp_sent: false,
            whatsapp_sent_at: None,
            created_at: now,
            updated_at: now,
            cancelled_at: None,
            version: 0,
        };
        order.recompute_totals();
        Ok(order)
    }

    pub fn id(&self) -> OrderId {
        self.id
    }

    pub fn order_number(&self) -> &str {
        &self.order_number
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }

    pub fn customer(&self) -> &Customer {
        &self.customer
    }

    pub fn items(&self) -> &[OrderItem] {
        &self.items
    }

    pub fn subtotal(&self) -> i64 {
        self.subtotal
    }

    pub fn total_discount(&self) -> i64 {
        self.total_discount
    }

    pub fn shipping_cost(&self) -> i64 {
        self.shipping_cost
    }

    pub fn total(&self) -> i64 {
        self.total
    }

    pub fn cancellation_reason(&self) -> Option<&str> {
        self.cancellation_reason.as_deref()
    }

    pub fn admin_notes(&self) -> Option<&str> {
        self.admin_notes.as_deref()
    }

    pub fn whatsapp_sent(&self) -> bool {
        self.whatsapp_sent
    }

    pub fn whatsapp_sent_at(&self) -> Option<DateTime<Utc>> {
        self.whatsapp_sent_at
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn cancelled_at(&self) -> Option<DateTime<Utc>> {
        self.cancelled_at
    }

    /// Monotonically increasing revision, +1 per successful mutation.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Guard predicates: the single source of truth the UI surfaces query
    /// instead of recomputing role checks per page.
    pub fn can_confirm(&self) -> bool {
        self.status == OrderStatus::PendingWhatsapp
    }

    pub fn can_edit_items(&self) -> bool {
        self.status.is_editable()
    }

    pub fn can_cancel(&self, actor: Actor) -> bool {
        match actor {
            Actor::Staff => !self.status.is_terminal(),
            // Customers may not cancel once staff has begun processing.
            Actor::Customer => self.status == OrderStatus::PendingWhatsapp,
        }
    }

    /// Confirm the order, assigning its shipping cost.
    pub fn confirm(
        &mut self,
        shipping_cost: i64,
        admin_notes: Option<&str>,
        now: DateTime<Utc>,
    ) -> DomainResult<()> {
        if !self.can_confirm() {
            return Err(DomainError::invalid_transition(format!(
                "cannot confirm order in status {}",
                self.status
            )));
        }
        if shipping_cost < 0 {
            return Err(DomainError::validation("shipping cost cannot be negative"));
        }

        self.status = OrderStatus::Confirmed;
        self.shipping_cost = shipping_cost;
        self.recompute_totals();
        self.append_admin_notes(admin_notes);
        self.touch(now);
        Ok(())
    }

    /// Move to the next forward status, or cancel.
    ///
    /// Skipping intermediate states is rejected; totals are not recomputed.
    pub fn advance_to(
        &mut self,
        new_status: OrderStatus,
        admin_notes: Option<&str>,
        now: DateTime<Utc>,
    ) -> DomainResult<()> {
        if self.status.is_terminal() {
            return Err(DomainError::invalid_transition(format!(
                "order in terminal status {} cannot change status",
                self.status
            )));
        }

        if new_status == OrderStatus::Cancelled {
            self.cancel(None, Actor::Staff, now)?;
            self.append_admin_notes(admin_notes);
            return Ok(());
        }

        if self.status.next_forward() != Some(new_status) {
            return Err(DomainError::invalid_transition(format!(
                "cannot move from {} to {}",
                self.status, new_status
            )));
        }

        self.status = new_status;
        self.append_admin_notes(admin_notes);
        self.touch(now);
        Ok(())
    }

    /// Cancel the order. Staff may cancel from any non-terminal status;
    /// customers only while the order is still `pending_whatsapp`.
    pub fn cancel(
        &mut self,
        reason: Option<&str>,
        actor: Actor,
        now: DateTime<Utc>,
    ) -> DomainResult<()> {
        if !self.can_cancel(actor) {
            return Err(DomainError::invalid_transition(format!(
                "cannot cancel order in status {} as {:?}",
                self.status, actor
            )));
        }

        self.status = OrderStatus::Cancelled;
        self.cancellation_reason = reason.map(str::to_string);
        self.cancelled_at = Some(now);
        self.touch(now);
        Ok(())
    }

    /// Replace the item list wholesale with freshly priced lines.
    ///
    /// The caller (service layer) is responsible for re-snapshotting and
    /// re-pricing the lines through the engine before handing them in.
    pub fn replace_items(
        &mut self,
        items: Vec<OrderItem>,
        admin_notes: Option<&str>,
        now: DateTime<Utc>,
    ) -> DomainResult<()> {
        if !self.can_edit_items() {
            return Err(DomainError::invalid_edit(format!(
                "items cannot be edited in status {}",
                self.status
            )));
        }
        if items.is_empty() {
            return Err(DomainError::invalid_edit("edit would leave the order empty"));
        }

        self.items = items;
        self.recompute_totals();
        self.append_admin_notes(admin_notes);
        self.touch(now);
        Ok(())
    }

    /// Update the shipping cost. Same editable window as items.
    pub fn set_shipping_cost(&mut self, shipping_cost: i64, now: DateTime<Utc>) -> DomainResult<()> {
        if !self.can_edit_items() {
            return Err(DomainError::invalid_edit(format!(
                "shipping cost cannot be edited in status {}",
                self.status
            )));
        }
        if shipping_cost < 0 {
            return Err(DomainError::validation("shipping cost cannot be negative"));
        }

        self.shipping_cost = shipping_cost;
        self.recompute_totals();
        self.touch(now);
        Ok(())
    }

    /// Record that the WhatsApp checkout message went out.
    ///
    /// Called by the notification collaborator, never by the lifecycle
    /// operations above — they must leave these fields untouched.
    pub fn mark_whatsapp_sent(&mut self, now: DateTime<Utc>) {
        self.whatsapp_sent = true;
        self.whatsapp_sent_at = Some(now);
        self.touch(now);
    }

    fn recompute_totals(&mut self) {
        self.subtotal = self.items.iter().map(|i| i.subtotal).sum();
        self.total_discount = self.items.iter().map(|i| i.discount).sum();
        self.total = self.subtotal - self.total_discount + self.shipping_cost;
    }

    fn append_admin_notes(&mut self, notes: Option<&str>) {
        let Some(notes) = notes.filter(|n| !n.trim().is_empty()) else {
            return;
        };
        self.admin_notes = Some(match self.admin_notes.take() {
            Some(existing) => format!("{existing}\n{notes}"),
            None => notes.to_string(),
        });
    }

    // Deterministic revision tracking: +1 per successful mutation.
    fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now;
        self.version += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 15, 12, 0, 0).unwrap()
    }

    fn later() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 16, 12, 0, 0).unwrap()
    }

    fn item(price: i64, quantity: u32, discount: i64) -> OrderItem {
        OrderItem {
            variant_id: VariantId::new(),
            variant_snapshot: VariantSnapshot {
                sku: "SKU-001".to_string(),
                name: "Snapshotted".to_string(),
                image: None,
                attributes: BTreeMap::new(),
            },
            price_per_unit: price,
            quantity,
            discount,
            subtotal: price * i64::from(quantity),
        }
    }

    fn order() -> Order {
        Order::place(
            OrderId::new(),
            "PED-0001",
            Customer {
                name: "Maria".to_string(),
                phone: "+5511999990000".to_string(),
            },
            vec![item(1000, 2, 0)],
            now(),
        )
        .unwrap()
    }

    fn order_in(status: OrderStatus) -> Order {
        let mut o = order();
        match status {
            OrderStatus::PendingWhatsapp => {}
            OrderStatus::Confirmed => o.confirm(500, None, now()).unwrap(),
            OrderStatus::Preparing => {
                o.confirm(500, None, now()).unwrap();
                o.advance_to(OrderStatus::Preparing, None, now()).unwrap();
            }
            OrderStatus::Shipped => {
                o.confirm(500, None, now()).unwrap();
                o.advance_to(OrderStatus::Preparing, None, now()).unwrap();
                o.advance_to(OrderStatus::Shipped, None, now()).unwrap();
            }
            OrderStatus::Completed => {
                o.confirm(500, None, now()).unwrap();
                o.advance_to(OrderStatus::Preparing, None, now()).unwrap();
                o.advance_to(OrderStatus::Shipped, None, now()).unwrap();
                o.advance_to(OrderStatus::Completed, None, now()).unwrap();
            }
            OrderStatus::Cancelled => o.cancel(Some("test"), Actor::Staff, now()).unwrap(),
        }
        o
    }

    fn assert_total_invariant(o: &Order) {
        assert_eq!(o.total(), o.subtotal() - o.total_discount() + o.shipping_cost());
        assert_eq!(o.subtotal(), o.items().iter().map(|i| i.subtotal).sum::<i64>());
        assert_eq!(
            o.total_discount(),
            o.items().iter().map(|i| i.discount).sum::<i64>()
        );
    }

    #[test]
    fn placing_an_empty_order_is_rejected() {
        let err = Order::place(
            OrderId::new(),
            "PED-0002",
            Customer {
                name: "Maria".to_string(),
                phone: "+5511999990000".to_string(),
            },
            vec![],
            now(),
        )
        .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn new_orders_start_pending_with_consistent_totals() {
        let o = order();
        assert_eq!(o.status(), OrderStatus::PendingWhatsapp);
        assert_eq!(o.subtotal(), 2000);
        assert_eq!(o.total(), 2000);
        assert_eq!(o.version(), 0);
        assert!(!o.whatsapp_sent());
        assert_total_invariant(&o);
    }

    #[test]
    fn confirm_sets_shipping_and_recomputes_total() {
        let mut o = order();
        o.confirm(500, Some("confirmed by phone"), later()).unwrap();
        assert_eq!(o.status(), OrderStatus::Confirmed);
        assert_eq!(o.shipping_cost(), 500);
        assert_eq!(o.total(), 2500);
        assert_eq!(o.admin_notes(), Some("confirmed by phone"));
        assert_eq!(o.updated_at(), later());
        assert_eq!(o.version(), 1);
        assert_total_invariant(&o);
    }

    #[test]
    fn confirm_is_only_legal_from_pending() {
        for status in [
            OrderStatus::Confirmed,
            OrderStatus::Preparing,
            OrderStatus::Shipped,
            OrderStatus::Completed,
            OrderStatus::Cancelled,
        ] {
            let mut o = order_in(status);
            let err = o.confirm(500, None, later()).unwrap_err();
            assert!(
                matches!(err, DomainError::InvalidTransition(_)),
                "confirm from {status} should be InvalidTransition"
            );
        }
    }

    #[test]
    fn negative_shipping_cost_is_rejected() {
        let mut o = order();
        assert!(matches!(
            o.confirm(-1, None, now()),
            Err(DomainError::Validation(_))
        ));
    }

    #[test]
    fn full_forward_lifecycle() {
        let mut o = order();
        o.confirm(500, None, now()).unwrap();
        o.advance_to(OrderStatus::Preparing, None, now()).unwrap();
        o.advance_to(OrderStatus::Shipped, None, now()).unwrap();
        o.advance_to(OrderStatus::Completed, None, now()).unwrap();
        assert_eq!(o.status(), OrderStatus::Completed);
        assert!(o.status().is_terminal());
        assert_eq!(o.version(), 4);
    }

    #[test]
    fn skipping_a_forward_state_is_rejected() {
        let mut o = order_in(OrderStatus::Confirmed);
        let err = o.advance_to(OrderStatus::Shipped, None, now()).unwrap_err();
        assert!(matches!(err, DomainError::InvalidTransition(_)));
        assert_eq!(o.status(), OrderStatus::Confirmed);
    }

    #[test]
    fn advancing_pending_to_confirmed_must_use_confirm() {
        let mut o = order();
        let err = o
            .advance_to(OrderStatus::Confirmed, None, now())
            .unwrap_err();
        assert!(matches!(err, DomainError::InvalidTransition(_)));
    }

    #[test]
    fn advance_to_cancelled_behaves_like_staff_cancel() {
        let mut o = order_in(OrderStatus::Preparing);
        o.advance_to(OrderStatus::Cancelled, Some("duplicate"), now())
            .unwrap();
        assert_eq!(o.status(), OrderStatus::Cancelled);
        assert_eq!(o.cancellation_reason(), None);
        assert_eq!(o.admin_notes(), Some("duplicate"));
        assert!(o.cancelled_at().is_some());
    }

    #[test]
    fn staff_can_cancel_from_any_non_terminal_status() {
        for status in [
            OrderStatus::PendingWhatsapp,
            OrderStatus::Confirmed,
            OrderStatus::Preparing,
            OrderStatus::Shipped,
        ] {
            let mut o = order_in(status);
            o.cancel(Some("out of stock"), Actor::Staff, later()).unwrap();
            assert_eq!(o.status(), OrderStatus::Cancelled);
            assert_eq!(o.cancellation_reason(), Some("out of stock"));
            assert_eq!(o.cancelled_at(), Some(later()));
        }
    }

    #[test]
    fn cancel_fails_from_terminal_states() {
        for status in [OrderStatus::Completed, OrderStatus::Cancelled] {
            let mut o = order_in(status);
            let err = o.cancel(Some("nope"), Actor::Staff, later()).unwrap_err();
            assert!(
                matches!(err, DomainError::InvalidTransition(_)),
                "cancel from {status} should be InvalidTransition"
            );
        }
    }

    #[test]
    fn customers_can_only_cancel_pending_orders() {
        let mut pending = order();
        assert!(pending.can_cancel(Actor::Customer));
        pending.cancel(Some("changed my mind"), Actor::Customer, now()).unwrap();

        for status in [
            OrderStatus::Confirmed,
            OrderStatus::Preparing,
            OrderStatus::Shipped,
        ] {
            let mut o = order_in(status);
            assert!(!o.can_cancel(Actor::Customer));
            let err = o
                .cancel(Some("too late"), Actor::Customer, now())
                .unwrap_err();
            assert!(matches!(err, DomainError::InvalidTransition(_)));
        }
    }

    #[test]
    fn items_are_editable_exactly_in_the_editable_window() {
        for status in [
            OrderStatus::PendingWhatsapp,
            OrderStatus::Confirmed,
            OrderStatus::Preparing,
        ] {
            let mut o = order_in(status);
            o.replace_items(vec![item(800, 3, 0)], None, later()).unwrap();
            assert_eq!(o.subtotal(), 2400);
            assert_total_invariant(&o);
        }

        for status in [
            OrderStatus::Shipped,
            OrderStatus::Completed,
            OrderStatus::Cancelled,
        ] {
            let mut o = order_in(status);
            let err = o
                .replace_items(vec![item(800, 3, 0)], None, later())
                .unwrap_err();
            assert!(
                matches!(err, DomainError::InvalidOrderEdit(_)),
                "edit in {status} should be InvalidOrderEdit"
            );
        }
    }

    #[test]
    fn emptying_the_order_through_an_edit_is_rejected() {
        let mut o = order_in(OrderStatus::Confirmed);
        let err = o.replace_items(vec![], None, later()).unwrap_err();
        assert!(matches!(err, DomainError::InvalidOrderEdit(_)));
        assert_eq!(o.items().len(), 1);
    }

    #[test]
    fn shipping_cost_edits_share_the_editable_window() {
        let mut o = order_in(OrderStatus::Preparing);
        o.set_shipping_cost(900, later()).unwrap();
        assert_eq!(o.total(), 2900);
        assert_total_invariant(&o);

        let mut shipped = order_in(OrderStatus::Shipped);
        let err = shipped.set_shipping_cost(900, later()).unwrap_err();
        assert!(matches!(err, DomainError::InvalidOrderEdit(_)));
    }

    #[test]
    fn totals_stay_consistent_with_discounted_items() {
        let mut o = order_in(OrderStatus::Confirmed);
        o.replace_items(
            vec![item(1000, 5, 1400), item(250, 2, 0)],
            None,
            later(),
        )
        .unwrap();
        assert_eq!(o.subtotal(), 5500);
        assert_eq!(o.total_discount(), 1400);
        assert_eq!(o.total(), 5500 - 1400 + 500);
        // The grand total is what the customer pays: net lines plus shipping.
        let net: i64 = o.items().iter().map(OrderItem::net_total).sum();
        assert_eq!(o.total(), net + o.shipping_cost());
        assert_total_invariant(&o);
    }

    #[test]
    fn admin_notes_append_rather_than_overwrite() {
        let mut o = order();
        o.confirm(500, Some("first note"), now()).unwrap();
        o.advance_to(OrderStatus::Preparing, Some("second note"), later())
            .unwrap();
        assert_eq!(o.admin_notes(), Some("first note\nsecond note"));
    }

    #[test]
    fn blank_admin_notes_are_ignored() {
        let mut o = order();
        o.confirm(500, Some("   "), now()).unwrap();
        assert_eq!(o.admin_notes(), None);
    }

    #[test]
    fn lifecycle_operations_leave_whatsapp_fields_untouched() {
        let mut o = order();
        o.mark_whatsapp_sent(now());
        let sent_at = o.whatsapp_sent_at();

        o.confirm(500, None, later()).unwrap();
        o.replace_items(vec![item(700, 1, 0)], None, later()).unwrap();
        o.set_shipping_cost(100, later()).unwrap();
        o.advance_to(OrderStatus::Preparing, None, later()).unwrap();
        o.cancel(Some("test"), Actor::Staff, later()).unwrap();

        assert!(o.whatsapp_sent());
        assert_eq!(o.whatsapp_sent_at(), sent_at);
    }

    #[test]
    fn version_increments_once_per_successful_mutation() {
        let mut o = order();
        assert_eq!(o.version(), 0);
        o.confirm(500, None, now()).unwrap();
        assert_eq!(o.version(), 1);
        o.set_shipping_cost(600, now()).unwrap();
        assert_eq!(o.version(), 2);
        // Failed guard: version unchanged.
        assert!(o.advance_to(OrderStatus::Completed, None, now()).is_err());
        assert_eq!(o.version(), 2);
    }

    #[test]
    fn order_round_trips_through_json_with_wire_names() {
        let mut o = order();
        o.confirm(500, Some("note"), now()).unwrap();

        let json = serde_json::to_value(&o).unwrap();
        assert_eq!(json["status"], "confirmed");
        assert_eq!(json["orderNumber"], "PED-0001");
        assert_eq!(json["shippingCost"], 500);
        assert_eq!(json["totalDiscount"], 0);
        assert_eq!(json["whatsappSent"], false);
        assert_eq!(json["items"][0]["pricePerUnit"], 1000);
        assert_eq!(json["items"][0]["variantSnapshot"]["sku"], "SKU-001");

        let back: Order = serde_json::from_value(json).unwrap();
        assert_eq!(o, back);
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        fn arb_items() -> impl Strategy<Value = Vec<OrderItem>> {
            proptest::collection::vec(
                (1i64..10_000, 1u32..20, 0i64..5_000)
                    .prop_map(|(price, quantity, discount)| item(price, quantity, discount)),
                1..6,
            )
        }

        proptest! {
            #![proptest_config(ProptestConfig {
                cases: 500,
                ..ProptestConfig::default()
            })]

            /// `total == subtotal - total_discount + shipping_cost` after any
            /// sequence of legal edits.
            #[test]
            fn total_invariant_survives_edit_sequences(
                edits in proptest::collection::vec(arb_items(), 1..5),
                shipping in proptest::collection::vec(0i64..5_000, 1..5),
            ) {
                let mut o = order_in(OrderStatus::Confirmed);
                for items in edits {
                    o.replace_items(items, None, later()).unwrap();
                    assert_total_invariant(&o);
                }
                for cost in shipping {
                    o.set_shipping_cost(cost, later()).unwrap();
                    assert_total_invariant(&o);
                }
            }

            /// Version strictly increases across successful mutations.
            #[test]
            fn version_is_monotonic(edits in proptest::collection::vec(arb_items(), 1..5)) {
                let mut o = order_in(OrderStatus::Confirmed);
                let mut previous = o.version();
                for items in edits {
                    o.replace_items(items, None, later()).unwrap();
                    prop_assert!(o.version() > previous);
                    previous = o.version();
                }
            }
        }
    }
}
