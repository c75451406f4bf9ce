//! Order persistence seam.
//!
//! The service layer is generic over this trait so tests and embedders can
//! swap storage. The in-memory implementation is the default for tests and
//! single-process deployments.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use storefront_core::OrderId;

use crate::order::Order;

/// Whole-document order storage.
pub trait OrderStore {
    fn get(&self, id: OrderId) -> Option<Order>;
    fn put(&self, order: Order);
}

impl<T: OrderStore + ?Sized> OrderStore for Arc<T> {
    fn get(&self, id: OrderId) -> Option<Order> {
        (**self).get(id)
    }

    fn put(&self, order: Order) {
        (**self).put(order)
    }
}

/// In-memory order store (interior mutability; clone-on-read).
#[derive(Debug, Default)]
pub struct InMemoryOrderStore {
    inner: Mutex<HashMap<OrderId, Order>>,
}

impl InMemoryOrderStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl OrderStore for InMemoryOrderStore {
    fn get(&self, id: OrderId) -> Option<Order> {
        self.inner.lock().expect("order store poisoned").get(&id).cloned()
    }

    fn put(&self, order: Order) {
        self.inner
            .lock()
            .expect("order store poisoned")
            .insert(order.id(), order);
    }
}
