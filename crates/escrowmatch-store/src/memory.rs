//! In-memory order store.
//!
//! Orders are never deleted; terminal orders stay as history.

use std::collections::HashMap;

use async_trait::async_trait;
use escrowmatch_types::{EscrowError, Order, OrderId, OrderStatus, OrderTransition, Result};
use tokio::sync::RwLock;

use crate::OrderStore;

/// A process-local [`OrderStore`].
///
/// Conditional updates run entirely under the write guard, so they are
/// linearizable with respect to each other and to reads.
#[derive(Default)]
pub struct MemoryOrderStore {
    orders: RwLock<HashMap<OrderId, Order>>,
}

impl MemoryOrderStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of orders ever stored.
    pub async fn len(&self) -> usize {
        self.orders.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.orders.read().await.is_empty()
    }
}

#[async_trait]
impl OrderStore for MemoryOrderStore {
    async fn insert(&self, order: Order) -> Result<()> {
        order.check_invariants()?;
        let mut orders = self.orders.write().await;
        if orders.contains_key(&order.id) {
            return Err(EscrowError::DuplicateOrder(order.id));
        }
        tracing::debug!(order_id = %order.id, status = %order.status, "order stored");
        orders.insert(order.id, order);
        Ok(())
    }

    async fn get(&self, order_id: OrderId) -> Result<Order> {
        self.orders
            .read()
            .await
            .get(&order_id)
            .cloned()
            .ok_or(EscrowError::OrderNotFound(order_id))
    }

    async fn list_by_status(&self, status: OrderStatus) -> Result<Vec<Order>> {
        let mut matching: Vec<Order> = self
            .orders
            .read()
            .await
            .values()
            .filter(|o| o.status == status)
            .cloned()
            .collect();
        // UUIDv7 ids sort by creation time.
        matching.sort_by_key(|o| o.id);
        Ok(matching)
    }

    async fn apply_transition(
        &self,
        order_id: OrderId,
        transition: &OrderTransition,
    ) -> Result<Order> {
        let mut orders = self.orders.write().await;
        let stored = orders
            .get_mut(&order_id)
            .ok_or(EscrowError::OrderNotFound(order_id))?;

        let mut next = stored.clone();
        next.apply(transition)?;
        next.check_invariants()?;

        *stored = next.clone();
        Ok(next)
    }
}
