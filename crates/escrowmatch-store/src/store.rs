//! The narrow interface the lifecycle engine persists orders through.

use async_trait::async_trait;
use escrowmatch_types::{Order, OrderId, OrderStatus, OrderTransition, Result};

/// Keyed order storage with an atomic conditional update.
///
/// Implementations must be safe to share across tasks; the engine holds one
/// behind an `Arc<dyn OrderStore>`.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Persist a freshly created order.
    ///
    /// # Errors
    /// - `DuplicateOrder` if the id is already present
    /// - `InvariantViolation` if the record is malformed
    async fn insert(&self, order: Order) -> Result<()>;

    /// Fetch the current record.
    ///
    /// # Errors
    /// Returns `OrderNotFound` if no such order exists.
    async fn get(&self, order_id: OrderId) -> Result<Order>;

    /// All orders in `status`, oldest first.
    async fn list_by_status(&self, status: OrderStatus) -> Result<Vec<Order>>;

    /// Atomically check `transition` against the stored record and, only if
    /// it passes, write the updated record. Returns the record as written.
    ///
    /// This is the compare-and-swap the engine relies on: when several
    /// callers race, each sees the effect of every transition committed
    /// before it, and a failed precondition leaves the record untouched.
    ///
    /// # Errors
    /// - `OrderNotFound` if no such order exists
    /// - the precondition error from [`Order::check`] otherwise
    async fn apply_transition(
        &self,
        order_id: OrderId,
        transition: &OrderTransition,
    ) -> Result<Order>;
}
