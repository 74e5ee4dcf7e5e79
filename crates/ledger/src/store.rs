use async_trait::async_trait;
use common::{OrderId, Revision, UserId};
use domain::Order;

use crate::Result;

/// Core trait for order ledger implementations.
///
/// The ledger is the single source of truth for orders. All mutation
/// goes through `update`, which is a compare-and-swap on the order's
/// revision: the caller names the revision it read, and the ledger bumps
/// it on success. A stale revision is a conflict, never a lost update.
///
/// All implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait OrderLedger: Send + Sync {
    /// Inserts a newly created order at revision 1.
    ///
    /// Fails with `DuplicateOrder` if an order with the same ID exists.
    async fn insert(&self, order: Order) -> Result<Order>;

    /// Retrieves an order by ID.
    ///
    /// Returns None if the order doesn't exist.
    async fn get(&self, order_id: OrderId) -> Result<Option<Order>>;

    /// Updates an order, expecting it to be at `expected` revision.
    ///
    /// On success the stored order carries `expected.next()` and the
    /// updated record is returned. Fails with `RevisionConflict` if the
    /// stored revision differs, or `OrderNotFound` if the order is gone.
    async fn update(&self, order: Order, expected: Revision) -> Result<Order>;

    /// Removes an order from the ledger.
    ///
    /// Orders are an audit trail and are never deleted once a payment
    /// attempt exists; this is used only to roll back an order whose
    /// creation could not complete (cart clear failed after insert).
    async fn remove(&self, order_id: OrderId) -> Result<()>;

    /// Retrieves all orders for a user, oldest first.
    async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Order>>;
}
