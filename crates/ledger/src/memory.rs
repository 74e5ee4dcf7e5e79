use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use common::{OrderId, Revision, UserId};
use domain::Order;
use tokio::sync::RwLock;

use crate::error::LedgerError;
use crate::store::OrderLedger;
use crate::Result;

/// In-memory order ledger for tests and the demo.
///
/// This implementation keeps all orders in a map behind an async RwLock
/// and provides the same revision semantics as the PostgreSQL
/// implementation.
#[derive(Clone, Default)]
pub struct InMemoryOrderLedger {
    orders: Arc<RwLock<HashMap<OrderId, Order>>>,
}

impl InMemoryOrderLedger {
    /// Creates a new empty in-memory ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the total number of orders stored.
    pub async fn order_count(&self) -> usize {
        self.orders.read().await.len()
    }

    /// Clears all orders.
    pub async fn clear(&self) {
        self.orders.write().await.clear();
    }
}

#[async_trait]
impl OrderLedger for InMemoryOrderLedger {
    async fn insert(&self, mut order: Order) -> Result<Order> {
        let mut orders = self.orders.write().await;
        if orders.contains_key(&order.id) {
            return Err(LedgerError::DuplicateOrder(order.id));
        }
        order.revision = Revision::first();
        orders.insert(order.id, order.clone());
        Ok(order)
    }

    async fn get(&self, order_id: OrderId) -> Result<Option<Order>> {
        Ok(self.orders.read().await.get(&order_id).cloned())
    }

    async fn update(&self, mut order: Order, expected: Revision) -> Result<Order> {
        let mut orders = self.orders.write().await;
        let current = orders
            .get(&order.id)
            .ok_or(LedgerError::OrderNotFound(order.id))?;

        if current.revision != expected {
            return Err(LedgerError::RevisionConflict {
                order_id: order.id,
                expected,
                actual: current.revision,
            });
        }

        order.revision = expected.next();
        orders.insert(order.id, order.clone());
        Ok(order)
    }

    async fn remove(&self, order_id: OrderId) -> Result<()> {
        self.orders.write().await.remove(&order_id);
        Ok(())
    }

    async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Order>> {
        let orders = self.orders.read().await;
        let mut result: Vec<_> = orders
            .values()
            .filter(|o| o.user_id == user_id)
            .cloned()
            .collect();
        result.sort_by_key(|o| o.created_at);
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::{BillingDetails, LineItem, Money, PaymentMethod};

    fn test_order(user_id: UserId) -> Order {
        Order::new(
            OrderId::new(),
            user_id,
            vec![LineItem::new("rust-101", Money::from_cents(4999))],
            PaymentMethod::CreditCard,
            BillingDetails::new("Ada Lovelace", "ada@example.com"),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_insert_assigns_first_revision() {
        let ledger = InMemoryOrderLedger::new();
        let order = test_order(UserId::new());

        let stored = ledger.insert(order).await.unwrap();
        assert_eq!(stored.revision, Revision::first());
        assert_eq!(ledger.order_count().await, 1);
    }

    #[tokio::test]
    async fn test_insert_rejects_duplicate() {
        let ledger = InMemoryOrderLedger::new();
        let order = test_order(UserId::new());

        ledger.insert(order.clone()).await.unwrap();
        let result = ledger.insert(order).await;
        assert!(matches!(result, Err(LedgerError::DuplicateOrder(_))));
    }

    #[tokio::test]
    async fn test_update_bumps_revision() {
        let ledger = InMemoryOrderLedger::new();
        let order = ledger.insert(test_order(UserId::new())).await.unwrap();

        let mut updated = order.clone();
        updated.claim_payment().unwrap();
        let stored = ledger.update(updated, order.revision).await.unwrap();

        assert_eq!(stored.revision, Revision::new(2));
        let fetched = ledger.get(order.id).await.unwrap().unwrap();
        assert_eq!(fetched.revision, Revision::new(2));
    }

    #[tokio::test]
    async fn test_update_with_stale_revision_conflicts() {
        let ledger = InMemoryOrderLedger::new();
        let order = ledger.insert(test_order(UserId::new())).await.unwrap();

        let mut first = order.clone();
        first.claim_payment().unwrap();
        ledger.update(first, order.revision).await.unwrap();

        // Second writer still holds revision 1.
        let mut second = order.clone();
        second.claim_payment().unwrap();
        let result = ledger.update(second, order.revision).await;
        assert!(matches!(
            result,
            Err(LedgerError::RevisionConflict { .. })
        ));
    }

    #[tokio::test]
    async fn test_update_missing_order() {
        let ledger = InMemoryOrderLedger::new();
        let order = test_order(UserId::new());
        let result = ledger.update(order, Revision::first()).await;
        assert!(matches!(result, Err(LedgerError::OrderNotFound(_))));
    }

    #[tokio::test]
    async fn test_remove_is_idempotent() {
        let ledger = InMemoryOrderLedger::new();
        let order = ledger.insert(test_order(UserId::new())).await.unwrap();

        ledger.remove(order.id).await.unwrap();
        ledger.remove(order.id).await.unwrap();
        assert!(ledger.get(order.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_for_user_filters_and_sorts() {
        let ledger = InMemoryOrderLedger::new();
        let user = UserId::new();
        let other = UserId::new();

        let first = ledger.insert(test_order(user)).await.unwrap();
        let second = ledger.insert(test_order(user)).await.unwrap();
        ledger.insert(test_order(other)).await.unwrap();

        let orders = ledger.list_for_user(user).await.unwrap();
        assert_eq!(orders.len(), 2);
        assert_eq!(orders[0].id, first.id);
        assert_eq!(orders[1].id, second.id);
    }
}
