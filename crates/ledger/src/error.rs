//! Ledger error types.

use common::{OrderId, Revision};
use thiserror::Error;

/// Errors that can occur when interacting with the order ledger.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// The order was not found in the ledger.
    #[error("Order not found: {0}")]
    OrderNotFound(OrderId),

    /// An order with the same ID already exists.
    #[error("Order already exists: {0}")]
    DuplicateOrder(OrderId),

    /// A revision conflict occurred when updating an order.
    /// The expected revision did not match the stored revision.
    #[error("Revision conflict for order {order_id}: expected {expected}, found {actual}")]
    RevisionConflict {
        order_id: OrderId,
        expected: Revision,
        actual: Revision,
    },

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A serialization/deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for ledger operations.
pub type Result<T> = std::result::Result<T, LedgerError>;
