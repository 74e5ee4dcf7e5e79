//! Domain error types.

use thiserror::Error;

use crate::status::{FulfillmentStatus, PaymentStatus};
use crate::value_objects::Money;

/// Errors raised by the order record when an invariant would be violated.
#[derive(Debug, Error)]
pub enum OrderError {
    /// Orders must carry at least one line item.
    #[error("Order must contain at least one line item")]
    EmptyLineItems,

    /// An invalid payment status transition was attempted.
    #[error("Invalid payment transition: {from} -> {to}")]
    InvalidPaymentTransition {
        from: PaymentStatus,
        to: PaymentStatus,
    },

    /// An invalid fulfillment status transition was attempted.
    #[error("Invalid fulfillment transition: {from} -> {to}")]
    InvalidFulfillmentTransition {
        from: FulfillmentStatus,
        to: FulfillmentStatus,
    },

    /// A refund was requested for more than the order total.
    #[error("Refund amount {requested} exceeds order total {total}")]
    RefundExceedsTotal { requested: Money, total: Money },
}
