//! Payment and fulfillment status machines.

use serde::{Deserialize, Serialize};

/// The payment state of an order.
///
/// State transitions:
/// ```text
/// Pending ──► Processing ──► Completed ──► Refunded
///    ▲            │
///    │            ▼
///    └───────── Failed
/// ```
///
/// `Pending → Processing` and `Failed → Processing` are the claim
/// transitions: exactly one caller wins the right to invoke the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    /// Order created, no payment attempt yet.
    #[default]
    Pending,

    /// A payment attempt is in flight at the gateway.
    Processing,

    /// Payment settled (terminal unless refunded).
    Completed,

    /// Last payment attempt was declined; retry is allowed.
    Failed,

    /// Settled payment was refunded (terminal state).
    Refunded,
}

impl PaymentStatus {
    /// Returns true if a payment attempt can be claimed from this state.
    pub fn can_claim(&self) -> bool {
        matches!(self, PaymentStatus::Pending | PaymentStatus::Failed)
    }

    /// Returns true if the order can settle from this state.
    pub fn can_settle(&self) -> bool {
        matches!(self, PaymentStatus::Processing)
    }

    /// Returns true if a decline can be recorded from this state.
    pub fn can_decline(&self) -> bool {
        matches!(self, PaymentStatus::Processing)
    }

    /// Returns true if the order can be refunded from this state.
    pub fn can_refund(&self) -> bool {
        matches!(self, PaymentStatus::Completed)
    }

    /// Returns true if payment has settled (completed or later refunded).
    pub fn is_settled(&self) -> bool {
        matches!(self, PaymentStatus::Completed | PaymentStatus::Refunded)
    }

    /// Returns the status name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Processing => "processing",
            PaymentStatus::Completed => "completed",
            PaymentStatus::Failed => "failed",
            PaymentStatus::Refunded => "refunded",
        }
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The fulfillment state of an order.
///
/// Fulfillment only completes alongside payment settlement; `Cancelled`
/// is reserved for administrative closure of never-paid orders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FulfillmentStatus {
    /// Order is open; payment has not settled.
    #[default]
    Processing,

    /// Course access has been granted (terminal state).
    Completed,

    /// Order was closed without settlement (terminal state).
    Cancelled,
}

impl FulfillmentStatus {
    /// Returns true if fulfillment can complete from this state.
    pub fn can_complete(&self) -> bool {
        matches!(self, FulfillmentStatus::Processing)
    }

    /// Returns true if the order can be cancelled from this state.
    pub fn can_cancel(&self) -> bool {
        matches!(self, FulfillmentStatus::Processing)
    }

    /// Returns true if this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            FulfillmentStatus::Completed | FulfillmentStatus::Cancelled
        )
    }

    /// Returns the status name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            FulfillmentStatus::Processing => "processing",
            FulfillmentStatus::Completed => "completed",
            FulfillmentStatus::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for FulfillmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
