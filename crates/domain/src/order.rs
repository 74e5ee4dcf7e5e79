//! The order record and its embedded payment/refund details.

use chrono::{DateTime, Utc};
use common::{OrderId, Revision, UserId};
use serde::{Deserialize, Serialize};

use crate::error::OrderError;
use crate::status::{FulfillmentStatus, PaymentStatus};
use crate::value_objects::{BillingDetails, CourseId, Money, PaymentMethod};

/// A single course on an order, with its price snapshotted at creation.
///
/// The price is copied from the catalog when the order is created and is
/// never recomputed; later catalog price changes must not alter
/// historical orders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    /// The course being purchased (weak reference into the catalog).
    pub course_id: CourseId,

    /// Price at snapshot time, in cents.
    pub price: Money,
}

impl LineItem {
    /// Creates a new line item.
    pub fn new(course_id: impl Into<CourseId>, price: Money) -> Self {
        Self {
            course_id: course_id.into(),
            price,
        }
    }
}

/// The terminal resolution of the most recent payment attempt.
///
/// Overwritten on retry; no history of prior failed attempts is kept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentAttempt {
    /// Payment ID assigned by the gateway (absent on a decline).
    pub payment_id: Option<String>,

    /// Transaction ID assigned by the gateway (absent on a decline).
    pub transaction_id: Option<String>,

    /// Method used for this attempt.
    pub method: PaymentMethod,

    /// When the gateway resolved the attempt.
    pub processed_at: DateTime<Utc>,

    /// Decline reason, present only for a failed attempt.
    pub error: Option<String>,
}

impl PaymentAttempt {
    /// Creates an approved attempt record.
    pub fn approved(
        payment_id: impl Into<String>,
        transaction_id: impl Into<String>,
        method: PaymentMethod,
    ) -> Self {
        Self {
            payment_id: Some(payment_id.into()),
            transaction_id: Some(transaction_id.into()),
            method,
            processed_at: Utc::now(),
            error: None,
        }
    }

    /// Creates a declined attempt record.
    pub fn declined(method: PaymentMethod, reason: impl Into<String>) -> Self {
        Self {
            payment_id: None,
            transaction_id: None,
            method,
            processed_at: Utc::now(),
            error: Some(reason.into()),
        }
    }

    /// Returns true if this attempt was approved.
    pub fn is_approved(&self) -> bool {
        self.error.is_none()
    }
}

/// Details of a settled refund.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefundDetails {
    /// Refund ID assigned by the gateway.
    pub refund_id: String,

    /// Refunded amount; may be less than the order total.
    pub amount: Money,

    /// Caller-supplied reason, if any.
    pub reason: Option<String>,

    /// When the refund settled.
    pub refunded_at: DateTime<Utc>,
}

/// A checkout attempt in the order ledger.
///
/// Line items are immutable after creation and the total is computed
/// exactly once from the snapshotted prices. Orders are never deleted;
/// they are retained as an audit trail even if the referenced courses
/// later disappear from the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    /// Unique order identifier.
    pub id: OrderId,

    /// The purchasing user.
    pub user_id: UserId,

    /// Price-snapshotted courses on this order.
    pub line_items: Vec<LineItem>,

    /// Sum of line item prices, fixed at creation.
    pub total_amount: Money,

    /// Method selected at checkout.
    pub payment_method: PaymentMethod,

    /// Billing metadata captured at checkout.
    pub billing: BillingDetails,

    /// Payment state machine position.
    pub payment_status: PaymentStatus,

    /// Fulfillment state machine position.
    pub fulfillment_status: FulfillmentStatus,

    /// Last terminal payment resolution, if any.
    pub payment_details: Option<PaymentAttempt>,

    /// Refund record, present only when `payment_status` is refunded.
    pub refund_details: Option<RefundDetails>,

    /// When the order was created.
    pub created_at: DateTime<Utc>,

    /// Optimistic-concurrency token managed by the ledger.
    pub revision: Revision,
}

impl Order {
    /// Creates a new pending order from snapshotted line items.
    ///
    /// Computes `total_amount` from the line items; fails if the item
    /// list is empty (partial or empty orders are never created).
    pub fn new(
        id: OrderId,
        user_id: UserId,
        line_items: Vec<LineItem>,
        payment_method: PaymentMethod,
        billing: BillingDetails,
    ) -> Result<Self, OrderError> {
        if line_items.is_empty() {
            return Err(OrderError::EmptyLineItems);
        }

        let total_amount = line_items.iter().map(|item| item.price).sum();

        Ok(Self {
            id,
            user_id,
            line_items,
            total_amount,
            payment_method,
            billing,
            payment_status: PaymentStatus::Pending,
            fulfillment_status: FulfillmentStatus::Processing,
            payment_details: None,
            refund_details: None,
            created_at: Utc::now(),
            revision: Revision::first(),
        })
    }

    /// Returns the course IDs on this order, in line item order.
    pub fn course_ids(&self) -> impl Iterator<Item = &CourseId> {
        self.line_items.iter().map(|item| &item.course_id)
    }

    /// Claims the order for a payment attempt.
    ///
    /// Valid from `pending` (first attempt) and `failed` (retry). The
    /// caller that wins the ledger update for this transition holds the
    /// exclusive right to invoke the gateway.
    pub fn claim_payment(&mut self) -> Result<(), OrderError> {
        if !self.payment_status.can_claim() {
            return Err(OrderError::InvalidPaymentTransition {
                from: self.payment_status,
                to: PaymentStatus::Processing,
            });
        }
        self.payment_status = PaymentStatus::Processing;
        Ok(())
    }

    /// Records an approved payment and completes fulfillment.
    pub fn settle(&mut self, attempt: PaymentAttempt) -> Result<(), OrderError> {
        if !self.payment_status.can_settle() {
            return Err(OrderError::InvalidPaymentTransition {
                from: self.payment_status,
                to: PaymentStatus::Completed,
            });
        }
        if !self.fulfillment_status.can_complete() {
            return Err(OrderError::InvalidFulfillmentTransition {
                from: self.fulfillment_status,
                to: FulfillmentStatus::Completed,
            });
        }
        self.payment_status = PaymentStatus::Completed;
        self.fulfillment_status = FulfillmentStatus::Completed;
        self.payment_details = Some(attempt);
        Ok(())
    }

    /// Records a declined payment attempt.
    ///
    /// Fulfillment stays `processing`; the order remains retryable.
    pub fn decline(&mut self, attempt: PaymentAttempt) -> Result<(), OrderError> {
        if !self.payment_status.can_decline() {
            return Err(OrderError::InvalidPaymentTransition {
                from: self.payment_status,
                to: PaymentStatus::Failed,
            });
        }
        self.payment_status = PaymentStatus::Failed;
        self.payment_details = Some(attempt);
        Ok(())
    }

    /// Records a settled refund.
    ///
    /// Valid only from `completed`, and only for amounts up to the order
    /// total (partial refunds are permitted at the ledger level).
    pub fn apply_refund(&mut self, details: RefundDetails) -> Result<(), OrderError> {
        if !self.payment_status.can_refund() {
            return Err(OrderError::InvalidPaymentTransition {
                from: self.payment_status,
                to: PaymentStatus::Refunded,
            });
        }
        if details.amount > self.total_amount {
            return Err(OrderError::RefundExceedsTotal {
                requested: details.amount,
                total: self.total_amount,
            });
        }
        self.payment_status = PaymentStatus::Refunded;
        self.refund_details = Some(details);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_order() -> Order {
        Order::new(
            OrderId::new(),
            UserId::new(),
            vec![
                LineItem::new("rust-101", Money::from_cents(4999)),
                LineItem::new("rust-201", Money::from_cents(7999)),
            ],
            PaymentMethod::CreditCard,
            BillingDetails::new("Ada Lovelace", "ada@example.com"),
        )
        .unwrap()
    }

    #[test]
    fn test_new_order_computes_total() {
        let order = test_order();
        assert_eq!(order.total_amount, Money::from_cents(12998));
        assert_eq!(order.payment_status, PaymentStatus::Pending);
        assert_eq!(order.fulfillment_status, FulfillmentStatus::Processing);
        assert_eq!(order.revision, Revision::first());
        assert!(order.payment_details.is_none());
        assert!(order.refund_details.is_none());
    }

    #[test]
    fn test_new_order_rejects_empty_line_items() {
        let result = Order::new(
            OrderId::new(),
            UserId::new(),
            vec![],
            PaymentMethod::CreditCard,
            BillingDetails::default(),
        );
        assert!(matches!(result, Err(OrderError::EmptyLineItems)));
    }

    #[test]
    fn test_claim_settle_happy_path() {
        let mut order = test_order();
        order.claim_payment().unwrap();
        assert_eq!(order.payment_status, PaymentStatus::Processing);

        let attempt =
            PaymentAttempt::approved("PAY-0001", "TXN-0001", PaymentMethod::CreditCard);
        order.settle(attempt).unwrap();
        assert_eq!(order.payment_status, PaymentStatus::Completed);
        assert_eq!(order.fulfillment_status, FulfillmentStatus::Completed);
        assert!(order.payment_details.unwrap().is_approved());
    }

    #[test]
    fn test_decline_keeps_order_retryable() {
        let mut order = test_order();
        order.claim_payment().unwrap();
        order
            .decline(PaymentAttempt::declined(
                PaymentMethod::CreditCard,
                "Payment declined by processor",
            ))
            .unwrap();

        assert_eq!(order.payment_status, PaymentStatus::Failed);
        assert_eq!(order.fulfillment_status, FulfillmentStatus::Processing);

        // Retry claims again from failed.
        order.claim_payment().unwrap();
        assert_eq!(order.payment_status, PaymentStatus::Processing);
    }

    #[test]
    fn test_retry_overwrites_prior_attempt() {
        let mut order = test_order();
        order.claim_payment().unwrap();
        order
            .decline(PaymentAttempt::declined(
                PaymentMethod::CreditCard,
                "Payment declined by processor",
            ))
            .unwrap();
        order.claim_payment().unwrap();
        order
            .settle(PaymentAttempt::approved(
                "PAY-0002",
                "TXN-0002",
                PaymentMethod::CreditCard,
            ))
            .unwrap();

        let details = order.payment_details.unwrap();
        assert_eq!(details.payment_id.as_deref(), Some("PAY-0002"));
        assert!(details.error.is_none());
    }

    #[test]
    fn test_cannot_claim_completed_order() {
        let mut order = test_order();
        order.claim_payment().unwrap();
        order
            .settle(PaymentAttempt::approved(
                "PAY-0001",
                "TXN-0001",
                PaymentMethod::CreditCard,
            ))
            .unwrap();

        let result = order.claim_payment();
        assert!(matches!(
            result,
            Err(OrderError::InvalidPaymentTransition {
                from: PaymentStatus::Completed,
                ..
            })
        ));
    }

    #[test]
    fn test_refund_only_from_completed() {
        let mut order = test_order();
        let details = RefundDetails {
            refund_id: "REF-0001".to_string(),
            amount: Money::from_cents(100),
            reason: None,
            refunded_at: Utc::now(),
        };

        let result = order.apply_refund(details.clone());
        assert!(matches!(
            result,
            Err(OrderError::InvalidPaymentTransition {
                from: PaymentStatus::Pending,
                ..
            })
        ));

        order.claim_payment().unwrap();
        order
            .settle(PaymentAttempt::approved(
                "PAY-0001",
                "TXN-0001",
                PaymentMethod::CreditCard,
            ))
            .unwrap();
        order.apply_refund(details).unwrap();
        assert_eq!(order.payment_status, PaymentStatus::Refunded);
        assert!(order.refund_details.is_some());
    }

    #[test]
    fn test_refund_exceeding_total_rejected() {
        let mut order = test_order();
        order.claim_payment().unwrap();
        order
            .settle(PaymentAttempt::approved(
                "PAY-0001",
                "TXN-0001",
                PaymentMethod::CreditCard,
            ))
            .unwrap();

        let result = order.apply_refund(RefundDetails {
            refund_id: "REF-0001".to_string(),
            amount: Money::from_cents(99999),
            reason: None,
            refunded_at: Utc::now(),
        });
        assert!(matches!(result, Err(OrderError::RefundExceedsTotal { .. })));
        assert_eq!(order.payment_status, PaymentStatus::Completed);
        assert!(order.refund_details.is_none());
    }

    #[test]
    fn test_order_serialization_roundtrip() {
        let order = test_order();
        let json = serde_json::to_string(&order).unwrap();
        let deserialized: Order = serde_json::from_str(&json).unwrap();
        assert_eq!(order, deserialized);
    }
}
