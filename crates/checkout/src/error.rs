//! Checkout error types and their taxonomy.

use catalog::CatalogError;
use common::OrderId;
use domain::{CourseId, Money, OrderError, PaymentMethod, PaymentStatus};
use ledger::LedgerError;
use thiserror::Error;

/// Classification of checkout errors, used by callers to pick UX.
///
/// Conflicts are idempotent no-ops ("you already own this"), validation
/// errors are hard rejections before any state mutation, and transient
/// errors are infrastructure faults worth retrying.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad input, rejected before any state mutation.
    Validation,

    /// The operation collided with existing state; safe to present as a
    /// no-op.
    Conflict,

    /// The referenced record does not exist.
    NotFound,

    /// The caller is not allowed to touch the referenced record.
    Forbidden,

    /// Infrastructure fault (ledger or oracle unreachable); retryable.
    Transient,
}

/// Errors from cart mutation operations.
#[derive(Debug, Error)]
pub enum CartError {
    /// The course is already in the user's cart.
    #[error("Course already in cart: {0}")]
    AlreadyInCart(CourseId),

    /// The user already owns the course.
    #[error("Course already owned: {0}")]
    AlreadyOwned(CourseId),

    /// The course is unknown or unpublished.
    #[error("Course unavailable: {0}")]
    CourseUnavailable(CourseId),

    /// Catalog oracle error.
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),
}

impl CartError {
    /// Returns the taxonomy classification of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            CartError::AlreadyInCart(_) | CartError::AlreadyOwned(_) => ErrorKind::Conflict,
            CartError::CourseUnavailable(_) => ErrorKind::Validation,
            CartError::Catalog(_) => ErrorKind::Transient,
        }
    }
}

/// Errors from orchestrator operations.
///
/// A declined payment is NOT an error: it is recorded on the order and
/// returned as a normal result. Everything here either rejected the
/// operation before mutation or prevented it from completing.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// No line items could be resolved for order creation.
    #[error("Cart is empty")]
    EmptyCart,

    /// A referenced course is unknown or unpublished; the whole order is
    /// aborted (partial orders are never created).
    #[error("Course cannot be purchased: {0}")]
    InvalidCourse(CourseId),

    /// The gateway does not accept the selected payment method.
    #[error("Payment method not supported: {0}")]
    MethodNotSupported(PaymentMethod),

    /// The order does not exist.
    #[error("Order not found: {0}")]
    OrderNotFound(OrderId),

    /// The caller does not own the order (and is not an admin where
    /// admin access applies).
    #[error("Order {0} does not belong to the caller")]
    NotOrderOwner(OrderId),

    /// The order has already settled; re-processing is rejected.
    #[error("Order already settled: {0}")]
    AlreadySettled(OrderId),

    /// Another payment attempt currently holds the claim on this order.
    #[error("Payment already in flight for order {0}")]
    PaymentInFlight(OrderId),

    /// Refund requested for an order whose payment has not completed.
    #[error("Order {order_id} cannot be refunded while payment is {status}")]
    RefundNotAllowed {
        order_id: OrderId,
        status: PaymentStatus,
    },

    /// Refund amount is not positive or exceeds the order total.
    #[error("Refund amount {requested} is outside (0, {total}]")]
    InvalidRefundAmount { requested: Money, total: Money },

    /// A settled order is missing its payment record; the ledger state
    /// is inconsistent.
    #[error("Order {0} has no recorded payment to refund")]
    MissingPaymentRecord(OrderId),

    /// Cart mutation error.
    #[error("Cart error: {0}")]
    Cart(#[from] CartError),

    /// Order record invariant violation.
    #[error("Order error: {0}")]
    Order(#[from] OrderError),

    /// Catalog oracle error.
    #[error("Catalog error: {0}")]
    Catalog(CatalogError),

    /// Order ledger error.
    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),
}

impl CheckoutError {
    /// Returns the taxonomy classification of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            CheckoutError::EmptyCart
            | CheckoutError::InvalidCourse(_)
            | CheckoutError::MethodNotSupported(_)
            | CheckoutError::InvalidRefundAmount { .. } => ErrorKind::Validation,
            CheckoutError::AlreadySettled(_)
            | CheckoutError::PaymentInFlight(_)
            | CheckoutError::RefundNotAllowed { .. }
            | CheckoutError::Order(_) => ErrorKind::Conflict,
            CheckoutError::OrderNotFound(_) => ErrorKind::NotFound,
            CheckoutError::NotOrderOwner(_) => ErrorKind::Forbidden,
            CheckoutError::MissingPaymentRecord(_) | CheckoutError::Catalog(_) => {
                ErrorKind::Transient
            }
            CheckoutError::Cart(e) => e.kind(),
            CheckoutError::Ledger(e) => match e {
                LedgerError::RevisionConflict { .. } | LedgerError::DuplicateOrder(_) => {
                    ErrorKind::Conflict
                }
                LedgerError::OrderNotFound(_) => ErrorKind::NotFound,
                _ => ErrorKind::Transient,
            },
        }
    }
}
