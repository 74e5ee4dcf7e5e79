//! Order confirmation hook.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use common::OrderId;
use domain::Order;
use thiserror::Error;

/// Errors from a notifier implementation.
///
/// Notification failure never propagates to the payment caller; the
/// orchestrator logs it and moves on.
#[derive(Debug, Error)]
pub enum NotifyError {
    /// The notification could not be delivered.
    #[error("Notification delivery failed: {0}")]
    Delivery(String),
}

/// Fire-and-forget hook invoked after successful settlement.
///
/// Email delivery itself is out of scope; implementations adapt this to
/// whatever transport the deployment uses.
#[async_trait]
pub trait EmailNotifier: Send + Sync {
    /// Called once per successful settlement with the settled order.
    async fn order_confirmed(&self, order: &Order) -> Result<(), NotifyError>;
}

/// Notifier that only writes a tracing event; used by the demo.
#[derive(Debug, Clone, Default)]
pub struct LoggingNotifier;

impl LoggingNotifier {
    /// Creates a new logging notifier.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl EmailNotifier for LoggingNotifier {
    async fn order_confirmed(&self, order: &Order) -> Result<(), NotifyError> {
        tracing::info!(
            order_id = %order.id,
            user_id = %order.user_id,
            total = %order.total_amount,
            email = %order.billing.email,
            "order confirmation email sent"
        );
        Ok(())
    }
}

#[derive(Debug, Default)]
struct RecordingState {
    notified: Vec<OrderId>,
    fail_on_notify: bool,
}

/// Test double that records notified orders and can be told to fail.
#[derive(Debug, Clone, Default)]
pub struct RecordingNotifier {
    state: Arc<Mutex<RecordingState>>,
}

impl RecordingNotifier {
    /// Creates a new recording notifier.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the notifier to fail all deliveries.
    pub fn set_fail_on_notify(&self, fail: bool) {
        self.state.lock().unwrap().fail_on_notify = fail;
    }

    /// Returns the orders notified so far, in order.
    pub fn notified_orders(&self) -> Vec<OrderId> {
        self.state.lock().unwrap().notified.clone()
    }
}

#[async_trait]
impl EmailNotifier for RecordingNotifier {
    async fn order_confirmed(&self, order: &Order) -> Result<(), NotifyError> {
        let mut state = self.state.lock().unwrap();
        if state.fail_on_notify {
            return Err(NotifyError::Delivery("smtp relay refused".to_string()));
        }
        state.notified.push(order.id);
        Ok(())
    }
}
