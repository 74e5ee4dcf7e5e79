//! Payment gateway trait and the randomized simulator.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use common::OrderId;
use domain::{Money, PaymentDetails, PaymentMethod};
use rand::Rng;

/// Decline reason reported by the simulator's random failures.
pub const DECLINED_BY_PROCESSOR: &str = "Payment declined by processor";

/// A charge request sent to the gateway.
#[derive(Debug, Clone)]
pub struct ChargeRequest {
    /// The order being paid for (correlation only; the gateway does not
    /// read the ledger).
    pub order_id: OrderId,

    /// Amount to charge.
    pub amount: Money,

    /// Selected payment method.
    pub method: PaymentMethod,

    /// Method-specific input.
    pub details: PaymentDetails,
}

/// Terminal resolution of a charge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentResult {
    /// The charge settled.
    Approved {
        payment_id: String,
        transaction_id: String,
    },

    /// The charge was declined. This is an expected business outcome,
    /// not an error.
    Declined { reason: String },
}

impl PaymentResult {
    /// Returns true if the charge settled.
    pub fn is_approved(&self) -> bool {
        matches!(self, PaymentResult::Approved { .. })
    }
}

/// A refund request sent to the gateway.
#[derive(Debug, Clone)]
pub struct RefundRequest {
    /// The payment to refund, as assigned by the gateway at charge time.
    pub payment_id: String,

    /// Amount to refund; may be less than the charged amount.
    pub amount: Money,
}

/// Terminal resolution of a refund.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefundResult {
    /// The refund settled.
    Approved { refund_id: String },

    /// The refund was declined.
    Declined { reason: String },
}

impl RefundResult {
    /// Returns true if the refund settled.
    pub fn is_approved(&self) -> bool {
        matches!(self, RefundResult::Approved { .. })
    }
}

/// Pluggable payment gateway.
///
/// The simulator is one implementation; a production gateway satisfies
/// the same asynchronous contract. Declines are values, not errors: an
/// implementation maps its own transport failures to `Declined` with a
/// reason.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Returns true if the gateway accepts the given method.
    fn supports(&self, method: PaymentMethod) -> bool {
        let _ = method;
        true
    }

    /// Charges the given amount. The only suspension point in the
    /// pipeline: callers must not hold locks across this.
    async fn charge(&self, request: ChargeRequest) -> PaymentResult;

    /// Refunds a previously settled payment.
    async fn refund(&self, request: RefundRequest) -> RefundResult;
}

/// Tuning knobs for the simulated gateway.
#[derive(Debug, Clone)]
pub struct SimulatorConfig {
    /// Probability that a charge is randomly declined (0.0..=1.0).
    pub failure_rate: f64,

    /// Lower bound of the simulated charge latency.
    pub min_delay: Duration,

    /// Upper bound of the simulated charge latency.
    pub max_delay: Duration,

    /// Lower bound of the simulated refund latency.
    pub refund_min_delay: Duration,

    /// Upper bound of the simulated refund latency.
    pub refund_max_delay: Duration,

    /// Methods the simulator accepts; anything else is a deterministic
    /// decline.
    pub supported_methods: Vec<PaymentMethod>,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            failure_rate: 0.05,
            min_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(3),
            refund_min_delay: Duration::from_millis(300),
            refund_max_delay: Duration::from_secs(1),
            supported_methods: vec![
                PaymentMethod::CreditCard,
                PaymentMethod::DebitCard,
                PaymentMethod::Paypal,
            ],
        }
    }
}

impl SimulatorConfig {
    /// Returns a config with all delays zeroed, for tests and benches.
    pub fn instant() -> Self {
        Self {
            min_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            refund_min_delay: Duration::ZERO,
            refund_max_delay: Duration::ZERO,
            ..Self::default()
        }
    }

    /// Loads overrides from the environment, falling back to defaults.
    ///
    /// Reads `PAYMENT_FAILURE_RATE` (fraction), `PAYMENT_MIN_DELAY_MS`
    /// and `PAYMENT_MAX_DELAY_MS`.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(rate) = std::env::var("PAYMENT_FAILURE_RATE")
            .ok()
            .and_then(|v| v.parse::<f64>().ok())
        {
            config.failure_rate = rate.clamp(0.0, 1.0);
        }
        if let Some(ms) = std::env::var("PAYMENT_MIN_DELAY_MS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
        {
            config.min_delay = Duration::from_millis(ms);
        }
        if let Some(ms) = std::env::var("PAYMENT_MAX_DELAY_MS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
        {
            config.max_delay = Duration::from_millis(ms);
        }
        if config.max_delay < config.min_delay {
            config.max_delay = config.min_delay;
        }
        config
    }
}

#[derive(Debug, Default)]
struct SimulatorState {
    payments: HashMap<String, Money>,
    next_payment: u32,
    next_refund: u32,
}

/// Randomized stand-in for a real payment gateway.
///
/// Charges resolve after a bounded random delay and are declined with a
/// fixed probability independent of input. Refunds are shorter and
/// settle once the payment ID is recognized, unless the gateway was
/// built with [`SimulatedGateway::decline_refunds`].
#[derive(Clone)]
pub struct SimulatedGateway {
    config: SimulatorConfig,
    forced_outcome: Option<bool>,
    refunds_declined: bool,
    state: Arc<Mutex<SimulatorState>>,
}

impl SimulatedGateway {
    /// Creates a simulator with the given config.
    pub fn new(config: SimulatorConfig) -> Self {
        Self {
            config,
            forced_outcome: None,
            refunds_declined: false,
            state: Arc::new(Mutex::new(SimulatorState::default())),
        }
    }

    /// Configures the simulator to decline every refund, even for a
    /// recognized payment.
    pub fn decline_refunds(mut self) -> Self {
        self.refunds_declined = true;
        self
    }

    /// Creates an instant simulator that approves every charge.
    pub fn always_approve() -> Self {
        Self {
            forced_outcome: Some(true),
            ..Self::new(SimulatorConfig::instant())
        }
    }

    /// Creates an instant simulator that declines every charge.
    pub fn always_decline() -> Self {
        Self {
            forced_outcome: Some(false),
            ..Self::new(SimulatorConfig::instant())
        }
    }

    /// Returns the number of settled payments.
    pub fn payment_count(&self) -> usize {
        self.state.lock().unwrap().payments.len()
    }

    /// Returns true if a payment exists with the given ID.
    pub fn has_payment(&self, payment_id: &str) -> bool {
        self.state.lock().unwrap().payments.contains_key(payment_id)
    }

    fn random_delay(&self, min: Duration, max: Duration) -> Duration {
        if max <= min {
            return min;
        }
        let millis = rand::thread_rng().gen_range(min.as_millis() as u64..=max.as_millis() as u64);
        Duration::from_millis(millis)
    }

    fn draw_outcome(&self) -> bool {
        match self.forced_outcome {
            Some(outcome) => outcome,
            None => rand::thread_rng().r#gen::<f64>() >= self.config.failure_rate,
        }
    }
}

#[async_trait]
impl PaymentGateway for SimulatedGateway {
    fn supports(&self, method: PaymentMethod) -> bool {
        self.config.supported_methods.contains(&method)
    }

    async fn charge(&self, request: ChargeRequest) -> PaymentResult {
        // Deterministic decline, no delay and no random draw consumed.
        if !self.supports(request.method) {
            return PaymentResult::Declined {
                reason: format!("Payment method {} is not supported", request.method),
            };
        }

        // Draw delay and outcome up front; ThreadRng must not be held
        // across the await.
        let delay = self.random_delay(self.config.min_delay, self.config.max_delay);
        let approved = self.draw_outcome();

        tokio::time::sleep(delay).await;

        if !approved {
            return PaymentResult::Declined {
                reason: DECLINED_BY_PROCESSOR.to_string(),
            };
        }

        let mut state = self.state.lock().unwrap();
        state.next_payment += 1;
        let payment_id = format!("PAY-{:04}", state.next_payment);
        let transaction_id = format!("TXN-{:04}", state.next_payment);
        state.payments.insert(payment_id.clone(), request.amount);

        PaymentResult::Approved {
            payment_id,
            transaction_id,
        }
    }

    async fn refund(&self, request: RefundRequest) -> RefundResult {
        if !self.has_payment(&request.payment_id) {
            return RefundResult::Declined {
                reason: format!("Unknown payment: {}", request.payment_id),
            };
        }

        let delay = self.random_delay(self.config.refund_min_delay, self.config.refund_max_delay);
        tokio::time::sleep(delay).await;

        if self.refunds_declined {
            return RefundResult::Declined {
                reason: "Refund declined by processor".to_string(),
            };
        }

        let mut state = self.state.lock().unwrap();
        state.next_refund += 1;
        RefundResult::Approved {
            refund_id: format!("REF-{:04}", state.next_refund),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn charge_request(method: PaymentMethod) -> ChargeRequest {
        ChargeRequest {
            order_id: OrderId::new(),
            amount: Money::from_cents(5000),
            method,
            details: PaymentDetails::card("4242"),
        }
    }

    #[tokio::test]
    async fn test_always_approve_assigns_sequential_ids() {
        let gateway = SimulatedGateway::always_approve();

        let r1 = gateway.charge(charge_request(PaymentMethod::CreditCard)).await;
        let r2 = gateway.charge(charge_request(PaymentMethod::CreditCard)).await;

        assert_eq!(
            r1,
            PaymentResult::Approved {
                payment_id: "PAY-0001".to_string(),
                transaction_id: "TXN-0001".to_string(),
            }
        );
        assert_eq!(
            r2,
            PaymentResult::Approved {
                payment_id: "PAY-0002".to_string(),
                transaction_id: "TXN-0002".to_string(),
            }
        );
        assert_eq!(gateway.payment_count(), 2);
    }

    #[tokio::test]
    async fn test_always_decline() {
        let gateway = SimulatedGateway::always_decline();
        let result = gateway.charge(charge_request(PaymentMethod::CreditCard)).await;
        assert_eq!(
            result,
            PaymentResult::Declined {
                reason: DECLINED_BY_PROCESSOR.to_string(),
            }
        );
        assert_eq!(gateway.payment_count(), 0);
    }

    #[tokio::test]
    async fn test_unsupported_method_declines_deterministically() {
        // Even an always-approve gateway declines a method outside its
        // supported set.
        let gateway = SimulatedGateway::always_approve();
        let result = gateway
            .charge(charge_request(PaymentMethod::BankTransfer))
            .await;
        assert!(matches!(result, PaymentResult::Declined { ref reason }
            if reason.contains("not supported")));
    }

    #[tokio::test]
    async fn test_refund_known_payment_approves() {
        let gateway = SimulatedGateway::always_approve();
        let charged = gateway.charge(charge_request(PaymentMethod::CreditCard)).await;
        let PaymentResult::Approved { payment_id, .. } = charged else {
            panic!("expected approval");
        };

        let result = gateway
            .refund(RefundRequest {
                payment_id,
                amount: Money::from_cents(5000),
            })
            .await;
        assert_eq!(
            result,
            RefundResult::Approved {
                refund_id: "REF-0001".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn test_decline_refunds_overrides_known_payment() {
        let gateway = SimulatedGateway::always_approve().decline_refunds();
        let charged = gateway.charge(charge_request(PaymentMethod::CreditCard)).await;
        let PaymentResult::Approved { payment_id, .. } = charged else {
            panic!("expected approval");
        };

        let result = gateway
            .refund(RefundRequest {
                payment_id,
                amount: Money::from_cents(5000),
            })
            .await;
        assert!(matches!(result, RefundResult::Declined { .. }));
    }

    #[tokio::test]
    async fn test_refund_unknown_payment_declines() {
        let gateway = SimulatedGateway::always_approve();
        let result = gateway
            .refund(RefundRequest {
                payment_id: "PAY-9999".to_string(),
                amount: Money::from_cents(100),
            })
            .await;
        assert!(matches!(result, RefundResult::Declined { .. }));
    }

    #[test]
    fn test_instant_config_zeroes_delays() {
        let config = SimulatorConfig::instant();
        assert_eq!(config.min_delay, Duration::ZERO);
        assert_eq!(config.max_delay, Duration::ZERO);
        assert_eq!(config.refund_max_delay, Duration::ZERO);
        // Failure rate is untouched; forced-outcome constructors exist
        // for deterministic tests.
        assert!(config.failure_rate > 0.0);
    }
}
