//! Demo entry point: walks the checkout pipeline end to end on the
//! in-memory stack with tracing output.
//!
//! Simulator knobs are read from the environment: `PAYMENT_FAILURE_RATE`,
//! `PAYMENT_MIN_DELAY_MS`, `PAYMENT_MAX_DELAY_MS`, plus `RUST_LOG` for
//! the tracing filter.

use catalog::InMemoryCatalog;
use checkout::{
    CheckoutError, CreateOrderRequest, Identity, LoggingNotifier, Orchestrator, PaymentResult,
    SimulatedGateway, SimulatorConfig,
};
use common::UserId;
use domain::{BillingDetails, CourseId, Money, PaymentDetails, PaymentMethod};
use ledger::InMemoryOrderLedger;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

async fn run() -> Result<(), CheckoutError> {
    // Seed a small catalog.
    let catalog = InMemoryCatalog::new();
    catalog.publish("rust-fundamentals", Money::from_cents(4999));
    catalog.publish("async-rust", Money::from_cents(7999));
    catalog.publish("systems-programming", Money::from_cents(12999));
    tracing::info!(courses = catalog.course_count(), "catalog seeded");

    let config = SimulatorConfig::from_env();
    tracing::info!(
        failure_rate = config.failure_rate,
        min_delay_ms = config.min_delay.as_millis() as u64,
        max_delay_ms = config.max_delay.as_millis() as u64,
        "payment simulator configured"
    );

    let orchestrator = Orchestrator::new(
        InMemoryOrderLedger::new(),
        catalog,
        SimulatedGateway::new(config),
        LoggingNotifier::new(),
    );

    let identity = Identity::customer(UserId::new());
    tracing::info!(user_id = %identity.user_id, "customer session started");

    // Fill the cart.
    orchestrator
        .cart()
        .add(&identity, CourseId::new("rust-fundamentals"))
        .await?;
    let cart = orchestrator
        .cart()
        .add(&identity, CourseId::new("async-rust"))
        .await?;
    tracing::info!(cart_size = cart.len(), "cart filled");

    // Checkout.
    let order = orchestrator
        .create_order(
            &identity,
            CreateOrderRequest::from_cart(
                PaymentMethod::CreditCard,
                BillingDetails::new("Demo Customer", "demo@example.com"),
            ),
        )
        .await?;
    tracing::info!(order_id = %order.id, total = %order.total_amount, "order created");

    // Pay, retrying a few times if the simulator declines.
    const MAX_ATTEMPTS: u32 = 5;
    let mut settled = false;
    for attempt in 1..=MAX_ATTEMPTS {
        let (order, result) = orchestrator
            .process_payment(
                &identity,
                order.id,
                PaymentMethod::CreditCard,
                PaymentDetails::card("4242"),
            )
            .await?;

        match result {
            PaymentResult::Approved { payment_id, .. } => {
                tracing::info!(order_id = %order.id, %payment_id, attempt, "payment settled");
                settled = true;
                break;
            }
            PaymentResult::Declined { reason } => {
                tracing::warn!(order_id = %order.id, %reason, attempt, "payment declined, retrying");
            }
        }
    }
    if !settled {
        tracing::error!(order_id = %order.id, "payment never settled, giving up");
        return Ok(());
    }

    let owned = orchestrator.entitlements().owned_courses(&identity.user_id).await;
    tracing::info!(courses = owned.len(), "entitlements granted");

    // Refund the order to exercise the full lifecycle.
    let (order, result) = orchestrator
        .refund(&identity, order.id, None, Some("demo walkthrough".to_string()))
        .await?;
    tracing::info!(
        order_id = %order.id,
        payment_status = %order.payment_status,
        approved = result.is_approved(),
        "refund processed"
    );

    Ok(())
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Err(e) = run().await {
        tracing::error!(error = %e, "demo failed");
        std::process::exit(1);
    }

    tracing::info!("demo finished");
}
