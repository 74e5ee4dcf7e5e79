//! The commerce transaction pipeline.
//!
//! This crate implements the path from a user's shopping cart, through
//! order creation, through (simulated) payment settlement, to the grant
//! of course access:
//! - [`CartStore`] — per-user pending-purchase set
//! - [`EntitlementStore`] — idempotent owned-course grants
//! - [`PaymentGateway`] / [`SimulatedGateway`] — pluggable gateway with
//!   a randomized simulator implementation
//! - [`EmailNotifier`] — fire-and-forget confirmation hook
//! - [`Orchestrator`] — coordinates the above against the order ledger

pub mod cart;
pub mod entitlements;
pub mod error;
pub mod gateway;
pub mod identity;
pub mod notifier;
pub mod orchestrator;

pub use cart::CartStore;
pub use entitlements::{EntitlementStore, GrantOutcome};
pub use error::{CartError, CheckoutError, ErrorKind};
pub use gateway::{
    ChargeRequest, PaymentGateway, PaymentResult, RefundRequest, RefundResult, SimulatedGateway,
    SimulatorConfig,
};
pub use identity::{Identity, Role};
pub use notifier::{EmailNotifier, LoggingNotifier, NotifyError, RecordingNotifier};
pub use orchestrator::{CreateOrderRequest, LineItemSource, Orchestrator};
