//! Domain model for the commerce pipeline.
//!
//! This crate provides the records the checkout core operates on:
//! - Value objects: [`CourseId`], [`Money`], [`PaymentMethod`],
//!   [`BillingDetails`], [`PaymentDetails`]
//! - The [`Order`] record with its payment/fulfillment status machines
//! - Per-user records: [`CartEntry`] and [`Entitlement`]

pub mod cart;
pub mod entitlement;
pub mod error;
pub mod order;
pub mod status;
pub mod value_objects;

pub use cart::CartEntry;
pub use entitlement::Entitlement;
pub use error::OrderError;
pub use order::{LineItem, Order, PaymentAttempt, RefundDetails};
pub use status::{FulfillmentStatus, PaymentStatus};
pub use value_objects::{BillingDetails, CourseId, Money, PaymentDetails, PaymentMethod};
