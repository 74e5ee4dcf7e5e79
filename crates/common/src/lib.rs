//! Shared types for the commerce pipeline.
//!
//! This crate provides the identifier newtypes used across every other
//! crate in the workspace, plus the [`Revision`] token the order ledger
//! uses for optimistic concurrency control.

pub mod types;

pub use types::{OrderId, Revision, UserId};
