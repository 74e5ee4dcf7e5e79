//! Durable order ledger.
//!
//! The ledger is the single source of truth for orders. It is
//! append-mostly: orders are inserted at checkout and updated through a
//! revision-checked compare-and-swap; they are never deleted once a
//! payment attempt has been recorded. Two implementations are provided:
//! an in-memory store for tests and the demo, and a PostgreSQL store.

pub mod error;
pub mod memory;
pub mod postgres;
pub mod store;

pub use error::{LedgerError, Result};
pub use memory::InMemoryOrderLedger;
pub use postgres::PostgresOrderLedger;
pub use store::OrderLedger;
