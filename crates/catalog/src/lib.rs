//! Read-only course catalog oracle.
//!
//! The checkout core consumes the catalog as a price/availability oracle
//! and never mutates it. The real catalog (course content, reviews,
//! categories) lives elsewhere; this crate defines the narrow interface
//! the pipeline needs plus an in-memory implementation for tests and the
//! demo.

pub mod error;
pub mod oracle;

pub use error::{CatalogError, Result};
pub use oracle::{CatalogOracle, CourseQuote, InMemoryCatalog};
