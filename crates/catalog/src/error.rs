//! Catalog error types.

use thiserror::Error;

/// Errors that can occur when querying the catalog oracle.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The oracle could not be reached (transient infrastructure fault).
    #[error("Catalog unavailable: {0}")]
    Unavailable(String),
}

/// Result type for catalog operations.
pub type Result<T> = std::result::Result<T, CatalogError>;
