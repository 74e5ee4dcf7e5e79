//! Catalog oracle trait and in-memory implementation.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use domain::{CourseId, Money};

use crate::error::{CatalogError, Result};

/// A price/availability quote for a single course.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CourseQuote {
    /// Current list price.
    pub price: Money,

    /// Whether the course is published and purchasable.
    pub published: bool,
}

/// Read-only source of course prices and publish state.
///
/// `quote` returns `None` for a course the catalog has never heard of;
/// an unpublished course returns a quote with `published == false`.
#[async_trait]
pub trait CatalogOracle: Send + Sync {
    /// Looks up the current price and publish state for a course.
    async fn quote(&self, course_id: &CourseId) -> Result<Option<CourseQuote>>;
}

#[derive(Debug, Default)]
struct InMemoryCatalogState {
    courses: HashMap<CourseId, CourseQuote>,
    fail_on_quote: bool,
}

/// In-memory catalog for tests and the demo.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalog {
    state: Arc<RwLock<InMemoryCatalogState>>,
}

impl InMemoryCatalog {
    /// Creates a new empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a published course at the given price.
    pub fn publish(&self, course_id: impl Into<CourseId>, price: Money) {
        self.state.write().unwrap().courses.insert(
            course_id.into(),
            CourseQuote {
                price,
                published: true,
            },
        );
    }

    /// Changes the price of an existing course.
    ///
    /// Existing orders must not observe the change; that is the whole
    /// point of price snapshotting at order creation.
    pub fn set_price(&self, course_id: &CourseId, price: Money) {
        if let Some(quote) = self.state.write().unwrap().courses.get_mut(course_id) {
            quote.price = price;
        }
    }

    /// Marks a course as unpublished without removing it.
    pub fn unpublish(&self, course_id: &CourseId) {
        if let Some(quote) = self.state.write().unwrap().courses.get_mut(course_id) {
            quote.published = false;
        }
    }

    /// Configures the oracle to fail all quote calls, simulating an
    /// unreachable catalog service.
    pub fn set_fail_on_quote(&self, fail: bool) {
        self.state.write().unwrap().fail_on_quote = fail;
    }

    /// Returns the number of courses in the catalog.
    pub fn course_count(&self) -> usize {
        self.state.read().unwrap().courses.len()
    }
}

#[async_trait]
impl CatalogOracle for InMemoryCatalog {
    async fn quote(&self, course_id: &CourseId) -> Result<Option<CourseQuote>> {
        let state = self.state.read().unwrap();
        if state.fail_on_quote {
            return Err(CatalogError::Unavailable(
                "catalog oracle is not responding".to_string(),
            ));
        }
        Ok(state.courses.get(course_id).copied())
    }
}
