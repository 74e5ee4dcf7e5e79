//! Per-user cart store.

use std::collections::HashMap;
use std::sync::Arc;

use catalog::CatalogOracle;
use common::UserId;
use domain::{CartEntry, CourseId};
use tokio::sync::RwLock;

use crate::entitlements::EntitlementStore;
use crate::error::CartError;
use crate::identity::Identity;

/// Per-user set of courses awaiting purchase.
///
/// Membership is boolean (no quantity concept) and insertion order is
/// preserved for display and checkout. Mutations for one user are
/// linearized through the exclusive write section; the availability and
/// ownership checks run before it, the membership re-check inside it.
#[derive(Clone)]
pub struct CartStore<C: CatalogOracle> {
    carts: Arc<RwLock<HashMap<UserId, Vec<CartEntry>>>>,
    catalog: C,
    entitlements: EntitlementStore,
}

impl<C: CatalogOracle> CartStore<C> {
    /// Creates a new cart store consulting the given catalog oracle and
    /// entitlement set.
    pub fn new(catalog: C, entitlements: EntitlementStore) -> Self {
        Self {
            carts: Arc::new(RwLock::new(HashMap::new())),
            catalog,
            entitlements,
        }
    }

    /// Adds a course to the caller's cart.
    ///
    /// Consults the catalog for availability and the entitlement set for
    /// prior ownership before inserting. Returns the updated cart.
    #[tracing::instrument(skip(self, identity), fields(user_id = %identity.user_id, course_id = %course_id))]
    pub async fn add(
        &self,
        identity: &Identity,
        course_id: CourseId,
    ) -> Result<Vec<CartEntry>, CartError> {
        match self.catalog.quote(&course_id).await? {
            Some(quote) if quote.published => {}
            _ => return Err(CartError::CourseUnavailable(course_id)),
        }

        if self.entitlements.owns(&identity.user_id, &course_id).await {
            return Err(CartError::AlreadyOwned(course_id));
        }

        let mut carts = self.carts.write().await;
        let entries = carts.entry(identity.user_id).or_default();

        if entries.iter().any(|e| e.course_id == course_id) {
            return Err(CartError::AlreadyInCart(course_id));
        }

        entries.push(CartEntry::new(course_id));
        tracing::debug!(cart_size = entries.len(), "course added to cart");
        Ok(entries.clone())
    }

    /// Removes a course from the caller's cart.
    ///
    /// Idempotent: removing an absent entry is not an error. Returns the
    /// updated cart.
    #[tracing::instrument(skip(self, identity), fields(user_id = %identity.user_id, course_id = %course_id))]
    pub async fn remove(
        &self,
        identity: &Identity,
        course_id: &CourseId,
    ) -> Result<Vec<CartEntry>, CartError> {
        let mut carts = self.carts.write().await;
        let entries = carts.entry(identity.user_id).or_default();
        entries.retain(|e| &e.course_id != course_id);
        Ok(entries.clone())
    }

    /// Empties the caller's cart.
    pub async fn clear(&self, identity: &Identity) -> Result<(), CartError> {
        self.carts.write().await.remove(&identity.user_id);
        Ok(())
    }

    /// Returns the user's cart entries in insertion order.
    pub async fn snapshot(&self, user_id: &UserId) -> Vec<CartEntry> {
        self.carts
            .read()
            .await
            .get(user_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Removes exactly the named entries from the user's cart.
    ///
    /// This is the primitive order creation uses for its atomic
    /// snapshot-then-clear step: an add that lands after the snapshot
    /// but before the clear names a course outside `course_ids` and
    /// survives.
    pub(crate) async fn take_entries(
        &self,
        user_id: &UserId,
        course_ids: &[CourseId],
    ) -> Result<(), CartError> {
        let mut carts = self.carts.write().await;
        if let Some(entries) = carts.get_mut(user_id) {
            entries.retain(|e| !course_ids.contains(&e.course_id));
            if entries.is_empty() {
                carts.remove(user_id);
            }
        }
        Ok(())
    }
}
