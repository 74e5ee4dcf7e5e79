//! Entitlement granter: idempotent owned-course records.

use std::collections::HashMap;
use std::sync::Arc;

use common::UserId;
use domain::{CourseId, Entitlement};
use tokio::sync::RwLock;

/// Outcome of a grant call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrantOutcome {
    /// A new entitlement was created.
    Granted,

    /// The user already owned the course; nothing changed.
    AlreadyOwned,
}

/// Per-user owned-course store.
///
/// Granting is an idempotent upsert: the membership check and the insert
/// happen under one exclusive section, so concurrent grants for the same
/// (user, course) never produce duplicates. Grants are never revoked;
/// refunds affect only the order ledger.
#[derive(Clone, Default)]
pub struct EntitlementStore {
    owned: Arc<RwLock<HashMap<UserId, Vec<Entitlement>>>>,
}

impl EntitlementStore {
    /// Creates a new empty entitlement store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Grants a course to a user, idempotently.
    #[tracing::instrument(skip(self), fields(user_id = %user_id, course_id = %course_id))]
    pub async fn grant(&self, user_id: &UserId, course_id: CourseId) -> GrantOutcome {
        let mut owned = self.owned.write().await;
        let entitlements = owned.entry(*user_id).or_default();

        if entitlements.iter().any(|e| e.course_id == course_id) {
            return GrantOutcome::AlreadyOwned;
        }

        entitlements.push(Entitlement::new(course_id));
        metrics::counter!("entitlements_granted_total").increment(1);
        tracing::info!("entitlement granted");
        GrantOutcome::Granted
    }

    /// Returns true if the user owns the course.
    pub async fn owns(&self, user_id: &UserId, course_id: &CourseId) -> bool {
        self.owned
            .read()
            .await
            .get(user_id)
            .is_some_and(|entitlements| entitlements.iter().any(|e| &e.course_id == course_id))
    }

    /// Returns the user's entitlements in grant order.
    pub async fn owned_courses(&self, user_id: &UserId) -> Vec<Entitlement> {
        self.owned
            .read()
            .await
            .get(user_id)
            .cloned()
            .unwrap_or_default()
    }
}
