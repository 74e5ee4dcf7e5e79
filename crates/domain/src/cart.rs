//! Cart entry record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::value_objects::CourseId;

/// A course awaiting purchase in a user's cart.
///
/// Presence is boolean membership; there is no quantity concept. At most
/// one entry exists per (user, course) — the cart store enforces it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartEntry {
    /// The course to be purchased.
    pub course_id: CourseId,

    /// When the entry was added.
    pub added_at: DateTime<Utc>,
}

impl CartEntry {
    /// Creates a new cart entry stamped with the current time.
    pub fn new(course_id: impl Into<CourseId>) -> Self {
        Self {
            course_id: course_id.into(),
            added_at: Utc::now(),
        }
    }
}
