//! Entitlement record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::value_objects::CourseId;

/// A durable grant of course access to a user.
///
/// At most one entitlement exists per (user, course); granting an
/// already-owned course is a no-op, not an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entitlement {
    /// The owned course.
    pub course_id: CourseId,

    /// When access was granted.
    pub granted_at: DateTime<Utc>,
}

impl Entitlement {
    /// Creates a new entitlement stamped with the current time.
    pub fn new(course_id: impl Into<CourseId>) -> Self {
        Self {
            course_id: course_id.into(),
            granted_at: Utc::now(),
        }
    }
}
