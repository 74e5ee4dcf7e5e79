//! Request-scoped caller identity.
//!
//! Identity is passed explicitly into every orchestrator call rather
//! than read from ambient session state; session/token mechanics are the
//! caller's concern.

use common::UserId;
use serde::{Deserialize, Serialize};

/// The role a caller acts under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    /// A regular customer; may only touch their own records.
    Customer,

    /// An administrator; may refund and inspect any order, but gains no
    /// other bypass.
    Admin,
}

/// The authenticated caller of an orchestrator operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// The calling user.
    pub user_id: UserId,

    /// The role the caller acts under.
    pub role: Role,
}

impl Identity {
    /// Creates a customer identity.
    pub fn customer(user_id: UserId) -> Self {
        Self {
            user_id,
            role: Role::Customer,
        }
    }

    /// Creates an admin identity.
    pub fn admin(user_id: UserId) -> Self {
        Self {
            user_id,
            role: Role::Admin,
        }
    }

    /// Returns true if the caller is an administrator.
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}
