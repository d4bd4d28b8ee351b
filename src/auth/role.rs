// Role hierarchy and rank comparisons
// Lower rank value = more privileged; all privilege checks go through Rank

use crate::auth::error::AuthError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Ordered role hierarchy
///
/// Declaration order is the hierarchy: `SuperAdmin` outranks everything,
/// `User` outranks nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, utoipa::ToSchema)]
#[serde(rename_all = "kebab-case")]
#[sqlx(type_name = "varchar", rename_all = "kebab-case")]
pub enum Role {
    SuperAdmin,
    Admin,
    Moderator,
    User,
}

/// Position of a role within the hierarchy
///
/// Kept as a dedicated type so privilege comparisons read as
/// `caller.dominates(target)` instead of raw integer comparisons whose
/// direction is easy to get backwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Rank(pub u8);

impl Rank {
    /// True when `self` is at least as privileged as `other`
    pub fn dominates(self, other: Rank) -> bool {
        self.0 <= other.0
    }
}

impl Role {
    /// All roles in hierarchy order, most privileged first
    pub const ALL: [Role; 4] = [Role::SuperAdmin, Role::Admin, Role::Moderator, Role::User];

    /// Rank of this role within the hierarchy (0 = most privileged)
    pub fn rank(self) -> Rank {
        match self {
            Role::SuperAdmin => Rank(0),
            Role::Admin => Rank(1),
            Role::Moderator => Rank(2),
            Role::User => Rank(3),
        }
    }

    /// Parse a role string, rejecting anything outside the hierarchy
    pub fn parse(value: &str) -> Result<Role, AuthError> {
        match value {
            "super-admin" => Ok(Role::SuperAdmin),
            "admin" => Ok(Role::Admin),
            "moderator" => Ok(Role::Moderator),
            "user" => Ok(Role::User),
            other => Err(AuthError::InvalidRole(other.to_string())),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::SuperAdmin => "super-admin",
            Role::Admin => "admin",
            Role::Moderator => "moderator",
            Role::User => "user",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Default for Role {
    /// New signups get the lowest-privilege role
    fn default() -> Self {
        Role::User
    }
}
