//! Roles and the capability table.
//!
//! Authorization decisions are driven by one static table mapping
//! (resource, action) to allowed roles, so the whole contract is auditable
//! here instead of scattered string comparisons in handlers.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Closed set of principal categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Owner,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Owner => "owner",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Role::User),
            "owner" => Ok(Role::Owner),
            "admin" => Ok(Role::Admin),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

/// Protected resource kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Account,
    StoreProfile,
    Session,
}

/// Actions on a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Read,
    Manage,
}

/// Roles allowed for a (resource, action) pair, admin wildcard aside.
/// An empty slice means any authenticated identity.
const CAPABILITIES: &[(Resource, Action, &[Role])] = &[
    (Resource::Account, Action::Read, &[]),
    (Resource::Account, Action::Manage, &[Role::Admin]),
    (Resource::StoreProfile, Action::Read, &[]),
    (Resource::StoreProfile, Action::Manage, &[Role::Owner]),
    (Resource::Session, Action::Manage, &[]),
];

/// The roles allowed to perform `action` on `resource`.
///
/// Used by the authorization middleware as each route's required role set.
pub fn allowed_roles(resource: Resource, action: Action) -> &'static [Role] {
    CAPABILITIES
        .iter()
        .find(|(r, a, _)| *r == resource && *a == action)
        .map(|(_, _, roles)| *roles)
        .unwrap_or(&[Role::Admin])
}

/// Whether `role` may perform `action` on `resource`. Admin may do anything.
pub fn is_allowed(role: Role, resource: Resource, action: Action) -> bool {
    if role == Role::Admin {
        return true;
    }
    let allowed = allowed_roles(resource, action);
    allowed.is_empty() || allowed.contains(&role)
}
