//! Authorization module - tenant & role resolution and resource policies
//!
//! Every authenticated request resolves its subject into a [`Requester`]
//! (`{id, role, business_id}`) and asks the [`ResourcePolicy`] of the entity it
//! touches for:
//! - the tenant scope a listing may return
//! - the business a new row is created under
//! - whether an existing row may be changed or removed

mod policy;
mod principal;

pub use policy::{
    guard_business_assignment, guard_role_assignment, guard_self_delete, guard_support_only, ResourcePolicy,
    APPOINTMENTS, BUSINESSES, CUSTOMERS, FINANCIAL, GOALS, PETS, SERVICES, USERS,
};
pub use principal::{resolve_requester, Requester};

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::errors::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Cross-tenant operator.
    Support,
    Admin,
    User,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Support => "support",
            Role::Admin => "admin",
            Role::User => "user",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "support" => Ok(Role::Support),
            "admin" => Ok(Role::Admin),
            "user" => Ok(Role::User),
            other => Err(AppError::internal(format!("unknown role stored: {other}"))),
        }
    }
}

/// Which tenants a query may touch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TenantScope {
    All,
    Business(i64),
}
