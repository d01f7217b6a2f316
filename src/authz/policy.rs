use super::{Requester, Role, TenantScope};
use crate::errors::{AppError, AppResult};

const ALL: &[Role] = &[Role::Support, Role::Admin, Role::User];
const STAFF: &[Role] = &[Role::Support, Role::Admin];
const SUPPORT: &[Role] = &[Role::Support];

/// Access rules for one resource type.
///
/// Evaluation order for every check:
/// 1. role not granted for the action -> 403
/// 2. support -> allowed across tenants
/// 3. admin/user -> allowed only inside their own business
#[derive(Debug, Clone, Copy)]
pub struct ResourcePolicy {
    pub resource: &'static str,
    readers: &'static [Role],
    creators: &'static [Role],
    mutators: &'static [Role],
}

pub const USERS: ResourcePolicy = ResourcePolicy {
    resource: "user",
    readers: STAFF,
    creators: STAFF,
    mutators: STAFF,
};

pub const BUSINESSES: ResourcePolicy = ResourcePolicy {
    resource: "business",
    readers: ALL,
    creators: SUPPORT,
    mutators: STAFF,
};

pub const CUSTOMERS: ResourcePolicy = ResourcePolicy {
    resource: "customer",
    readers: ALL,
    creators: ALL,
    mutators: ALL,
};

pub const PETS: ResourcePolicy = ResourcePolicy {
    resource: "pet",
    readers: ALL,
    creators: ALL,
    mutators: ALL,
};

pub const APPOINTMENTS: ResourcePolicy = ResourcePolicy {
    resource: "appointment",
    readers: ALL,
    creators: ALL,
    mutators: ALL,
};

pub const SERVICES: ResourcePolicy = ResourcePolicy {
    resource: "service",
    readers: ALL,
    creators: STAFF,
    mutators: STAFF,
};

pub const FINANCIAL: ResourcePolicy = ResourcePolicy {
    resource: "financial record",
    readers: ALL,
    creators: STAFF,
    mutators: STAFF,
};

pub const GOALS: ResourcePolicy = ResourcePolicy {
    resource: "goal",
    readers: ALL,
    creators: STAFF,
    mutators: STAFF,
};

impl ResourcePolicy {
    /// Tenant filter for a listing. `requested` is the `business_id` query
    /// parameter and only narrows a support listing; other roles are pinned to
    /// their own business whatever they ask for.
    pub fn list_scope(&self, requester: &Requester, requested: Option<i64>) -> AppResult<TenantScope> {
        self.require(self.readers, requester, "list")?;

        match requester.role {
            Role::Support => Ok(requested.map(TenantScope::Business).unwrap_or(TenantScope::All)),
            Role::Admin | Role::User => Ok(TenantScope::Business(requester.tenant_id()?)),
        }
    }

    pub fn check_read(&self, requester: &Requester, row_business: Option<i64>) -> AppResult<()> {
        self.require(self.readers, requester, "read")?;
        self.ensure_owner(requester, row_business, "read")
    }

    /// Business a new row is created under.
    ///
    /// Support: `explicit`, then `fallback` (handle-resolved or configured
    /// default), else 400. Admin/user: always their own business, and naming
    /// another one is a 403.
    pub fn create_target(
        &self,
        requester: &Requester,
        explicit: Option<i64>,
        fallback: Option<i64>,
    ) -> AppResult<i64> {
        self.require(self.creators, requester, "create")?;

        match requester.role {
            Role::Support => explicit
                .or(fallback)
                .ok_or_else(|| AppError::bad_request("business_id or handle is required")),
            Role::Admin | Role::User => {
                let own = requester.tenant_id()?;
                match explicit {
                    Some(target) if target != own => {
                        self.deny(requester, "create");
                        Err(AppError::forbidden(format!(
                            "cannot create a {} for another business",
                            self.resource
                        )))
                    }
                    _ => Ok(own),
                }
            }
        }
    }

    /// Role check for resources that are not created under a tenant.
    pub fn check_create(&self, requester: &Requester) -> AppResult<()> {
        self.require(self.creators, requester, "create")
    }

    /// Update/delete check against an already loaded row.
    pub fn check_mutate(&self, requester: &Requester, row_business: Option<i64>) -> AppResult<()> {
        self.require(self.mutators, requester, "modify")?;
        self.ensure_owner(requester, row_business, "modify")
    }

    fn require(&self, granted: &[Role], requester: &Requester, action: &str) -> AppResult<()> {
        if granted.contains(&requester.role) {
            return Ok(());
        }
        self.deny(requester, action);
        Err(AppError::forbidden(format!(
            "role {} cannot {} {} records",
            requester.role, action, self.resource
        )))
    }

    fn ensure_owner(&self, requester: &Requester, row_business: Option<i64>, action: &str) -> AppResult<()> {
        if requester.is_support() {
            return Ok(());
        }

        let own = requester.tenant_id()?;
        if row_business == Some(own) {
            return Ok(());
        }

        self.deny(requester, action);
        Err(AppError::forbidden(format!(
            "{} belongs to another business",
            self.resource
        )))
    }

    fn deny(&self, requester: &Requester, action: &str) {
        tracing::debug!(
            user_id = requester.id,
            role = %requester.role,
            resource = self.resource,
            action = action,
            "permission denied"
        );
    }
}

/// Operations reserved to the cross-tenant operator, such as deleting a
/// business or managing global goals.
pub fn guard_support_only(requester: &Requester, action: &str) -> AppResult<()> {
    if requester.is_support() {
        return Ok(());
    }
    tracing::debug!(user_id = requester.id, role = %requester.role, action = action, "permission denied");
    Err(AppError::forbidden(format!("only support can {action}")))
}

/// Only support may hand out the support role.
pub fn guard_role_assignment(requester: &Requester, role: Role) -> AppResult<()> {
    if role == Role::Support && !requester.is_support() {
        return Err(AppError::forbidden("only support can assign the support role"));
    }
    Ok(())
}

/// Blocks deleting the caller's own id through user management. Only the
/// exact same id is refused.
pub fn guard_self_delete(requester: &Requester, target_id: i64) -> AppResult<()> {
    if requester.id == target_id {
        return Err(AppError::forbidden("you cannot delete your own account"));
    }
    Ok(())
}

/// Admins cannot move accounts into another business.
pub fn guard_business_assignment(requester: &Requester, business_id: Option<i64>) -> AppResult<()> {
    if requester.is_support() {
        return Ok(());
    }
    match business_id {
        Some(target) if Some(target) != requester.business_id => {
            Err(AppError::forbidden("cannot assign a user to another business"))
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn support() -> Requester {
        Requester::new(1, Role::Support, None)
    }

    fn admin(business: i64) -> Requester {
        Requester::new(2, Role::Admin, Some(business))
    }

    fn user(business: i64) -> Requester {
        Requester::new(3, Role::User, Some(business))
    }

    #[test]
    fn support_lists_everything_or_the_requested_tenant() {
        assert_eq!(CUSTOMERS.list_scope(&support(), None).unwrap(), TenantScope::All);
        assert_eq!(
            CUSTOMERS.list_scope(&support(), Some(2)).unwrap(),
            TenantScope::Business(2)
        );
    }

    #[test]
    fn tenant_roles_ignore_the_business_parameter() {
        assert_eq!(
            CUSTOMERS.list_scope(&admin(1), Some(2)).unwrap(),
            TenantScope::Business(1)
        );
        assert_eq!(PETS.list_scope(&user(1), None).unwrap(), TenantScope::Business(1));
    }

    #[test]
    fn tenant_role_without_business_is_a_bad_request() {
        let orphan = Requester::new(9, Role::Admin, None);
        assert!(matches!(
            CUSTOMERS.list_scope(&orphan, None),
            Err(AppError::BadRequest(_))
        ));
    }

    #[test]
    fn users_cannot_list_accounts() {
        assert!(matches!(USERS.list_scope(&user(1), None), Err(AppError::Forbidden(_))));
    }

    #[test]
    fn support_create_needs_a_target() {
        assert_eq!(CUSTOMERS.create_target(&support(), Some(4), Some(5)).unwrap(), 4);
        assert_eq!(CUSTOMERS.create_target(&support(), None, Some(5)).unwrap(), 5);
        assert!(matches!(
            CUSTOMERS.create_target(&support(), None, None),
            Err(AppError::BadRequest(_))
        ));
    }

    #[test]
    fn admin_creates_only_in_own_business() {
        assert_eq!(CUSTOMERS.create_target(&admin(1), None, Some(7)).unwrap(), 1);
        assert_eq!(CUSTOMERS.create_target(&admin(1), Some(1), None).unwrap(), 1);
        assert!(matches!(
            CUSTOMERS.create_target(&admin(1), Some(2), None),
            Err(AppError::Forbidden(_))
        ));
    }

    #[test]
    fn users_cannot_create_services_or_businesses() {
        assert!(matches!(
            SERVICES.create_target(&user(1), None, None),
            Err(AppError::Forbidden(_))
        ));
        assert!(matches!(
            BUSINESSES.create_target(&admin(1), None, None),
            Err(AppError::Forbidden(_))
        ));
        assert_eq!(APPOINTMENTS.create_target(&user(1), None, None).unwrap(), 1);
    }

    #[test]
    fn mutation_requires_ownership() {
        assert!(CUSTOMERS.check_mutate(&support(), Some(8)).is_ok());
        assert!(CUSTOMERS.check_mutate(&admin(1), Some(1)).is_ok());
        assert!(matches!(
            CUSTOMERS.check_mutate(&admin(1), Some(2)),
            Err(AppError::Forbidden(_))
        ));
        assert!(matches!(
            GOALS.check_mutate(&admin(1), None),
            Err(AppError::Forbidden(_))
        ));
        assert!(matches!(
            FINANCIAL.check_mutate(&user(1), Some(1)),
            Err(AppError::Forbidden(_))
        ));
    }

    #[test]
    fn business_creation_is_support_only() {
        assert!(BUSINESSES.check_create(&support()).is_ok());
        assert!(matches!(BUSINESSES.check_create(&admin(1)), Err(AppError::Forbidden(_))));
        assert!(guard_support_only(&support(), "delete a business").is_ok());
        assert!(matches!(
            guard_support_only(&admin(1), "delete a business"),
            Err(AppError::Forbidden(_))
        ));
    }

    #[test]
    fn only_support_assigns_support() {
        assert!(guard_role_assignment(&support(), Role::Support).is_ok());
        assert!(guard_role_assignment(&admin(1), Role::Admin).is_ok());
        assert!(matches!(
            guard_role_assignment(&admin(1), Role::Support),
            Err(AppError::Forbidden(_))
        ));
        assert!(matches!(
            guard_role_assignment(&user(1), Role::Support),
            Err(AppError::Forbidden(_))
        ));
    }

    #[test]
    fn self_delete_blocks_exact_id_only() {
        let me = admin(1);
        assert!(matches!(guard_self_delete(&me, me.id), Err(AppError::Forbidden(_))));
        assert!(guard_self_delete(&me, me.id + 1).is_ok());
        assert!(matches!(guard_self_delete(&support(), 1), Err(AppError::Forbidden(_))));
    }

    #[test]
    fn admins_keep_accounts_in_their_business() {
        assert!(guard_business_assignment(&admin(1), Some(1)).is_ok());
        assert!(guard_business_assignment(&admin(1), None).is_ok());
        assert!(matches!(
            guard_business_assignment(&admin(1), Some(2)),
            Err(AppError::Forbidden(_))
        ));
        assert!(guard_business_assignment(&support(), Some(2)).is_ok());
    }
}
