// Per-operation authorization rules over the role hierarchy
// Stateless: every rule is a pure function of caller and target ranks

use crate::auth::error::AuthError;
use crate::auth::role::Role;

/// Authorization policy consulted by the account service before each
/// privileged operation
///
/// All comparisons go through `Rank::dominates`, meaning "at least as
/// privileged as". Equal rank is always sufficient: an admin may act on
/// admins, a super-admin on super-admins.
pub struct AuthorizationPolicy;

impl AuthorizationPolicy {
    /// Caller may grant `target_role` to a new account only when at least as
    /// privileged as that role
    pub fn can_assign_role(caller: Role, target_role: Role) -> Result<(), AuthError> {
        if caller.rank().dominates(target_role.rank()) {
            Ok(())
        } else {
            Err(AuthError::InsufficientAccess {
                caller,
                target: target_role,
            })
        }
    }

    /// Only the top two ranks may list all users
    pub fn can_list_users(caller: Role) -> Result<(), AuthError> {
        if caller.rank().dominates(Role::Admin.rank()) {
            Ok(())
        } else {
            Err(AuthError::InsufficientAccess {
                caller,
                target: Role::Admin,
            })
        }
    }

    /// Caller may delete an account only when at least as privileged as it
    pub fn can_delete(caller: Role, target_role: Role) -> Result<(), AuthError> {
        if caller.rank().dominates(target_role.rank()) {
            Ok(())
        } else {
            Err(AuthError::InsufficientAccess {
                caller,
                target: target_role,
            })
        }
    }

    /// Cross-account updates require dominating the target's current role;
    /// self-updates are always permitted (role changes are stripped upstream)
    pub fn can_update(
        caller_id: i32,
        caller_role: Role,
        target_id: i32,
        target_role: Role,
    ) -> Result<(), AuthError> {
        if caller_id == target_id {
            return Ok(());
        }
        if caller_role.rank().dominates(target_role.rank()) {
            Ok(())
        } else {
            Err(AuthError::InsufficientAccess {
                caller: caller_role,
                target: target_role,
            })
        }
    }

    /// A role change additionally requires dominating the new role
    pub fn can_change_role_to(caller: Role, new_role: Role) -> Result<(), AuthError> {
        Self::can_assign_role(caller, new_role)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_moderator_cannot_assign_super_admin() {
        let result = AuthorizationPolicy::can_assign_role(Role::Moderator, Role::SuperAdmin);
        assert!(matches!(result, Err(AuthError::InsufficientAccess { .. })));
    }

    #[test]
    fn test_super_admin_can_assign_any_role() {
        for role in Role::ALL {
            assert!(AuthorizationPolicy::can_assign_role(Role::SuperAdmin, role).is_ok());
        }
    }

    #[test]
    fn test_equal_rank_may_create_peers() {
        assert!(AuthorizationPolicy::can_assign_role(Role::Admin, Role::Admin).is_ok());
        assert!(AuthorizationPolicy::can_assign_role(Role::Moderator, Role::Moderator).is_ok());
    }

    #[test]
    fn test_only_top_two_ranks_list_users() {
        assert!(AuthorizationPolicy::can_list_users(Role::SuperAdmin).is_ok());
        assert!(AuthorizationPolicy::can_list_users(Role::Admin).is_ok());
        assert!(AuthorizationPolicy::can_list_users(Role::Moderator).is_err());
        assert!(AuthorizationPolicy::can_list_users(Role::User).is_err());
    }

    #[test]
    fn test_delete_requires_dominating_target() {
        assert!(AuthorizationPolicy::can_delete(Role::Admin, Role::Moderator).is_ok());
        assert!(AuthorizationPolicy::can_delete(Role::Admin, Role::Admin).is_ok());
        assert!(AuthorizationPolicy::can_delete(Role::Admin, Role::SuperAdmin).is_err());
    }

    #[test]
    fn test_self_update_permitted_for_any_role() {
        for role in Role::ALL {
            assert!(AuthorizationPolicy::can_update(7, role, 7, role).is_ok());
        }
    }

    #[test]
    fn test_cross_update_requires_dominance() {
        assert!(AuthorizationPolicy::can_update(1, Role::Admin, 2, Role::User).is_ok());
        // Equal rank is sufficient, same comparison as delete and create
        assert!(AuthorizationPolicy::can_update(1, Role::User, 2, Role::User).is_ok());
        assert!(AuthorizationPolicy::can_update(1, Role::Admin, 2, Role::Admin).is_ok());
        assert!(AuthorizationPolicy::can_update(1, Role::Moderator, 2, Role::Admin).is_err());
        assert!(AuthorizationPolicy::can_update(1, Role::User, 2, Role::Moderator).is_err());
    }

    proptest! {
        // Assignment succeeds exactly when the caller's rank dominates
        #[test]
        fn prop_assignment_matches_dominance(caller in 0usize..4, target in 0usize..4) {
            let caller = Role::ALL[caller];
            let target = Role::ALL[target];
            let allowed = AuthorizationPolicy::can_assign_role(caller, target).is_ok();
            prop_assert_eq!(allowed, caller.rank().dominates(target.rank()));
        }

        // Delete and assign share the same comparison
        #[test]
        fn prop_delete_matches_assign(caller in 0usize..4, target in 0usize..4) {
            let caller = Role::ALL[caller];
            let target = Role::ALL[target];
            prop_assert_eq!(
                AuthorizationPolicy::can_delete(caller, target).is_ok(),
                AuthorizationPolicy::can_assign_role(caller, target).is_ok()
            );
        }
    }
}
