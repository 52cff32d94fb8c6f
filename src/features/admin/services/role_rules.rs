use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::users::models::UserRole;

pub const SELF_ROLE_CHANGE: &str = "ไม่สามารถเปลี่ยนสิทธิ์ของตนเองได้";
pub const SELF_DELETE: &str = "ไม่สามารถลบบัญชีของตนเองได้";
pub const LAST_ADMIN: &str = "ต้องมีผู้ดูแลระบบอย่างน้อยหนึ่งคน";

#[derive(Debug, PartialEq, Eq)]
pub enum RoleChange {
    Unchanged,
    Apply,
}

/// Decide whether `actor` may move `target` from `current` to `requested`
pub fn plan_role_change(
    actor_id: Uuid,
    target_id: Uuid,
    current: UserRole,
    requested: UserRole,
    admin_count: i64,
) -> Result<RoleChange> {
    if actor_id == target_id {
        return Err(AppError::Forbidden(SELF_ROLE_CHANGE.to_string()));
    }
    if current == requested {
        return Ok(RoleChange::Unchanged);
    }
    ensure_admin_remains(current, admin_count)?;
    Ok(RoleChange::Apply)
}

/// Removing an admin from the admin set must leave at least one behind
pub fn ensure_admin_remains(current: UserRole, admin_count: i64) -> Result<()> {
    if current.is_admin() && admin_count <= 1 {
        return Err(AppError::Conflict(LAST_ADMIN.to_string()));
    }
    Ok(())
}

pub fn ensure_not_self(actor_id: Uuid, target_id: Uuid) -> Result<()> {
    if actor_id == target_id {
        return Err(AppError::Forbidden(SELF_DELETE.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cannot_change_own_role() {
        let me = Uuid::new_v4();
        let result = plan_role_change(me, me, UserRole::Admin, UserRole::Member, 5);
        assert!(matches!(result, Err(AppError::Forbidden(msg)) if msg == SELF_ROLE_CHANGE));
    }

    #[test]
    fn test_same_role_is_noop() {
        let result = plan_role_change(
            Uuid::new_v4(),
            Uuid::new_v4(),
            UserRole::Member,
            UserRole::Member,
            1,
        );
        assert_eq!(result.unwrap(), RoleChange::Unchanged);
    }

    #[test]
    fn test_last_admin_cannot_be_demoted() {
        let result = plan_role_change(
            Uuid::new_v4(),
            Uuid::new_v4(),
            UserRole::Admin,
            UserRole::Member,
            1,
        );
        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[test]
    fn test_promote_and_demote() {
        let (actor, target) = (Uuid::new_v4(), Uuid::new_v4());
        assert_eq!(
            plan_role_change(actor, target, UserRole::Member, UserRole::Admin, 1).unwrap(),
            RoleChange::Apply
        );
        assert_eq!(
            plan_role_change(actor, target, UserRole::Admin, UserRole::Member, 2).unwrap(),
            RoleChange::Apply
        );
    }

    #[test]
    fn test_deleting_last_admin_is_rejected() {
        assert!(matches!(
            ensure_admin_remains(UserRole::Admin, 1),
            Err(AppError::Conflict(msg)) if msg == LAST_ADMIN
        ));
        assert!(ensure_admin_remains(UserRole::Admin, 2).is_ok());
        assert!(ensure_admin_remains(UserRole::Member, 1).is_ok());
    }

    #[test]
    fn test_cannot_delete_self() {
        let me = Uuid::new_v4();
        assert!(matches!(
            ensure_not_self(me, me),
            Err(AppError::Forbidden(msg)) if msg == SELF_DELETE
        ));
        assert!(ensure_not_self(me, Uuid::new_v4()).is_ok());
    }
}
