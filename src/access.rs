//! Permission resolution over a user's memberships

use crate::constants::ADMIN_GROUP;
use crate::model::{GroupId, Membership};
use crate::permission::Permission;

fn in_admin_group(m: &Membership) -> bool {
    m.group.name == ADMIN_GROUP
}

/// OR of every held role's mask that applies to `group_id`.
///
/// A role applies when it belongs to `group_id` or to the group named `admin`.
pub fn effective_mask(memberships: &[Membership], group_id: GroupId) -> Permission {
    memberships
        .iter()
        .filter(|m| m.role.group_id == group_id || in_admin_group(m))
        .fold(Permission::NONE, |acc, m| acc | m.role.permissions)
}

/// Check that the user holds every bit of `required` within `group_id`.
///
/// No memberships or no group id is never an error, just `false`.
pub fn can(memberships: &[Membership], group_id: Option<GroupId>, required: Permission) -> bool {
    let Some(gid) = group_id else { return false };
    if memberships.is_empty() {
        return false;
    }
    let mask = effective_mask(memberships, gid);
    tracing::debug!(group = gid, mask = mask.bits(), required = required.bits(), "resolved permissions");
    mask.contains(required)
}

/// Super administrator: the admin-group roles together carry [`Permission::ADMIN`].
pub fn can_admin(memberships: &[Membership]) -> bool {
    memberships
        .iter()
        .filter(|m| in_admin_group(m))
        .fold(Permission::NONE, |acc, m| acc | m.role.permissions)
        .contains(Permission::ADMIN)
}
