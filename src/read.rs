//! Read operations (no permission checks, direct LMDB access)

use std::net::IpAddr;

use heed::RoTxn;

use crate::access;
use crate::constants::{EMAIL_PFX, GROUP_PFX, ROLE_PFX, USERNAME_PFX};
use crate::db::{Dbs, Store};
use crate::error::{RbacError, Result};
use crate::model::{Group, GroupId, Membership, Role, RoleId, User, UserId};
use crate::permission::Permission;

pub(crate) fn user(d: &Dbs, tx: &RoTxn, id: UserId) -> Result<Option<User>> {
    Ok(d.users.get(tx, &id)?)
}

pub(crate) fn role(d: &Dbs, tx: &RoTxn, id: RoleId) -> Result<Option<Role>> {
    Ok(d.roles.get(tx, &id)?)
}

pub(crate) fn group(d: &Dbs, tx: &RoTxn, id: GroupId) -> Result<Option<Group>> {
    Ok(d.groups.get(tx, &id)?)
}

pub(crate) fn by_name(d: &Dbs, tx: &RoTxn, pfx: &str, value: &str) -> Result<Option<u64>> {
    Ok(d.names.get(tx, &format!("{}{}", pfx, value))?)
}

pub(crate) fn roles_in_group(d: &Dbs, tx: &RoTxn, gid: GroupId) -> Result<Vec<Role>> {
    let mut r = Vec::new();
    for item in d.roles.iter(tx)? {
        let (_, role) = item?;
        if role.group_id == gid {
            r.push(role);
        }
    }
    Ok(r)
}

fn roles_of(d: &Dbs, tx: &RoTxn, uid: UserId) -> Result<Vec<Role>> {
    d.user_roles
        .list_fwd(tx, uid)?
        .into_iter()
        .map(|(rid, _)| role(d, tx, rid)?.ok_or_else(|| RbacError::Corrupted(format!("user {} holds missing role {}", uid, rid))))
        .collect()
}

fn memberships_of(d: &Dbs, tx: &RoTxn, uid: UserId) -> Result<Vec<Membership>> {
    roles_of(d, tx, uid)?
        .into_iter()
        .map(|role| {
            let g = group(d, tx, role.group_id)?
                .ok_or_else(|| RbacError::Corrupted(format!("role {} in missing group {}", role.id, role.group_id)))?;
            Ok(Membership { role, group: g })
        })
        .collect()
}

impl Store {
    pub fn get_user(&self, id: UserId) -> Result<Option<User>> {
        self.read(|d, tx| user(d, tx, id))
    }

    pub fn get_role(&self, id: RoleId) -> Result<Option<Role>> {
        self.read(|d, tx| role(d, tx, id))
    }

    pub fn get_group(&self, id: GroupId) -> Result<Option<Group>> {
        self.read(|d, tx| group(d, tx, id))
    }

    pub fn user_by_email(&self, email: &str) -> Result<Option<User>> {
        self.read(|d, tx| match by_name(d, tx, EMAIL_PFX, email)? {
            Some(id) => user(d, tx, id),
            None => Ok(None),
        })
    }

    pub fn user_by_username(&self, username: &str) -> Result<Option<User>> {
        self.read(|d, tx| match by_name(d, tx, USERNAME_PFX, username)? {
            Some(id) => user(d, tx, id),
            None => Ok(None),
        })
    }

    pub fn group_by_name(&self, name: &str) -> Result<Option<Group>> {
        self.read(|d, tx| match by_name(d, tx, GROUP_PFX, name)? {
            Some(id) => group(d, tx, id),
            None => Ok(None),
        })
    }

    pub fn role_by_name(&self, name: &str) -> Result<Option<Role>> {
        self.read(|d, tx| match by_name(d, tx, ROLE_PFX, name)? {
            Some(id) => role(d, tx, id),
            None => Ok(None),
        })
    }

    pub fn list_groups(&self) -> Result<Vec<Group>> {
        self.read(|d, tx| {
            let mut r = Vec::new();
            for item in d.groups.iter(tx)? {
                r.push(item?.1);
            }
            Ok(r)
        })
    }

    pub fn roles_for_group(&self, gid: GroupId) -> Result<Vec<Role>> {
        self.read(|d, tx| roles_in_group(d, tx, gid))
    }

    pub fn roles_for_user(&self, uid: UserId) -> Result<Vec<Role>> {
        self.read(|d, tx| roles_of(d, tx, uid))
    }

    pub fn users_for_role(&self, rid: RoleId) -> Result<Vec<User>> {
        self.read(|d, tx| {
            let mut r = Vec::new();
            for (uid, _) in d.user_roles.list_rev(tx, rid)? {
                r.push(user(d, tx, uid)?.ok_or_else(|| RbacError::Corrupted(format!("role {} held by missing user {}", rid, uid)))?);
            }
            Ok(r)
        })
    }

    pub fn memberships(&self, uid: UserId) -> Result<Vec<Membership>> {
        self.read(|d, tx| memberships_of(d, tx, uid))
    }

    /// See [`access::can`]. An unknown user holds no roles.
    pub fn can(&self, uid: UserId, group_id: Option<GroupId>, required: Permission) -> Result<bool> {
        Ok(access::can(&self.memberships(uid)?, group_id, required))
    }

    pub fn can_admin(&self, uid: UserId) -> Result<bool> {
        Ok(access::can_admin(&self.memberships(uid)?))
    }

    /// False for unknown users and users without a password.
    pub fn verify_password(&self, uid: UserId, candidate: &str) -> Result<bool> {
        Ok(self.get_user(uid)?.map(|u| u.verify_password(candidate)).unwrap_or(false))
    }

    /// See [`Tx::authenticate`]. Lookup, checks and the login record share one
    /// write transaction.
    ///
    /// [`Tx::authenticate`]: crate::Tx::authenticate
    pub fn authenticate(&self, login: &str, password: &str, ip: Option<IpAddr>) -> Result<Option<User>> {
        self.transact(|tx| tx.authenticate(login, password, ip))
    }
}
