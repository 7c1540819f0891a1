//! Transaction wrapper for batched writes

use std::net::IpAddr;

use heed::RwTxn;

use crate::auth::{PasswordHasher, SaltedSha256};
use crate::constants::{EMAIL_PFX, GROUP_PFX, MAX_NAME_LEN, NEXT_ID, ROLE_PFX, USERNAME_PFX};
use crate::db::Dbs;
use crate::error::{RbacError, Result};
use crate::model::{now_millis, Group, GroupId, NewGroup, NewRole, NewUser, Role, RoleId, User, UserId};
use crate::permission::Permission;
use crate::read;

fn valid_name(what: &str, s: &str) -> Result<()> {
    if s.trim().is_empty() {
        return Err(RbacError::InvalidInput(format!("{} must not be empty", what)));
    }
    if s.len() > MAX_NAME_LEN {
        return Err(RbacError::InvalidInput(format!("{} longer than {} bytes", what, MAX_NAME_LEN)));
    }
    Ok(())
}

/// Write operations inside one LMDB write transaction, see [`Store::transact`].
///
/// [`Store::transact`]: crate::Store::transact
pub struct Tx<'a> {
    txn: RwTxn<'a>,
    dbs: &'a Dbs,
}

impl<'a> Tx<'a> {
    pub(crate) fn new(txn: RwTxn<'a>, dbs: &'a Dbs) -> Self {
        Tx { txn, dbs }
    }

    pub(crate) fn commit(self) -> Result<()> {
        Ok(self.txn.commit()?)
    }

    fn next_id(&mut self) -> Result<u64> {
        let id = self.dbs.meta.get(&self.txn, NEXT_ID)?.unwrap_or(1);
        self.dbs.meta.put(&mut self.txn, NEXT_ID, &(id + 1))?;
        Ok(id)
    }

    /// Fails if the unique key is held by anything other than `id`. Writes nothing.
    fn ensure_free(&self, kind: &'static str, pfx: &str, value: &str, id: Option<u64>) -> Result<()> {
        match read::by_name(self.dbs, &self.txn, pfx, value)? {
            Some(owner) if Some(owner) != id => Err(RbacError::duplicate(kind, value)),
            _ => Ok(()),
        }
    }

    /// Reserve a unique key for `id`. Callers check every key with
    /// `ensure_free` before the first write.
    fn claim(&mut self, pfx: &str, value: &str, id: u64) -> Result<()> {
        Ok(self.dbs.names.put(&mut self.txn, &format!("{}{}", pfx, value), &id)?)
    }

    fn release(&mut self, pfx: &str, value: &str) -> Result<()> {
        self.dbs.names.delete(&mut self.txn, &format!("{}{}", pfx, value))?;
        Ok(())
    }

    fn user(&self, id: UserId) -> Result<User> {
        read::user(self.dbs, &self.txn, id)?.ok_or_else(|| RbacError::not_found("user", id))
    }

    fn role(&self, id: RoleId) -> Result<Role> {
        read::role(self.dbs, &self.txn, id)?.ok_or_else(|| RbacError::not_found("role", id))
    }

    fn group(&self, id: GroupId) -> Result<Group> {
        read::group(self.dbs, &self.txn, id)?.ok_or_else(|| RbacError::not_found("group", id))
    }

    fn put_user(&mut self, u: &User) -> Result<()> {
        Ok(self.dbs.users.put(&mut self.txn, &u.id, u)?)
    }

    // Groups

    pub fn create_group(&mut self, new: NewGroup) -> Result<Group> {
        valid_name("group name", &new.name)?;
        self.ensure_free("group", GROUP_PFX, &new.name, None)?;
        let id = self.next_id()?;
        self.claim(GROUP_PFX, &new.name, id)?;
        let g = Group { id, name: new.name, description: new.description };
        self.dbs.groups.put(&mut self.txn, &id, &g)?;
        tracing::debug!(id, name = %g.name, "created group");
        Ok(g)
    }

    pub fn update_group(&mut self, id: GroupId, name: &str, description: Option<String>) -> Result<Group> {
        valid_name("group name", name)?;
        let mut g = self.group(id)?;
        if g.name != name {
            self.ensure_free("group", GROUP_PFX, name, Some(id))?;
            self.claim(GROUP_PFX, name, id)?;
            self.release(GROUP_PFX, &g.name)?;
            g.name = name.to_string();
        }
        g.description = description;
        self.dbs.groups.put(&mut self.txn, &id, &g)?;
        Ok(g)
    }

    /// Fails with [`RbacError::Integrity`] while any role belongs to the group.
    pub fn delete_group(&mut self, id: GroupId) -> Result<bool> {
        let Some(g) = read::group(self.dbs, &self.txn, id)? else { return Ok(false) };
        if !read::roles_in_group(self.dbs, &self.txn, id)?.is_empty() {
            return Err(RbacError::Integrity(format!("group `{}` still has roles", g.name)));
        }
        self.release(GROUP_PFX, &g.name)?;
        Ok(self.dbs.groups.delete(&mut self.txn, &id)?)
    }

    // Roles

    pub fn create_role(&mut self, new: NewRole) -> Result<Role> {
        valid_name("role name", &new.name)?;
        self.group(new.group_id)?;
        self.ensure_free("role", ROLE_PFX, &new.name, None)?;
        let id = self.next_id()?;
        self.claim(ROLE_PFX, &new.name, id)?;
        let r = Role {
            id,
            name: new.name,
            permissions: new.permissions,
            description: new.description,
            group_id: new.group_id,
        };
        self.dbs.roles.put(&mut self.txn, &id, &r)?;
        tracing::debug!(id, name = %r.name, group = r.group_id, mask = r.permissions.bits(), "created role");
        Ok(r)
    }

    pub fn set_role_permissions(&mut self, id: RoleId, permissions: Permission) -> Result<Role> {
        let mut r = self.role(id)?;
        r.permissions = permissions;
        self.dbs.roles.put(&mut self.txn, &id, &r)?;
        Ok(r)
    }

    /// Delete a role and every user's hold on it.
    pub fn delete_role(&mut self, id: RoleId) -> Result<bool> {
        let Some(r) = read::role(self.dbs, &self.txn, id)? else { return Ok(false) };
        for (user, _) in self.dbs.user_roles.list_rev(&self.txn, id)? {
            self.dbs.user_roles.del(&mut self.txn, user, id)?;
        }
        self.release(ROLE_PFX, &r.name)?;
        Ok(self.dbs.roles.delete(&mut self.txn, &id)?)
    }

    // Users

    pub fn create_user(&mut self, new: NewUser) -> Result<User> {
        valid_name("email", &new.email)?;
        if let Some(u) = &new.username {
            valid_name("username", u)?;
        }
        self.ensure_free("email", EMAIL_PFX, &new.email, None)?;
        if let Some(u) = &new.username {
            self.ensure_free("username", USERNAME_PFX, u, None)?;
        }
        let hash = new.password.as_deref().map(|p| SaltedSha256.hash(p)).transpose()?;

        let id = self.next_id()?;
        self.claim(EMAIL_PFX, &new.email, id)?;
        if let Some(u) = &new.username {
            self.claim(USERNAME_PFX, u, id)?;
        }
        let u = User::new(id, &new, hash);
        self.put_user(&u)?;
        tracing::debug!(id, email = %u.email, "created user");
        Ok(u)
    }

    pub fn set_user_password(&mut self, id: UserId, plaintext: &str) -> Result<()> {
        let mut u = self.user(id)?;
        u.set_password(plaintext)?;
        self.put_user(&u)
    }

    pub fn set_user_active(&mut self, id: UserId, active: bool) -> Result<()> {
        let mut u = self.user(id)?;
        u.active = active;
        self.put_user(&u)
    }

    pub fn delete_user(&mut self, id: UserId) -> Result<bool> {
        let Some(u) = read::user(self.dbs, &self.txn, id)? else { return Ok(false) };
        for (role, _) in self.dbs.user_roles.list_fwd(&self.txn, id)? {
            self.dbs.user_roles.del(&mut self.txn, id, role)?;
        }
        self.release(EMAIL_PFX, &u.email)?;
        if let Some(name) = &u.username {
            self.release(USERNAME_PFX, name)?;
        }
        Ok(self.dbs.users.delete(&mut self.txn, &id)?)
    }

    /// Give a user a role. Adding a held role again keeps the first grant time.
    pub fn add_role(&mut self, user: UserId, role: RoleId) -> Result<()> {
        self.user(user)?;
        self.role(role)?;
        if self.dbs.user_roles.get(&self.txn, user, role)?.is_none() {
            self.dbs.user_roles.put(&mut self.txn, user, role, now_millis())?;
            tracing::debug!(user, role, "added role");
        }
        Ok(())
    }

    pub fn remove_role(&mut self, user: UserId, role: RoleId) -> Result<bool> {
        self.dbs.user_roles.del(&mut self.txn, user, role)
    }

    pub fn record_login(&mut self, id: UserId, ip: Option<IpAddr>, now: u64) -> Result<User> {
        let mut u = self.user(id)?;
        u.record_login(ip, now);
        self.put_user(&u)?;
        Ok(u)
    }

    /// Look up `login` as an email, then as a username, verify the password and
    /// record the login, all against this transaction's view of the user.
    /// Inactive users and bad credentials yield `None` and write nothing.
    pub fn authenticate(&mut self, login: &str, password: &str, ip: Option<IpAddr>) -> Result<Option<User>> {
        if login.len() > MAX_NAME_LEN {
            tracing::warn!("authentication failed: login too long");
            return Ok(None);
        }
        let found = match read::by_name(self.dbs, &self.txn, EMAIL_PFX, login)? {
            Some(id) => Some(id),
            None => read::by_name(self.dbs, &self.txn, USERNAME_PFX, login)?,
        };
        let Some(u) = found.map(|id| read::user(self.dbs, &self.txn, id)).transpose()?.flatten() else {
            tracing::warn!(login, "authentication failed: unknown user");
            return Ok(None);
        };
        if !u.active {
            tracing::warn!(user = u.id, "authentication failed: inactive");
            return Ok(None);
        }
        if !u.verify_password(password) {
            tracing::warn!(user = u.id, "authentication failed: bad password");
            return Ok(None);
        }
        self.record_login(u.id, ip, now_millis()).map(Some)
    }
}
