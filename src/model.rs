//! Users, roles and groups

use std::convert::Infallible;
use std::net::IpAddr;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::auth::{PasswordHash, PasswordHasher, SaltedSha256};
use crate::error::{RbacError, Result};
use crate::permission::Permission;

pub type UserId = u64;
pub type RoleId = u64;
pub type GroupId = u64;

/// Milliseconds since the Unix epoch
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// A named collection of roles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub id: GroupId,
    pub name: String,
    pub description: Option<String>,
}

/// A named permission mask belonging to exactly one group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub id: RoleId,
    pub name: String,
    pub permissions: Permission,
    pub description: Option<String>,
    pub group_id: GroupId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub username: Option<String>,
    pub phone: Option<String>,
    pub active: bool,
    pub confirmed_at: u64,
    password_hash: Option<PasswordHash>,
    pub last_login_at: Option<u64>,
    pub current_login_at: Option<u64>,
    pub last_login_ip: Option<IpAddr>,
    pub current_login_ip: Option<IpAddr>,
    pub login_count: u64,
}

impl User {
    pub(crate) fn new(id: UserId, new: &NewUser, password_hash: Option<PasswordHash>) -> Self {
        User {
            id,
            email: new.email.clone(),
            username: new.username.clone(),
            phone: new.phone.clone(),
            active: new.active,
            confirmed_at: now_millis(),
            password_hash,
            last_login_at: None,
            current_login_at: None,
            last_login_ip: None,
            current_login_ip: None,
            login_count: 0,
        }
    }

    /// The password is write-only; reading it is always an error.
    pub fn password(&self) -> Result<Infallible> {
        Err(RbacError::PasswordNotReadable)
    }

    pub fn set_password(&mut self, plaintext: &str) -> Result<()> {
        self.set_password_with(&SaltedSha256, plaintext)
    }

    pub fn set_password_with<H: PasswordHasher>(&mut self, hasher: &H, plaintext: &str) -> Result<()> {
        self.password_hash = Some(hasher.hash(plaintext)?);
        Ok(())
    }

    pub fn verify_password(&self, candidate: &str) -> bool {
        self.verify_password_with(&SaltedSha256, candidate)
    }

    pub fn verify_password_with<H: PasswordHasher>(&self, hasher: &H, candidate: &str) -> bool {
        self.password_hash
            .as_ref()
            .map(|h| hasher.verify(h, candidate))
            .unwrap_or(false)
    }

    pub fn has_password(&self) -> bool {
        self.password_hash.is_some()
    }

    /// Shift current login metadata to `last_*` and record a new login.
    pub fn record_login(&mut self, ip: Option<IpAddr>, now: u64) {
        self.last_login_at = self.current_login_at.or(Some(now));
        self.current_login_at = Some(now);
        self.last_login_ip = self.current_login_ip.or(ip);
        self.current_login_ip = ip;
        self.login_count += 1;
    }
}

/// A role held by a user, with the group the role belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Membership {
    pub role: Role,
    pub group: Group,
}

#[derive(Debug, Clone)]
pub struct NewGroup {
    pub name: String,
    pub description: Option<String>,
}

impl NewGroup {
    pub fn new(name: impl Into<String>) -> Self {
        NewGroup { name: name.into(), description: None }
    }

    pub fn description(mut self, d: impl Into<String>) -> Self {
        self.description = Some(d.into());
        self
    }
}

#[derive(Debug, Clone)]
pub struct NewRole {
    pub name: String,
    pub group_id: GroupId,
    pub permissions: Permission,
    pub description: Option<String>,
}

impl NewRole {
    /// New roles default to [`Permission::LOGIN`].
    pub fn new(name: impl Into<String>, group_id: GroupId) -> Self {
        NewRole { name: name.into(), group_id, permissions: Permission::LOGIN, description: None }
    }

    pub fn permissions(mut self, p: Permission) -> Self {
        self.permissions = p;
        self
    }

    pub fn description(mut self, d: impl Into<String>) -> Self {
        self.description = Some(d.into());
        self
    }
}

#[derive(Clone)]
pub struct NewUser {
    pub email: String,
    pub username: Option<String>,
    pub phone: Option<String>,
    pub password: Option<String>,
    pub active: bool,
}

impl NewUser {
    pub fn new(email: impl Into<String>) -> Self {
        NewUser { email: email.into(), username: None, phone: None, password: None, active: true }
    }

    pub fn username(mut self, u: impl Into<String>) -> Self {
        self.username = Some(u.into());
        self
    }

    pub fn phone(mut self, p: impl Into<String>) -> Self {
        self.phone = Some(p.into());
        self
    }

    pub fn password(mut self, p: impl Into<String>) -> Self {
        self.password = Some(p.into());
        self
    }

    pub fn active(mut self, a: bool) -> Self {
        self.active = a;
        self
    }
}

impl std::fmt::Debug for NewUser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NewUser")
            .field("email", &self.email)
            .field("username", &self.username)
            .field("phone", &self.phone)
            .field("active", &self.active)
            .finish_non_exhaustive()
    }
}
