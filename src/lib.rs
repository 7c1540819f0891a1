//! rolemask - Role-based access control with bitmask permissions
//!
//! Users hold roles, roles belong to groups and carry a [`Permission`] mask.
//! [`can`] answers whether a user's roles within a group cover a set of
//! permissions. Roles in the group named `admin` count towards every group.
//!
//! ```no_run
//! use rolemask::{Config, NewGroup, NewRole, NewUser, Permission, Store};
//!
//! # fn main() -> rolemask::Result<()> {
//! let store = Store::open(&Config::new("./data/rbac"))?;
//! let (user, group) = store.transact(|tx| {
//!     let g = tx.create_group(NewGroup::new("newsroom"))?;
//!     let r = tx.create_role(NewRole::new("writer", g.id).permissions(Permission::LOGIN | Permission::EDITOR))?;
//!     let u = tx.create_user(NewUser::new("ann@example.com").password("s3cret"))?;
//!     tx.add_role(u.id, r.id)?;
//!     Ok((u.id, g.id))
//! })?;
//! assert!(store.can(user, Some(group), Permission::EDITOR)?);
//! # Ok(())
//! # }
//! ```

pub mod access;
pub mod auth;
pub mod config;
pub mod constants;
mod db;
pub mod error;
pub mod model;
pub mod permission;
mod read;
mod tx;

pub use access::{can, can_admin, effective_mask};
pub use auth::{PasswordHash, PasswordHasher, SaltedSha256};
pub use config::Config;
pub use db::Store;
pub use error::{RbacError, Result};
pub use model::{Group, GroupId, Membership, NewGroup, NewRole, NewUser, Role, RoleId, User, UserId};
pub use permission::Permission;
pub use tx::Tx;
