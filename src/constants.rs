//! Storage layout and well-known names

/// Roles in a group with this exact name apply to every group.
pub const ADMIN_GROUP: &str = "admin";

// Defaults for the LMDB environment
pub const DEFAULT_DB_PATH: &str = "./data/rolemask.mdb";
pub const DEFAULT_MAP_SIZE: usize = 1 << 30;
pub const DEFAULT_MAX_DBS: u32 = 8;

// Table names
pub const USERS: &str = "users";
pub const ROLES: &str = "roles";
pub const GROUPS: &str = "groups";
pub const USER_ROLES: &str = "user_roles";
pub const ROLE_USERS: &str = "role_users";
pub const NAMES: &str = "names";
pub const META: &str = "meta";

/// Longest accepted name or email in bytes; LMDB keys stop at 511 bytes.
pub const MAX_NAME_LEN: usize = 255;

// Unique index prefixes in the names table
pub const EMAIL_PFX: &str = "email:";
pub const USERNAME_PFX: &str = "username:";
pub const GROUP_PFX: &str = "group:";
pub const ROLE_PFX: &str = "role:";

// Meta keys
pub const NEXT_ID: &str = "next_id";
