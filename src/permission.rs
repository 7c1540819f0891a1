//! Bitmask permissions
//!
//! Every permission is a bit in a 32-bit integer. Masks combine with `|` and are
//! checked with `&`. [`Permission::ADMIN`] covers all of the low byte, so it is a
//! superset of every other named permission.

use std::fmt;
use std::ops::{BitAnd, BitOr, BitOrAssign};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::RbacError;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Permission(u32);

impl Permission {
    pub const NONE: Self = Self(0);
    pub const LOGIN: Self = Self(0x01);
    pub const EDITOR: Self = Self(0x02);
    pub const OPERATOR: Self = Self(0x04);
    pub const ADMIN: Self = Self(0xff);

    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Checks if every bit of `other` is set in `self`.
    pub const fn contains(self, other: Self) -> bool {
        (self.0 & other.0) == other.0
    }

    /// Names of every named permission fully contained in this mask.
    pub fn names(self) -> Vec<&'static str> {
        PERMISSIONS
            .iter()
            .filter(|(p, _, _)| self.contains(*p) && !p.is_empty())
            .map(|(_, n, _)| *n)
            .collect()
    }

    /// Builds a mask from permission names, rejecting unknown ones.
    pub fn from_names<S: AsRef<str>>(names: &[S]) -> Result<Self, RbacError> {
        names
            .iter()
            .map(|n| n.as_ref().parse::<Permission>())
            .try_fold(Self::NONE, |acc, p| Ok(acc | p?))
    }

    pub fn description(self) -> Option<&'static str> {
        PERMISSIONS.iter().find(|(p, _, _)| *p == self).map(|(_, _, d)| *d)
    }
}

/// Named permissions: (mask, short name, description)
pub const PERMISSIONS: &[(Permission, &str, &str)] = &[
    (Permission::LOGIN, "login", "Login user"),
    (Permission::EDITOR, "editor", "Editor"),
    (Permission::OPERATOR, "op", "Operator"),
    (Permission::ADMIN, "admin", "Super administrator"),
];

impl BitOr for Permission {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for Permission {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for Permission {
    type Output = Self;
    fn bitand(self, rhs: Self) -> Self {
        Self(self.0 & rhs.0)
    }
}

impl From<u32> for Permission {
    fn from(bits: u32) -> Self {
        Self(bits)
    }
}

impl From<Permission> for u32 {
    fn from(p: Permission) -> Self {
        p.0
    }
}

impl FromStr for Permission {
    type Err = RbacError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PERMISSIONS
            .iter()
            .find(|(_, n, _)| *n == s)
            .map(|(p, _, _)| *p)
            .ok_or_else(|| RbacError::UnknownPermission(s.to_string()))
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#04x}", self.0)
    }
}
