//! Permission bitmask and authorization checks.
//!
//! Each capability is one bit. A role grants the union of its bits, and
//! a check passes when every requested bit is granted.

use std::fmt;
use std::ops::BitOr;

use thiserror::Error;

use crate::db::User;

/// A set of permission bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Permission(i64);

impl Permission {
    /// No permissions.
    pub const NONE: Permission = Permission(0);
    /// Follow other users.
    pub const FOLLOW: Permission = Permission(1);
    /// Comment on posts.
    pub const COMMENT: Permission = Permission(2);
    /// Write articles.
    pub const WRITE: Permission = Permission(4);
    /// Moderate comments by others.
    pub const MODERATE: Permission = Permission(8);
    /// Administration access.
    pub const ADMIN: Permission = Permission(16);
    /// Every known permission.
    pub const ALL: Permission = Permission(31);

    const NAMED: [(&'static str, Permission); 5] = [
        ("follow", Permission::FOLLOW),
        ("comment", Permission::COMMENT),
        ("write", Permission::WRITE),
        ("moderate", Permission::MODERATE),
        ("admin", Permission::ADMIN),
    ];

    /// Build from stored bits; unknown bits are dropped.
    pub const fn from_bits(bits: i64) -> Self {
        Permission(bits & Self::ALL.0)
    }

    /// Raw bit value.
    pub const fn bits(self) -> i64 {
        self.0
    }

    /// Union of two sets.
    pub const fn union(self, other: Permission) -> Self {
        Permission(self.0 | other.0)
    }

    /// Bits of `self` that are not in `other`.
    pub const fn difference(self, other: Permission) -> Self {
        Permission(self.0 & !other.0)
    }

    /// `(self & other) == other`
    pub const fn contains(self, other: Permission) -> bool {
        self.0 & other.0 == other.0
    }

    /// Check if no bit is set.
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Look up a single permission by name (case-insensitive).
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.to_lowercase();
        Self::NAMED
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, p)| *p)
    }

    /// Names of the granted permissions, lowest bit first.
    pub fn names(self) -> Vec<&'static str> {
        Self::NAMED
            .iter()
            .filter(|(_, p)| self.contains(*p))
            .map(|(n, _)| *n)
            .collect()
    }
}

impl BitOr for Permission {
    type Output = Permission;

    fn bitor(self, rhs: Permission) -> Permission {
        self.union(rhs)
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "none");
        }
        write!(f, "{}", self.names().join("|"))
    }
}

/// The acting identity for an authorization check.
#[derive(Debug, Clone)]
pub enum Principal {
    /// A logged-in user.
    Authenticated(User),
    /// Nobody is logged in.
    Anonymous,
}

impl Principal {
    /// Check a permission. Anonymous principals hold none.
    pub fn can(&self, perm: Permission) -> bool {
        match self {
            Principal::Authenticated(user) => user.can(perm),
            Principal::Anonymous => false,
        }
    }

    /// Check for administrator access.
    pub fn is_administrator(&self) -> bool {
        self.can(Permission::ADMIN)
    }

    /// The logged-in user, if any.
    pub fn user(&self) -> Option<&User> {
        match self {
            Principal::Authenticated(user) => Some(user),
            Principal::Anonymous => None,
        }
    }

    /// Check if a user is logged in.
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Principal::Authenticated(_))
    }
}

/// Authorization failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PermissionError {
    /// Nobody is logged in.
    #[error("login required")]
    NotAuthenticated,

    /// The account has not confirmed its email address.
    #[error("account not confirmed")]
    Unconfirmed,

    /// The principal lacks the requested permission.
    #[error("insufficient permission: {0} required")]
    Insufficient(Permission),
}

/// Require a confirmed, logged-in user.
pub fn require_confirmed(principal: &Principal) -> Result<&User, PermissionError> {
    let user = principal.user().ok_or(PermissionError::NotAuthenticated)?;
    if !user.confirmed {
        return Err(PermissionError::Unconfirmed);
    }
    Ok(user)
}

/// Require a confirmed user holding every bit of `perm`.
///
/// # Examples
///
/// ```
/// use flasky::auth::{check_permission, Permission, PermissionError, Principal};
///
/// assert_eq!(
///     check_permission(&Principal::Anonymous, Permission::FOLLOW).unwrap_err(),
///     PermissionError::NotAuthenticated
/// );
/// ```
pub fn check_permission(principal: &Principal, perm: Permission) -> Result<&User, PermissionError> {
    let user = require_confirmed(principal)?;
    if !user.can(perm) {
        return Err(PermissionError::Insufficient(perm));
    }
    Ok(user)
}
