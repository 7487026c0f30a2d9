//! User model for Flasky.
//!
//! The password is write-only: only its Argon2 hash is ever stored, and the
//! hash itself is not part of the public API.

use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row};

use super::role::Role;
use crate::auth::{hash_password, verify_password, PasswordError, Permission};

/// User entity representing a registered account.
#[derive(Debug, Clone)]
pub struct User {
    /// Unique user ID.
    pub id: i64,
    /// Login username (unique).
    pub username: String,
    /// Email address (unique).
    pub email: String,
    password_hash: String,
    /// Whether the email address has been confirmed.
    pub confirmed: bool,
    /// Assigned role, if any.
    pub role: Option<Role>,
    /// Account creation timestamp.
    pub created_at: String,
}

impl User {
    /// Replace the password. Only the derived hash is kept.
    pub fn set_password(&mut self, password: &str) -> Result<(), PasswordError> {
        self.password_hash = hash_password(password)?;
        Ok(())
    }

    /// Check a candidate password against the stored hash.
    pub fn verify_password(&self, password: &str) -> bool {
        verify_password(password, &self.password_hash).is_ok()
    }

    pub(crate) fn password_hash(&self) -> &str {
        &self.password_hash
    }

    /// Check a permission through the assigned role.
    ///
    /// A user without a role has no permissions.
    pub fn can(&self, perm: Permission) -> bool {
        self.role
            .as_ref()
            .is_some_and(|role| role.has_permission(perm))
    }

    /// Check for administrator access.
    pub fn is_administrator(&self) -> bool {
        self.can(Permission::ADMIN)
    }

    /// Name of the assigned role, if any.
    pub fn role_name(&self) -> Option<&str> {
        self.role.as_ref().map(|r| r.name.as_str())
    }

    #[cfg(test)]
    pub(crate) fn stub(id: i64, username: &str, role: Option<Role>, confirmed: bool) -> Self {
        Self {
            id,
            username: username.to_string(),
            email: format!("{username}@example.com"),
            password_hash: String::new(),
            confirmed,
            role,
            created_at: "2024-01-01 00:00:00".to_string(),
        }
    }
}

/// Rows come from `users LEFT JOIN roles`, with role columns prefixed `role_`.
impl<'r> FromRow<'r, SqliteRow> for User {
    fn from_row(row: &'r SqliteRow) -> sqlx::Result<Self> {
        let role_id: Option<i64> = row.try_get("role_id")?;
        let role = match role_id {
            Some(id) => Some(Role {
                id,
                name: row.try_get("role_name")?,
                is_default: row.try_get("role_is_default")?,
                permissions: Permission::from_bits(row.try_get("role_permissions")?),
            }),
            None => None,
        };

        Ok(Self {
            id: row.try_get("id")?,
            username: row.try_get("username")?,
            email: row.try_get("email")?,
            password_hash: row.try_get("password_hash")?,
            confirmed: row.try_get("confirmed")?,
            role,
            created_at: row.try_get("created_at")?,
        })
    }
}

/// Data for creating a new user.
#[derive(Debug, Clone)]
pub struct NewUser {
    /// Login username.
    pub username: String,
    /// Email address.
    pub email: String,
    password_hash: String,
    /// Role to assign.
    pub role_id: Option<i64>,
}

impl NewUser {
    /// Create a new user, hashing the password.
    pub fn new(
        username: impl Into<String>,
        email: impl Into<String>,
        password: &str,
    ) -> Result<Self, PasswordError> {
        Ok(Self {
            username: username.into(),
            email: email.into(),
            password_hash: hash_password(password)?,
            role_id: None,
        })
    }

    /// Assign a role.
    pub fn with_role(mut self, role: &Role) -> Self {
        self.role_id = Some(role.id);
        self
    }

    /// Check a candidate password against the hash.
    pub fn verify_password(&self, password: &str) -> bool {
        verify_password(password, &self.password_hash).is_ok()
    }

    pub(crate) fn password_hash(&self) -> &str {
        &self.password_hash
    }
}
