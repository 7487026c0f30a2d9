//! Role model and repository.
//!
//! A role is a named permission bitmask shared by many users.

use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, SqliteConnection};
use tracing::info;

use crate::auth::Permission;
use crate::{FlaskyError, Result};

/// Fixed role catalog: name, granted permissions, default flag.
pub const ROLE_CATALOG: &[(&str, Permission, bool)] = &[
    (
        "User",
        Permission::FOLLOW.union(Permission::COMMENT).union(Permission::WRITE),
        true,
    ),
    (
        "Moderator",
        Permission::FOLLOW
            .union(Permission::COMMENT)
            .union(Permission::WRITE)
            .union(Permission::MODERATE),
        false,
    ),
    ("Administrator", Permission::ALL, false),
];

/// Role entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Role {
    /// Role ID.
    pub id: i64,
    /// Unique role name.
    pub name: String,
    /// Whether new users get this role.
    pub is_default: bool,
    /// Granted permissions.
    pub permissions: Permission,
}

impl Role {
    /// Grant a permission. Granting twice has no further effect.
    pub fn add_permission(&mut self, perm: Permission) {
        self.permissions = self.permissions | perm;
    }

    /// Revoke a permission, leaving every other bit untouched.
    pub fn remove_permission(&mut self, perm: Permission) {
        self.permissions = self.permissions.difference(perm);
    }

    /// Revoke every permission.
    pub fn reset_permissions(&mut self) {
        self.permissions = Permission::NONE;
    }

    /// Check that every bit of `perm` is granted.
    pub fn has_permission(&self, perm: Permission) -> bool {
        self.permissions.contains(perm)
    }
}

impl<'r> FromRow<'r, SqliteRow> for Role {
    fn from_row(row: &'r SqliteRow) -> sqlx::Result<Self> {
        Ok(Self {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            is_default: row.try_get("is_default")?,
            permissions: Permission::from_bits(row.try_get("permissions")?),
        })
    }
}

/// Repository for role operations.
///
/// Works on any SQLite connection, so it can run inside a transaction.
pub struct RoleRepository<'c> {
    conn: &'c mut SqliteConnection,
}

impl<'c> RoleRepository<'c> {
    /// Create a repository over a connection or transaction.
    pub fn new(conn: &'c mut SqliteConnection) -> Self {
        Self { conn }
    }

    /// Get a role by ID.
    pub async fn get_by_id(&mut self, id: i64) -> Result<Option<Role>> {
        let role = sqlx::query_as::<_, Role>(
            "SELECT id, name, is_default, permissions FROM roles WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&mut *self.conn)
        .await?;
        Ok(role)
    }

    /// Get a role by name.
    pub async fn get_by_name(&mut self, name: &str) -> Result<Option<Role>> {
        let role = sqlx::query_as::<_, Role>(
            "SELECT id, name, is_default, permissions FROM roles WHERE name = ?",
        )
        .bind(name)
        .fetch_optional(&mut *self.conn)
        .await?;
        Ok(role)
    }

    /// Get the default role, if one is marked.
    pub async fn get_default(&mut self) -> Result<Option<Role>> {
        let role = sqlx::query_as::<_, Role>(
            "SELECT id, name, is_default, permissions FROM roles WHERE is_default = 1 LIMIT 1",
        )
        .fetch_optional(&mut *self.conn)
        .await?;
        Ok(role)
    }

    /// List all roles ordered by ID.
    pub async fn list(&mut self) -> Result<Vec<Role>> {
        let roles = sqlx::query_as::<_, Role>(
            "SELECT id, name, is_default, permissions FROM roles ORDER BY id",
        )
        .fetch_all(&mut *self.conn)
        .await?;
        Ok(roles)
    }

    /// Persist a role's permissions and default flag.
    pub async fn save(&mut self, role: &Role) -> Result<()> {
        let result = sqlx::query("UPDATE roles SET permissions = ?, is_default = ? WHERE id = ?")
            .bind(role.permissions.bits())
            .bind(role.is_default)
            .bind(role.id)
            .execute(&mut *self.conn)
            .await?;

        if result.rows_affected() == 0 {
            return Err(FlaskyError::NotFound("role".to_string()));
        }
        Ok(())
    }

    async fn insert(&mut self, name: &str) -> Result<Role> {
        let id = sqlx::query("INSERT INTO roles (name, is_default, permissions) VALUES (?, 0, 0)")
            .bind(name)
            .execute(&mut *self.conn)
            .await?
            .last_insert_rowid();

        self.get_by_id(id)
            .await?
            .ok_or_else(|| FlaskyError::NotFound("role".to_string()))
    }

    /// Seed the role catalog.
    ///
    /// Missing roles are created, existing ones are reset to their catalog
    /// permissions, and only the catalog default keeps the default flag.
    /// Running it again leaves the table unchanged. Callers wanting
    /// all-or-nothing seeding pass a transaction.
    pub async fn insert_roles(&mut self) -> Result<Vec<Role>> {
        let mut seeded = Vec::with_capacity(ROLE_CATALOG.len());

        for &(name, permissions, is_default) in ROLE_CATALOG {
            let mut role = match self.get_by_name(name).await? {
                Some(role) => role,
                None => self.insert(name).await?,
            };

            role.reset_permissions();
            role.add_permission(permissions);
            role.is_default = is_default;
            self.save(&role).await?;
            seeded.push(role);
        }

        let default_name = ROLE_CATALOG
            .iter()
            .find(|(_, _, is_default)| *is_default)
            .map(|(name, _, _)| *name)
            .unwrap_or("User");

        sqlx::query("UPDATE roles SET is_default = 0 WHERE name != ?")
            .bind(default_name)
            .execute(&mut *self.conn)
            .await?;

        info!(roles = seeded.len(), "Role catalog seeded");
        Ok(seeded)
    }
}
