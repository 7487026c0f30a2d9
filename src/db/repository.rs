//! User repository for Flasky.

use sqlx::SqliteConnection;

use super::user::{NewUser, User};
use crate::{FlaskyError, Result};

const USER_SELECT: &str = "SELECT u.id, u.username, u.email, u.password_hash, u.confirmed,
            u.role_id, u.created_at,
            r.name AS role_name, r.is_default AS role_is_default,
            r.permissions AS role_permissions
     FROM users u LEFT JOIN roles r ON r.id = u.role_id";

/// Repository for user CRUD operations.
///
/// Works on any SQLite connection, so it can run inside a transaction.
pub struct UserRepository<'c> {
    conn: &'c mut SqliteConnection,
}

impl<'c> UserRepository<'c> {
    /// Create a repository over a connection or transaction.
    pub fn new(conn: &'c mut SqliteConnection) -> Self {
        Self { conn }
    }

    /// Insert a new user and return it with its role loaded.
    pub async fn create(&mut self, new_user: &NewUser) -> Result<User> {
        let id = sqlx::query(
            "INSERT INTO users (username, email, password_hash, role_id) VALUES (?, ?, ?, ?)",
        )
        .bind(&new_user.username)
        .bind(&new_user.email)
        .bind(new_user.password_hash())
        .bind(new_user.role_id)
        .execute(&mut *self.conn)
        .await?
        .last_insert_rowid();

        self.get_by_id(id)
            .await?
            .ok_or_else(|| FlaskyError::NotFound("user".to_string()))
    }

    /// Get a user by ID.
    pub async fn get_by_id(&mut self, id: i64) -> Result<Option<User>> {
        let sql = format!("{USER_SELECT} WHERE u.id = ?");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&mut *self.conn)
            .await?;
        Ok(user)
    }

    /// Get a user by email (case-insensitive).
    pub async fn get_by_email(&mut self, email: &str) -> Result<Option<User>> {
        let sql = format!("{USER_SELECT} WHERE u.email = ? COLLATE NOCASE");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(email)
            .fetch_optional(&mut *self.conn)
            .await?;
        Ok(user)
    }

    /// Get a user by username.
    pub async fn get_by_username(&mut self, username: &str) -> Result<Option<User>> {
        let sql = format!("{USER_SELECT} WHERE u.username = ?");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(username)
            .fetch_optional(&mut *self.conn)
            .await?;
        Ok(user)
    }

    /// Check if an email is registered (case-insensitive).
    pub async fn email_exists(&mut self, email: &str) -> Result<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE email = ? COLLATE NOCASE)")
                .bind(email)
                .fetch_one(&mut *self.conn)
                .await?;
        Ok(exists)
    }

    /// Check if a username is taken.
    pub async fn username_exists(&mut self, username: &str) -> Result<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE username = ?)")
                .bind(username)
                .fetch_one(&mut *self.conn)
                .await?;
        Ok(exists)
    }

    /// Mark a user as confirmed. Confirmation is never undone.
    pub async fn mark_confirmed(&mut self, id: i64) -> Result<()> {
        self.update_one("UPDATE users SET confirmed = 1 WHERE id = ?", id, None)
            .await
    }

    /// Persist the user's current password hash.
    pub async fn save_password(&mut self, user: &User) -> Result<()> {
        self.update_one(
            "UPDATE users SET password_hash = ? WHERE id = ?",
            user.id,
            Some(user.password_hash()),
        )
        .await
    }

    /// Change a user's email address.
    pub async fn update_email(&mut self, id: i64, email: &str) -> Result<()> {
        self.update_one("UPDATE users SET email = ? WHERE id = ?", id, Some(email))
            .await
    }

    /// Assign a role to a user.
    pub async fn update_role(&mut self, id: i64, role_id: Option<i64>) -> Result<()> {
        let result = sqlx::query("UPDATE users SET role_id = ? WHERE id = ?")
            .bind(role_id)
            .bind(id)
            .execute(&mut *self.conn)
            .await?;

        if result.rows_affected() == 0 {
            return Err(FlaskyError::NotFound("user".to_string()));
        }
        Ok(())
    }

    /// Count registered users.
    pub async fn count(&mut self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&mut *self.conn)
            .await?;
        Ok(count)
    }

    async fn update_one(&mut self, sql: &str, id: i64, value: Option<&str>) -> Result<()> {
        let mut query = sqlx::query(sql);
        if let Some(value) = value {
            query = query.bind(value);
        }
        let result = query.bind(id).execute(&mut *self.conn).await?;

        if result.rows_affected() == 0 {
            return Err(FlaskyError::NotFound("user".to_string()));
        }
        Ok(())
    }
}
