//! User registration for Flasky.

use thiserror::Error;
use tracing::info;

use crate::auth::validation::{validate_registration, ValidationError};
use crate::auth::PasswordError;
use crate::db::{NewUser, RoleRepository, User, UserRepository};
use crate::{Database, FlaskyError};

/// Registration-specific errors.
#[derive(Error, Debug)]
pub enum RegistrationError {
    /// Validation failed.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Email address already registered.
    #[error("Email already registered.")]
    EmailExists,

    /// Username already exists.
    #[error("Username already in use.")]
    UsernameExists,

    /// Password hashing failed.
    #[error("password error: {0}")]
    Password(#[from] PasswordError),

    /// Database error.
    #[error("database error: {0}")]
    Database(String),
}

impl From<FlaskyError> for RegistrationError {
    fn from(e: FlaskyError) -> Self {
        RegistrationError::Database(e.to_string())
    }
}

/// Registration request data.
#[derive(Debug, Clone)]
pub struct RegistrationRequest {
    /// Email address; stored lowercased.
    pub email: String,
    /// Desired username.
    pub username: String,
    /// Password.
    pub password: String,
}

impl RegistrationRequest {
    /// Create a new registration request.
    pub fn new(
        email: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            email: email.into().trim().to_lowercase(),
            username: username.into(),
            password: password.into(),
        }
    }
}

/// Register a new user.
///
/// This function:
/// 1. Validates all input fields
/// 2. Checks that neither the email nor the username is taken
/// 3. Picks the Administrator role for the admin address, else the default role
/// 4. Creates the unconfirmed user
///
/// Steps 2-4 share one transaction.
pub async fn register(
    db: &Database,
    admin_email: Option<&str>,
    request: RegistrationRequest,
) -> Result<User, RegistrationError> {
    validate_registration(&request.email, &request.username, &request.password)?;

    let mut new_user = NewUser::new(&request.username, &request.email, &request.password)?;

    let mut tx = db.begin().await?;

    {
        let mut users = UserRepository::new(&mut tx);
        if users.email_exists(&request.email).await? {
            return Err(RegistrationError::EmailExists);
        }
        if users.username_exists(&request.username).await? {
            return Err(RegistrationError::UsernameExists);
        }
    }

    let is_admin = admin_email.is_some_and(|admin| admin.eq_ignore_ascii_case(&request.email));
    let role = {
        let mut roles = RoleRepository::new(&mut tx);
        if is_admin {
            roles.get_by_name("Administrator").await?
        } else {
            roles.get_default().await?
        }
    };
    if let Some(ref role) = role {
        new_user = new_user.with_role(role);
    }

    let user = UserRepository::new(&mut tx).create(&new_user).await?;
    tx.commit().await.map_err(FlaskyError::from)?;

    info!(
        username = %user.username,
        user_id = user.id,
        role = user.role_name().unwrap_or("-"),
        "New user registered"
    );

    Ok(user)
}
