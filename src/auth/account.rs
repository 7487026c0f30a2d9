//! Account workflows built on signed tokens.
//!
//! Login, email confirmation, password reset and change, email change,
//! and the administrative role operations. Every mutation runs in its own
//! transaction and commits only after all checks pass.

use thiserror::Error;
use tracing::{debug, info};

use super::token::{TokenCodec, TokenError, TokenPurpose};
use super::validation::{validate_email, validate_password, ValidationError};
use super::{PasswordError, Permission};
use crate::db::{Role, RoleRepository, User, UserRepository};
use crate::{Database, FlaskyError};

/// Account workflow errors.
#[derive(Error, Debug)]
pub enum AccountError {
    /// Unknown email or wrong password at login.
    #[error("Invalid email or password.")]
    InvalidCredentials,

    /// The current password did not match.
    #[error("Invalid password.")]
    WrongPassword,

    /// The token could not be redeemed.
    #[error("invalid token: {0}")]
    InvalidToken(#[from] TokenError),

    /// The token belongs to another account.
    #[error("token was issued for another account")]
    WrongAccount,

    /// The token's subject no longer exists.
    #[error("token subject does not exist")]
    UnknownSubject,

    /// No user with the given ID.
    #[error("unknown account")]
    UnknownAccount,

    /// No role with the given name.
    #[error("unknown role: {0}")]
    UnknownRole(String),

    /// An email-change token without the new address.
    #[error("token carries no email address")]
    MissingPayload,

    /// The new email address belongs to another account.
    #[error("Email already registered.")]
    EmailTaken,

    /// Password hashing failed.
    #[error("password error: {0}")]
    Password(#[from] PasswordError),

    /// Input validation failed.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Database error.
    #[error("database error: {0}")]
    Database(String),
}

impl From<FlaskyError> for AccountError {
    fn from(e: FlaskyError) -> Self {
        AccountError::Database(e.to_string())
    }
}

impl From<sqlx::Error> for AccountError {
    fn from(e: sqlx::Error) -> Self {
        AccountError::Database(e.to_string())
    }
}

type Result<T> = std::result::Result<T, AccountError>;

/// Check login credentials.
///
/// Unknown address and wrong password fail the same way.
pub async fn authenticate(db: &Database, email: &str, password: &str) -> Result<User> {
    let mut conn = db.acquire().await?;
    let user = UserRepository::new(&mut conn)
        .get_by_email(email.trim())
        .await?
        .filter(|u| u.verify_password(password))
        .ok_or(AccountError::InvalidCredentials)?;
    Ok(user)
}

/// Issue a confirmation token for a user.
pub fn confirmation_token(codec: &TokenCodec, user: &User) -> Result<String> {
    Ok(codec.issue(TokenPurpose::Confirm, user.id, None, None)?)
}

/// Confirm the user's email address with a token.
///
/// An already confirmed user is returned unchanged without looking at the
/// token. Otherwise the token must be a confirm token issued for this user.
pub async fn confirm(
    db: &Database,
    codec: &TokenCodec,
    user: &User,
    token: &str,
) -> Result<User> {
    if user.confirmed {
        return Ok(user.clone());
    }

    let redeemed = codec.redeem(token, TokenPurpose::Confirm)?;
    if redeemed.subject_id != user.id {
        debug!(
            user_id = user.id,
            subject_id = redeemed.subject_id,
            "Confirm token subject mismatch"
        );
        return Err(AccountError::WrongAccount);
    }

    let mut tx = db.begin().await?;
    let mut users = UserRepository::new(&mut tx);
    users.mark_confirmed(user.id).await?;
    let confirmed = users
        .get_by_id(user.id)
        .await?
        .ok_or(AccountError::UnknownSubject)?;
    tx.commit().await?;

    info!(user_id = user.id, "Account confirmed");
    Ok(confirmed)
}

/// Start a password reset.
///
/// Returns the user and a reset token, or `None` for an unknown address.
pub async fn request_password_reset(
    db: &Database,
    codec: &TokenCodec,
    email: &str,
) -> Result<Option<(User, String)>> {
    let mut conn = db.acquire().await?;
    let Some(user) = UserRepository::new(&mut conn)
        .get_by_email(email.trim())
        .await?
    else {
        debug!("Password reset requested for unknown address");
        return Ok(None);
    };

    let token = codec.issue(TokenPurpose::Reset, user.id, None, None)?;
    Ok(Some((user, token)))
}

/// Set a new password with a reset token.
pub async fn reset_password(
    db: &Database,
    codec: &TokenCodec,
    token: &str,
    new_password: &str,
) -> Result<User> {
    let redeemed = codec.redeem(token, TokenPurpose::Reset)?;
    validate_password(new_password)?;

    let mut tx = db.begin().await?;
    let mut users = UserRepository::new(&mut tx);
    let mut user = users
        .get_by_id(redeemed.subject_id)
        .await?
        .ok_or(AccountError::UnknownSubject)?;
    user.set_password(new_password)?;
    users.save_password(&user).await?;
    tx.commit().await?;

    info!(user_id = user.id, "Password reset");
    Ok(user)
}

/// Change the password of a logged-in user.
pub async fn change_password(
    db: &Database,
    user: &User,
    old_password: &str,
    new_password: &str,
) -> Result<User> {
    if !user.verify_password(old_password) {
        return Err(AccountError::WrongPassword);
    }
    validate_password(new_password)?;

    let mut updated = user.clone();
    updated.set_password(new_password)?;

    let mut tx = db.begin().await?;
    UserRepository::new(&mut tx).save_password(&updated).await?;
    tx.commit().await?;

    info!(user_id = user.id, "Password changed");
    Ok(updated)
}

/// Start an email change.
///
/// Checks the password and that the new address is free, then returns a
/// token carrying the new address. Nothing is written yet.
pub async fn request_email_change(
    db: &Database,
    codec: &TokenCodec,
    user: &User,
    new_email: &str,
    password: &str,
) -> Result<String> {
    if !user.verify_password(password) {
        return Err(AccountError::WrongPassword);
    }

    let new_email = new_email.trim().to_lowercase();
    validate_email(&new_email)?;

    let mut conn = db.acquire().await?;
    if UserRepository::new(&mut conn)
        .email_exists(&new_email)
        .await?
    {
        return Err(AccountError::EmailTaken);
    }

    Ok(codec.issue(TokenPurpose::ChangeEmail, user.id, Some(&new_email), None)?)
}

/// Apply an email change with a token.
///
/// Redeeming the same token again succeeds while it is unexpired, since the
/// address already belongs to this user.
pub async fn change_email(
    db: &Database,
    codec: &TokenCodec,
    user: &User,
    token: &str,
) -> Result<User> {
    let redeemed = codec.redeem(token, TokenPurpose::ChangeEmail)?;
    if redeemed.subject_id != user.id {
        return Err(AccountError::WrongAccount);
    }
    let new_email = redeemed.payload.ok_or(AccountError::MissingPayload)?;

    let mut tx = db.begin().await?;
    let mut users = UserRepository::new(&mut tx);

    if let Some(owner) = users.get_by_email(&new_email).await? {
        if owner.id != user.id {
            return Err(AccountError::EmailTaken);
        }
    }

    users.update_email(user.id, &new_email).await?;
    let updated = users
        .get_by_id(user.id)
        .await?
        .ok_or(AccountError::UnknownSubject)?;
    tx.commit().await?;

    info!(user_id = user.id, "Email address changed");
    Ok(updated)
}

/// Assign a role to a user by role name.
pub async fn assign_role(db: &Database, user_id: i64, role_name: &str) -> Result<User> {
    let mut tx = db.begin().await?;

    let role = RoleRepository::new(&mut tx)
        .get_by_name(role_name)
        .await?
        .ok_or_else(|| AccountError::UnknownRole(role_name.to_string()))?;

    let mut users = UserRepository::new(&mut tx);
    match users.update_role(user_id, Some(role.id)).await {
        Ok(()) => {}
        Err(FlaskyError::NotFound(_)) => return Err(AccountError::UnknownAccount),
        Err(e) => return Err(e.into()),
    }
    let user = users
        .get_by_id(user_id)
        .await?
        .ok_or(AccountError::UnknownAccount)?;
    tx.commit().await?;

    info!(user_id, role = %role.name, "Role assigned");
    Ok(user)
}

/// Edit a role's permissions.
///
/// Applied in order: reset (if requested), then add, then remove.
pub async fn update_role_permissions(
    db: &Database,
    role_name: &str,
    add: Permission,
    remove: Permission,
    reset: bool,
) -> Result<Role> {
    let mut tx = db.begin().await?;
    let mut roles = RoleRepository::new(&mut tx);

    let mut role = roles
        .get_by_name(role_name)
        .await?
        .ok_or_else(|| AccountError::UnknownRole(role_name.to_string()))?;

    if reset {
        role.reset_permissions();
    }
    role.add_permission(add);
    role.remove_permission(remove);
    roles.save(&role).await?;
    tx.commit().await?;

    info!(role = %role.name, permissions = %role.permissions, "Role permissions updated");
    Ok(role)
}
