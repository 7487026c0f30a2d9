//! Input validation for Flasky accounts.
//!
//! This module provides validation functions for usernames, passwords
//! and email addresses.

use thiserror::Error;

/// Maximum username length.
pub const MAX_USERNAME_LENGTH: usize = 64;

/// Maximum password length.
pub const MAX_PASSWORD_LENGTH: usize = 128;

/// Maximum email length.
pub const MAX_EMAIL_LENGTH: usize = 64;

/// Validation errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Username is empty.
    #[error("username is required")]
    UsernameEmpty,

    /// Username is too long.
    #[error("username must be at most {MAX_USERNAME_LENGTH} characters")]
    UsernameTooLong,

    /// Username contains invalid characters.
    #[error("Usernames must have only letters, numbers, dots or underscores")]
    UsernameInvalidChars,

    /// Password is empty.
    #[error("password is required")]
    PasswordEmpty,

    /// Password is too long.
    #[error("password must be at most {MAX_PASSWORD_LENGTH} characters")]
    PasswordTooLong,

    /// Password and confirmation differ.
    #[error("Passwords must match.")]
    PasswordMismatch,

    /// Email is empty.
    #[error("email is required")]
    EmailEmpty,

    /// Email is too long.
    #[error("email must be at most {MAX_EMAIL_LENGTH} characters")]
    EmailTooLong,

    /// Email format is invalid.
    #[error("invalid email format")]
    EmailInvalidFormat,
}

impl ValidationError {
    /// Form field the error belongs to.
    pub fn field(&self) -> &'static str {
        match self {
            Self::UsernameEmpty | Self::UsernameTooLong | Self::UsernameInvalidChars => {
                "username"
            }
            Self::PasswordEmpty | Self::PasswordTooLong => "password",
            Self::PasswordMismatch => "password2",
            Self::EmailEmpty | Self::EmailTooLong | Self::EmailInvalidFormat => "email",
        }
    }
}

/// Validate a username.
///
/// Requirements:
/// - Length: 1-64 characters
/// - First character is an ASCII letter
/// - Remaining characters are ASCII letters, digits, dots or underscores
///
/// # Examples
///
/// ```
/// use flasky::auth::validation::validate_username;
///
/// assert!(validate_username("john.doe_2").is_ok());
/// assert!(validate_username("2john").is_err());
/// ```
pub fn validate_username(username: &str) -> Result<(), ValidationError> {
    let mut chars = username.chars();
    let first = chars.next().ok_or(ValidationError::UsernameEmpty)?;

    if username.chars().count() > MAX_USERNAME_LENGTH {
        return Err(ValidationError::UsernameTooLong);
    }

    if !first.is_ascii_alphabetic()
        || !chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.')
    {
        return Err(ValidationError::UsernameInvalidChars);
    }

    Ok(())
}

/// Validate a password: non-empty, at most 128 characters.
pub fn validate_password(password: &str) -> Result<(), ValidationError> {
    if password.is_empty() {
        return Err(ValidationError::PasswordEmpty);
    }
    if password.chars().count() > MAX_PASSWORD_LENGTH {
        return Err(ValidationError::PasswordTooLong);
    }
    Ok(())
}

/// Validate a password and its confirmation.
pub fn validate_new_password(password: &str, password2: &str) -> Result<(), ValidationError> {
    validate_password(password)?;
    if password != password2 {
        return Err(ValidationError::PasswordMismatch);
    }
    Ok(())
}

/// Validate an email address.
///
/// The check is a shape test (`local@domain.tld`), not full RFC 5322.
///
/// # Examples
///
/// ```
/// use flasky::auth::validation::validate_email;
///
/// assert!(validate_email("user@example.com").is_ok());
/// assert!(validate_email("invalid").is_err());
/// ```
pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    if email.is_empty() {
        return Err(ValidationError::EmailEmpty);
    }

    if email.chars().count() > MAX_EMAIL_LENGTH {
        return Err(ValidationError::EmailTooLong);
    }

    if email.chars().any(|c| c.is_whitespace()) {
        return Err(ValidationError::EmailInvalidFormat);
    }

    let (local, domain) = email
        .split_once('@')
        .ok_or(ValidationError::EmailInvalidFormat)?;

    if local.is_empty() || domain.contains('@') || !domain.contains('.') {
        return Err(ValidationError::EmailInvalidFormat);
    }

    if domain.split('.').any(|p| p.is_empty()) {
        return Err(ValidationError::EmailInvalidFormat);
    }

    Ok(())
}

/// Validate all registration fields at once.
///
/// Returns the first validation error encountered.
pub fn validate_registration(
    email: &str,
    username: &str,
    password: &str,
) -> Result<(), ValidationError> {
    validate_email(email)?;
    validate_username(username)?;
    validate_password(password)?;
    Ok(())
}
