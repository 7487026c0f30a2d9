//! Request DTOs for Web API.

use serde::Deserialize;
use validator::Validate;

use super::validation::{not_empty_trimmed, valid_email, valid_password, valid_username};

/// Login request.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    /// Email address.
    #[validate(custom(function = "valid_email"))]
    pub email: String,
    /// Password.
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// User registration request.
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    /// Email address.
    #[validate(custom(function = "valid_email"))]
    pub email: String,
    /// Username.
    #[validate(custom(function = "valid_username"))]
    pub username: String,
    /// Password.
    #[validate(custom(function = "valid_password"))]
    pub password: String,
    /// Password confirmation.
    #[validate(must_match(other = "password", message = "Passwords must match."))]
    pub password2: String,
}

/// Password change request for a logged-in user.
#[derive(Debug, Deserialize, Validate)]
pub struct ChangePasswordRequest {
    /// Current password.
    #[validate(length(min = 1, message = "Old password is required"))]
    pub old_password: String,
    /// New password.
    #[validate(custom(function = "valid_password"))]
    pub password: String,
    /// New password confirmation.
    #[validate(must_match(other = "password", message = "Passwords must match."))]
    pub password2: String,
}

/// Password reset mail request.
#[derive(Debug, Deserialize, Validate)]
pub struct PasswordResetRequest {
    /// Account email address.
    #[validate(custom(function = "valid_email"))]
    pub email: String,
}

/// New password submitted with a reset token.
#[derive(Debug, Deserialize, Validate)]
pub struct PasswordResetForm {
    /// New password.
    #[validate(custom(function = "valid_password"))]
    pub password: String,
    /// New password confirmation.
    #[validate(must_match(other = "password", message = "Passwords must match."))]
    pub password2: String,
}

/// Email change request.
#[derive(Debug, Deserialize, Validate)]
pub struct ChangeEmailRequest {
    /// New email address.
    #[validate(custom(function = "valid_email"))]
    pub email: String,
    /// Current password.
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Role permission edit.
///
/// Applied in order: reset, add, remove.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct RolePermissionsRequest {
    /// Permission names to grant.
    #[serde(default)]
    pub add: Vec<String>,
    /// Permission names to revoke.
    #[serde(default)]
    pub remove: Vec<String>,
    /// Clear every permission first.
    #[serde(default)]
    pub reset: bool,
}

/// Role assignment.
#[derive(Debug, Deserialize, Validate)]
pub struct AssignRoleRequest {
    /// Role name.
    #[validate(custom(function = "not_empty_trimmed"))]
    pub role: String,
}
