//! Response DTOs for Web API.

use serde::Serialize;

use crate::db::{Role, User};

/// Generic API response wrapper.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    /// Response data.
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    /// Create a new API response.
    pub fn new(data: T) -> Self {
        Self { data }
    }
}

/// A plain confirmation message.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    /// Human-readable message.
    pub message: String,
}

impl MessageResponse {
    /// Create a message response.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Session issued by login and registration.
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    /// Bearer token.
    pub access_token: String,
    /// Always `Bearer`.
    pub token_type: &'static str,
    /// Token lifetime in seconds.
    pub expires_in: u64,
    /// The logged-in user.
    pub user: UserInfo,
}

/// The logged-in user's own view of the account.
#[derive(Debug, Serialize)]
pub struct UserInfo {
    /// User ID.
    pub id: i64,
    /// Username.
    pub username: String,
    /// Email address.
    pub email: String,
    /// Whether the email address is confirmed.
    pub confirmed: bool,
    /// Role name.
    pub role: Option<String>,
    /// Granted permission names.
    pub permissions: Vec<&'static str>,
    /// Account creation time.
    pub member_since: String,
}

impl From<&User> for UserInfo {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            confirmed: user.confirmed,
            role: user.role_name().map(str::to_string),
            permissions: user
                .role
                .as_ref()
                .map(|r| r.permissions.names())
                .unwrap_or_default(),
            member_since: user.created_at.clone(),
        }
    }
}

/// A message together with the updated account.
#[derive(Debug, Serialize)]
pub struct AccountResponse {
    /// Human-readable message.
    pub message: String,
    /// The account after the operation.
    pub user: UserInfo,
}

impl AccountResponse {
    /// Create an account response.
    pub fn new(message: impl Into<String>, user: &User) -> Self {
        Self {
            message: message.into(),
            user: user.into(),
        }
    }
}

/// Public profile of a user.
#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    /// Username.
    pub username: String,
    /// Role name.
    pub role: Option<String>,
    /// Account creation time.
    pub member_since: String,
}

impl From<&User> for ProfileResponse {
    fn from(user: &User) -> Self {
        Self {
            username: user.username.clone(),
            role: user.role_name().map(str::to_string),
            member_since: user.created_at.clone(),
        }
    }
}

/// Summary of the current principal.
#[derive(Debug, Serialize)]
pub struct IndexResponse {
    /// Greeting line.
    pub greeting: String,
    /// Whether a user is logged in.
    pub authenticated: bool,
    /// The logged-in user, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<UserInfo>,
}

/// Role with its permissions.
#[derive(Debug, Serialize)]
pub struct RoleInfo {
    /// Role ID.
    pub id: i64,
    /// Role name.
    pub name: String,
    /// Whether new users get this role.
    pub is_default: bool,
    /// Raw permission bits.
    pub bits: i64,
    /// Granted permission names.
    pub permissions: Vec<&'static str>,
}

impl From<&Role> for RoleInfo {
    fn from(role: &Role) -> Self {
        Self {
            id: role.id,
            name: role.name.clone(),
            is_default: role.is_default,
            bits: role.permissions.bits(),
            permissions: role.permissions.names(),
        }
    }
}
