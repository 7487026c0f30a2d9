//! Authentication module for Flasky.
//!
//! This module provides password hashing, signed action tokens, the
//! permission model, user registration and the account workflows.

mod account;
mod password;
mod permission;
mod registration;
mod token;
pub mod validation;

pub use account::{
    assign_role, authenticate, change_email, change_password, confirm, confirmation_token,
    request_email_change, request_password_reset, reset_password, update_role_permissions,
    AccountError,
};
pub use password::{hash_password, verify_password, PasswordError};
pub use permission::{check_permission, require_confirmed, Permission, PermissionError, Principal};
pub use registration::{register, RegistrationError, RegistrationRequest};
pub use token::{Redeemed, TokenCodec, TokenError, TokenPurpose};
pub use validation::ValidationError;
