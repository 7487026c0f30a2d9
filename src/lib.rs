//! Flasky - a small social blogging backend.
//!
//! User registration, login, email confirmation, password reset, email
//! change and role-based permissions behind a JSON API. The account flows
//! rest on signed, time-limited tokens; authorization rests on a
//! permission bitmask attached to roles.

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod mail;
pub mod web;

pub use auth::{
    check_permission, hash_password, register, verify_password, AccountError, PasswordError,
    Permission, PermissionError, Principal, RegistrationError, RegistrationRequest, TokenCodec,
    TokenError, TokenPurpose, ValidationError,
};
pub use config::Config;
pub use db::{Database, NewUser, Role, RoleRepository, User, UserRepository};
pub use error::{FlaskyError, Result};
