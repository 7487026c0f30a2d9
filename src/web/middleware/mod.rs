//! Middleware for Web API.

pub mod auth;
pub mod cors;

pub use auth::{AuthUser, ConfirmedUser, CurrentPrincipal, SessionClaims, SessionKeys};
pub use cors::create_cors_layer;
