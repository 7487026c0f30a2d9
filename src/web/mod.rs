//! Web API module for Flasky.
//!
//! A JSON API over axum: registration, login, the token-based account
//! flows, and permission-gated administration.

pub mod dto;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod server;

pub use error::ApiError;
pub use handlers::AppState;
pub use router::create_router;
pub use server::WebServer;
