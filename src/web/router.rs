//! Router configuration for the JSON API.

use axum::{
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use super::handlers::{self, AppState};
use super::middleware::create_cors_layer;

/// Create the application router, health check included.
pub fn create_router(app_state: Arc<AppState>, cors_origins: &[String]) -> Router {
    let auth_routes = Router::new()
        .route("/register", post(handlers::register))
        .route("/login", post(handlers::login))
        .route("/logout", post(handlers::logout))
        .route("/me", get(handlers::me))
        .route("/confirm", post(handlers::resend_confirmation))
        .route("/confirm/:token", get(handlers::confirm))
        .route("/change-password", post(handlers::change_password))
        .route("/reset", post(handlers::password_reset_request))
        .route("/reset/:token", post(handlers::password_reset))
        .route("/change-email", post(handlers::change_email_request))
        .route("/change-email/:token", get(handlers::change_email));

    let admin_routes = Router::new()
        .route("/roles", get(handlers::list_roles))
        .route(
            "/roles/:name/permissions",
            post(handlers::update_role_permissions),
        )
        .route("/users/:id/role", put(handlers::assign_role));

    let api_routes = Router::new()
        .route("/users/:username", get(handlers::user_profile))
        .route("/moderate", get(handlers::moderate))
        .nest("/auth", auth_routes)
        .nest("/admin", admin_routes);

    Router::new()
        .route("/api", get(handlers::index))
        .route("/api/", get(handlers::index))
        .nest("/api", api_routes)
        .with_state(app_state)
        .merge(create_health_router())
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(create_cors_layer(cors_origins)),
        )
}

/// Create a health check router.
pub fn create_health_router() -> Router {
    Router::new().route("/health", get(health_check))
}

/// Health check handler.
async fn health_check() -> &'static str {
    "OK"
}
