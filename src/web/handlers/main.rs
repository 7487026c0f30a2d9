//! Public pages and permission-gated examples.

use axum::{
    extract::{Path, State},
    Json,
};
use std::sync::Arc;

use crate::auth::{check_permission, Permission, Principal};
use crate::db::UserRepository;
use crate::web::dto::{ApiResponse, IndexResponse, MessageResponse, ProfileResponse};
use crate::web::error::ApiError;
use crate::web::middleware::CurrentPrincipal;

use super::AppState;

/// GET /api/ - Greeting for the current principal.
pub async fn index(CurrentPrincipal(principal): CurrentPrincipal) -> Json<ApiResponse<IndexResponse>> {
    let response = match principal {
        Principal::Authenticated(ref user) => IndexResponse {
            greeting: format!("Hello, {}!", user.username),
            authenticated: true,
            user: Some(user.into()),
        },
        Principal::Anonymous => IndexResponse {
            greeting: "Hello, Stranger!".to_string(),
            authenticated: false,
            user: None,
        },
    };
    Json(ApiResponse::new(response))
}

/// GET /api/users/:username - Public profile.
pub async fn user_profile(
    State(state): State<Arc<AppState>>,
    Path(username): Path<String>,
) -> Result<Json<ApiResponse<ProfileResponse>>, ApiError> {
    let mut conn = state.db.acquire().await?;
    let user = UserRepository::new(&mut conn)
        .get_by_username(&username)
        .await?
        .ok_or_else(|| ApiError::not_found("user not found"))?;

    Ok(Json(ApiResponse::new((&user).into())))
}

/// GET /api/moderate - Only for users with the moderate permission.
pub async fn moderate(
    CurrentPrincipal(principal): CurrentPrincipal,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    check_permission(&principal, Permission::MODERATE)?;
    Ok(Json(ApiResponse::new(MessageResponse::new(
        "For comment moderators!",
    ))))
}
