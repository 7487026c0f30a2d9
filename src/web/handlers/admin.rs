//! Administration handlers. Every route requires the admin permission.

use axum::{
    extract::{Path, State},
    Json,
};
use std::sync::Arc;

use crate::auth::{self, check_permission, Permission};
use crate::db::RoleRepository;
use crate::web::dto::{
    ApiResponse, AssignRoleRequest, RoleInfo, RolePermissionsRequest, UserInfo, ValidatedJson,
};
use crate::web::error::ApiError;
use crate::web::middleware::CurrentPrincipal;

use super::AppState;

/// Combine permission names into one set.
fn parse_permissions(field: &str, names: &[String]) -> Result<Permission, ApiError> {
    names.iter().try_fold(Permission::NONE, |acc, name| {
        Permission::from_name(name.trim())
            .map(|p| acc | p)
            .ok_or_else(|| ApiError::field(field, format!("Unknown permission: {}", name)))
    })
}

/// GET /api/admin/roles - List roles.
pub async fn list_roles(
    State(state): State<Arc<AppState>>,
    CurrentPrincipal(principal): CurrentPrincipal,
) -> Result<Json<ApiResponse<Vec<RoleInfo>>>, ApiError> {
    check_permission(&principal, Permission::ADMIN)?;

    let mut conn = state.db.acquire().await?;
    let roles = RoleRepository::new(&mut conn).list().await?;
    Ok(Json(ApiResponse::new(roles.iter().map(RoleInfo::from).collect())))
}

/// POST /api/admin/roles/:name/permissions - Edit a role's permissions.
pub async fn update_role_permissions(
    State(state): State<Arc<AppState>>,
    CurrentPrincipal(principal): CurrentPrincipal,
    Path(name): Path<String>,
    ValidatedJson(req): ValidatedJson<RolePermissionsRequest>,
) -> Result<Json<ApiResponse<RoleInfo>>, ApiError> {
    let admin = check_permission(&principal, Permission::ADMIN)?;
    let add = parse_permissions("add", &req.add)?;
    let remove = parse_permissions("remove", &req.remove)?;

    let role = auth::update_role_permissions(&state.db, &name, add, remove, req.reset).await?;
    tracing::info!(admin_id = admin.id, role = %role.name, "Role edited by administrator");

    Ok(Json(ApiResponse::new((&role).into())))
}

/// PUT /api/admin/users/:id/role - Assign a role to a user.
pub async fn assign_role(
    State(state): State<Arc<AppState>>,
    CurrentPrincipal(principal): CurrentPrincipal,
    Path(user_id): Path<i64>,
    ValidatedJson(req): ValidatedJson<AssignRoleRequest>,
) -> Result<Json<ApiResponse<UserInfo>>, ApiError> {
    check_permission(&principal, Permission::ADMIN)?;

    let user = auth::assign_role(&state.db, user_id, req.role.trim()).await?;
    Ok(Json(ApiResponse::new((&user).into())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::web::error::ErrorCode;

    #[test]
    fn test_parse_permissions() {
        let perms = parse_permissions("add", &["follow".to_string(), " Write ".to_string()])
            .unwrap();
        assert_eq!(perms, Permission::FOLLOW | Permission::WRITE);

        assert_eq!(parse_permissions("add", &[]).unwrap(), Permission::NONE);

        let err = parse_permissions("remove", &["fly".to_string()]).unwrap_err();
        assert_eq!(err.code(), ErrorCode::ValidationError);
    }
}
