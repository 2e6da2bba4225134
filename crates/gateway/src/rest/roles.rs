//! Role, permission and role-assignment endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use spk_access::{ModuleGroup, PermissionView, RoleView};
use spk_database::{CreateRoleRequest, UpdateRoleRequest};
use utoipa::ToSchema;

use crate::error::ApiError;
use crate::middleware::CurrentUser;
use crate::state::AppState;

#[derive(Debug, Deserialize, ToSchema)]
pub struct SetPermissionsRequest {
    /// Permission keys such as `member.view`.
    pub permissions: Vec<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AssignRoleRequest {
    pub role_id: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AssignRoleResponse {
    /// False when the user already held the role.
    pub assigned: bool,
}

#[derive(Debug, Serialize)]
pub struct PermissionsResponse {
    pub permissions: Vec<PermissionView>,
    pub modules: Vec<ModuleGroup>,
}

pub fn create_role_routes() -> Router<AppState> {
    Router::new()
        .route("/api/roles", get(list_roles).post(create_role))
        .route("/api/roles/:role_id", get(get_role).put(update_role).delete(delete_role))
        .route("/api/roles/:role_id/permissions", put(set_role_permissions))
        .route("/api/permissions", get(list_permissions))
        .route("/api/permissions/:permission_id", get(get_permission))
        .route("/api/users/:user_id/roles", post(assign_role))
        .route("/api/users/:user_id/roles/:role_id", delete(revoke_role))
}

#[utoipa::path(
    get,
    path = "/api/roles",
    tag = "Roles",
    security(("bearerAuth" = [])),
    responses(
        (status = 200, description = "Roles with level, badge, user count and grouped permissions"),
        (status = 403, description = "Missing role.view", body = crate::error::ErrorResponse)
    )
)]
pub async fn list_roles(State(state): State<AppState>, current: CurrentUser) -> Result<Json<Vec<RoleView>>, ApiError> {
    let roles = state.access().list_roles(&current.viewer).await?;
    Ok(Json(roles.iter().map(|role| role.view()).collect()))
}

#[utoipa::path(
    post,
    path = "/api/roles",
    tag = "Roles",
    security(("bearerAuth" = [])),
    responses(
        (status = 201, description = "Role created"),
        (status = 409, description = "Title already used", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_role(
    State(state): State<AppState>,
    current: CurrentUser,
    Json(req): Json<CreateRoleRequest>,
) -> Result<(StatusCode, Json<RoleView>), ApiError> {
    let role = state.access().create_role(&current.viewer, req).await?;
    Ok((StatusCode::CREATED, Json(role.view())))
}

#[utoipa::path(
    get,
    path = "/api/roles/{role_id}",
    tag = "Roles",
    security(("bearerAuth" = [])),
    params(("role_id" = i64, Path, description = "Role id")),
    responses(
        (status = 200, description = "Role with its permissions"),
        (status = 404, description = "Role not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_role(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(role_id): Path<i64>,
) -> Result<Json<RoleView>, ApiError> {
    let role = state.access().get_role(&current.viewer, role_id).await?;
    Ok(Json(role.view()))
}

#[utoipa::path(
    put,
    path = "/api/roles/{role_id}",
    tag = "Roles",
    security(("bearerAuth" = [])),
    params(("role_id" = i64, Path, description = "Role id")),
    responses(
        (status = 200, description = "Role updated"),
        (status = 409, description = "System roles cannot be renamed", body = crate::error::ErrorResponse)
    )
)]
pub async fn update_role(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(role_id): Path<i64>,
    Json(req): Json<UpdateRoleRequest>,
) -> Result<Json<RoleView>, ApiError> {
    let role = state.access().update_role(&current.viewer, role_id, req).await?;
    Ok(Json(role.view()))
}

#[utoipa::path(
    delete,
    path = "/api/roles/{role_id}",
    tag = "Roles",
    security(("bearerAuth" = [])),
    params(("role_id" = i64, Path, description = "Role id")),
    responses(
        (status = 204, description = "Role deleted"),
        (status = 409, description = "System roles cannot be deleted", body = crate::error::ErrorResponse)
    )
)]
pub async fn delete_role(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(role_id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.access().delete_role(&current.viewer, role_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    put,
    path = "/api/roles/{role_id}/permissions",
    tag = "Roles",
    security(("bearerAuth" = [])),
    params(("role_id" = i64, Path, description = "Role id")),
    request_body = SetPermissionsRequest,
    responses(
        (status = 200, description = "Permission set replaced"),
        (status = 400, description = "Unknown or malformed permission key", body = crate::error::ErrorResponse),
        (status = 409, description = "The Super Admin permission set is immutable", body = crate::error::ErrorResponse)
    )
)]
pub async fn set_role_permissions(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(role_id): Path<i64>,
    Json(req): Json<SetPermissionsRequest>,
) -> Result<Json<RoleView>, ApiError> {
    let role = state
        .access()
        .set_role_permissions(&current.viewer, role_id, &req.permissions)
        .await?;
    Ok(Json(role.view()))
}

#[utoipa::path(
    get,
    path = "/api/permissions",
    tag = "Roles",
    security(("bearerAuth" = [])),
    responses(
        (status = 200, description = "Flat permission list and the same list grouped by module"),
        (status = 403, description = "Missing permission.view", body = crate::error::ErrorResponse)
    )
)]
pub async fn list_permissions(
    State(state): State<AppState>,
    current: CurrentUser,
) -> Result<Json<PermissionsResponse>, ApiError> {
    let permissions = state.access().list_permissions(&current.viewer).await?;
    let modules = state.access().grouped_permissions(&current.viewer).await?;
    Ok(Json(PermissionsResponse {
        permissions: permissions.iter().map(|permission| permission.view()).collect(),
        modules,
    }))
}

#[utoipa::path(
    get,
    path = "/api/permissions/{permission_id}",
    tag = "Roles",
    security(("bearerAuth" = [])),
    params(("permission_id" = i64, Path, description = "Permission id")),
    responses(
        (status = 200, description = "Permission with the roles holding it"),
        (status = 404, description = "Permission not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_permission(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(permission_id): Path<i64>,
) -> Result<Json<PermissionView>, ApiError> {
    let permission = state.access().permission(&current.viewer, permission_id).await?;
    Ok(Json(permission.view()))
}

#[utoipa::path(
    post,
    path = "/api/users/{user_id}/roles",
    tag = "Roles",
    security(("bearerAuth" = [])),
    params(("user_id" = i64, Path, description = "User id")),
    request_body = AssignRoleRequest,
    responses(
        (status = 200, description = "Role assigned", body = AssignRoleResponse),
        (status = 403, description = "Role outranks the caller", body = crate::error::ErrorResponse)
    )
)]
pub async fn assign_role(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(user_id): Path<i64>,
    Json(req): Json<AssignRoleRequest>,
) -> Result<Json<AssignRoleResponse>, ApiError> {
    let assigned = state.access().assign_role(&current.viewer, user_id, req.role_id).await?;
    Ok(Json(AssignRoleResponse { assigned }))
}

#[utoipa::path(
    delete,
    path = "/api/users/{user_id}/roles/{role_id}",
    tag = "Roles",
    security(("bearerAuth" = [])),
    params(
        ("user_id" = i64, Path, description = "User id"),
        ("role_id" = i64, Path, description = "Role id")
    ),
    responses(
        (status = 204, description = "Role revoked"),
        (status = 409, description = "The last Super Admin cannot be revoked", body = crate::error::ErrorResponse)
    )
)]
pub async fn revoke_role(
    State(state): State<AppState>,
    current: CurrentUser,
    Path((user_id, role_id)): Path<(i64, i64)>,
) -> Result<StatusCode, ApiError> {
    state.access().revoke_role(&current.viewer, user_id, role_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
