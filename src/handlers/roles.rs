//! # Roles API Handlers
//!
//! CRUD endpoints for roles under `/api/roles`. Roles are written with
//! permission ids and read back with their permissions embedded.

use crate::error::ApiError;
use crate::handlers::permissions::PermissionResponse;
use crate::handlers::{Created, ResourceId, created};
use crate::repositories::{RoleInput, RoleRepository, RoleUpdate, RoleWithPermissions};
use crate::server::AppState;
use axum::{
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Request payload for creating or replacing a role
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RoleRequest {
    /// Unique role name (required, max 100 characters)
    #[serde(default)]
    #[schema(example = "Developer")]
    pub name: String,
    /// Defaults to false
    #[serde(default)]
    pub is_admin: bool,
    /// Complete permission set; duplicates are ignored
    #[serde(default)]
    #[schema(example = json!([1, 2]))]
    pub permission_ids: Vec<i32>,
}

impl From<RoleRequest> for RoleInput {
    fn from(request: RoleRequest) -> Self {
        Self {
            name: request.name,
            is_admin: request.is_admin,
            permission_ids: request.permission_ids,
        }
    }
}

/// Request payload for partially updating a role. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct RolePatchRequest {
    pub name: Option<String>,
    pub is_admin: Option<bool>,
    /// When present, replaces the whole permission set
    pub permission_ids: Option<Vec<i32>>,
}

impl From<RolePatchRequest> for RoleUpdate {
    fn from(request: RolePatchRequest) -> Self {
        Self {
            name: request.name,
            is_admin: request.is_admin,
            permission_ids: request.permission_ids,
        }
    }
}

/// Role representation with embedded permissions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct RoleResponse {
    #[schema(example = 1)]
    pub id: i32,
    #[schema(example = "Developer")]
    pub name: String,
    pub is_admin: bool,
    /// Permissions ordered by name
    pub permissions: Vec<PermissionResponse>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<RoleWithPermissions> for RoleResponse {
    fn from(value: RoleWithPermissions) -> Self {
        let RoleWithPermissions { role, permissions } = value;
        Self {
            id: role.id,
            name: role.name,
            is_admin: role.is_admin,
            permissions: permissions.into_iter().map(Into::into).collect(),
            created_at: role.created_at.to_rfc3339(),
            updated_at: role.updated_at.to_rfc3339(),
        }
    }
}

/// List roles ordered by name
#[utoipa::path(
    get,
    path = "/api/roles",
    responses(
        (status = 200, description = "All roles, ordered by name", body = [RoleResponse]),
        (status = 500, description = "Internal server error", body = ApiError)
    ),
    tag = "roles"
)]
pub async fn list_roles(State(state): State<AppState>) -> Result<Json<Vec<RoleResponse>>, ApiError> {
    let roles = RoleRepository::new(&state.db).list().await?;
    Ok(Json(roles.into_iter().map(Into::into).collect()))
}

/// Create a role
#[utoipa::path(
    post,
    path = "/api/roles",
    request_body = RoleRequest,
    responses(
        (status = 201, description = "Role created", body = RoleResponse, headers(
            ("Location", description = "URL of the created role")
        )),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 404, description = "A permission id does not exist", body = ApiError),
        (status = 409, description = "Role name already exists", body = ApiError)
    ),
    tag = "roles"
)]
pub async fn create_role(
    State(state): State<AppState>,
    payload: Result<Json<RoleRequest>, JsonRejection>,
) -> Result<Created<RoleResponse>, ApiError> {
    let Json(request) = payload?;

    let role = RoleRepository::new(&state.db).create(request.into()).await?;

    Ok(created(format!("/api/roles/{}", role.role.id), role.into()))
}

/// Get a role by ID
#[utoipa::path(
    get,
    path = "/api/roles/{id}",
    params(("id" = i32, Path, description = "Role ID")),
    responses(
        (status = 200, description = "Role found", body = RoleResponse),
        (status = 404, description = "Role not found", body = ApiError)
    ),
    tag = "roles"
)]
pub async fn get_role(
    State(state): State<AppState>,
    ResourceId(id): ResourceId,
) -> Result<Json<RoleResponse>, ApiError> {
    let role = RoleRepository::new(&state.db).get(id).await?;
    Ok(Json(role.into()))
}

/// Replace a role, including its full permission set
#[utoipa::path(
    put,
    path = "/api/roles/{id}",
    params(("id" = i32, Path, description = "Role ID")),
    request_body = RoleRequest,
    responses(
        (status = 200, description = "Role updated", body = RoleResponse),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 404, description = "Role or permission not found", body = ApiError),
        (status = 409, description = "Role name already exists", body = ApiError)
    ),
    tag = "roles"
)]
pub async fn replace_role(
    State(state): State<AppState>,
    ResourceId(id): ResourceId,
    payload: Result<Json<RoleRequest>, JsonRejection>,
) -> Result<Json<RoleResponse>, ApiError> {
    let Json(request) = payload?;

    let role = RoleRepository::new(&state.db)
        .replace(id, request.into())
        .await?;
    Ok(Json(role.into()))
}

/// Partially update a role
#[utoipa::path(
    patch,
    path = "/api/roles/{id}",
    params(("id" = i32, Path, description = "Role ID")),
    request_body = RolePatchRequest,
    responses(
        (status = 200, description = "Role updated", body = RoleResponse),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 404, description = "Role or permission not found", body = ApiError),
        (status = 409, description = "Role name already exists", body = ApiError)
    ),
    tag = "roles"
)]
pub async fn update_role(
    State(state): State<AppState>,
    ResourceId(id): ResourceId,
    payload: Result<Json<RolePatchRequest>, JsonRejection>,
) -> Result<Json<RoleResponse>, ApiError> {
    let Json(request) = payload?;

    let role = RoleRepository::new(&state.db)
        .update(id, request.into())
        .await?;
    Ok(Json(role.into()))
}

/// Delete a role; members holding it are unassigned, not deleted
#[utoipa::path(
    delete,
    path = "/api/roles/{id}",
    params(("id" = i32, Path, description = "Role ID")),
    responses(
        (status = 204, description = "Role deleted"),
        (status = 404, description = "Role not found", body = ApiError)
    ),
    tag = "roles"
)]
pub async fn delete_role(
    State(state): State<AppState>,
    ResourceId(id): ResourceId,
) -> Result<StatusCode, ApiError> {
    RoleRepository::new(&state.db).delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
