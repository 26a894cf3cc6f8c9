//! # Permissions API Handlers
//!
//! CRUD endpoints for permissions under `/api/permissions`.

use crate::error::ApiError;
use crate::handlers::{Created, ResourceId, created};
use crate::models::permission;
use crate::repositories::{PermissionInput, PermissionRepository};
use crate::server::AppState;
use axum::{
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Request payload for creating or replacing a permission
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PermissionRequest {
    /// Unique permission name (required, max 100 characters)
    #[serde(default)]
    #[schema(example = "Can delete members")]
    pub name: String,
}

/// Request payload for partially updating a permission
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct PermissionPatchRequest {
    #[schema(example = "Can delete members")]
    pub name: Option<String>,
}

/// Permission representation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PermissionResponse {
    #[schema(example = 1)]
    pub id: i32,
    #[schema(example = "Can delete members")]
    pub name: String,
    /// Creation timestamp (RFC 3339)
    #[schema(example = "2025-06-01T10:30:00+00:00")]
    pub created_at: String,
    /// Last update timestamp (RFC 3339)
    #[schema(example = "2025-06-01T10:30:00+00:00")]
    pub updated_at: String,
}

impl From<permission::Model> for PermissionResponse {
    fn from(model: permission::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            created_at: model.created_at.to_rfc3339(),
            updated_at: model.updated_at.to_rfc3339(),
        }
    }
}

/// List permissions ordered by name
#[utoipa::path(
    get,
    path = "/api/permissions",
    responses(
        (status = 200, description = "All permissions, ordered by name", body = [PermissionResponse]),
        (status = 500, description = "Internal server error", body = ApiError)
    ),
    tag = "permissions"
)]
pub async fn list_permissions(
    State(state): State<AppState>,
) -> Result<Json<Vec<PermissionResponse>>, ApiError> {
    let permissions = PermissionRepository::new(&state.db).list().await?;
    Ok(Json(permissions.into_iter().map(Into::into).collect()))
}

/// Create a permission
#[utoipa::path(
    post,
    path = "/api/permissions",
    request_body = PermissionRequest,
    responses(
        (status = 201, description = "Permission created", body = PermissionResponse, headers(
            ("Location", description = "URL of the created permission")
        )),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 409, description = "Permission name already exists", body = ApiError)
    ),
    tag = "permissions"
)]
pub async fn create_permission(
    State(state): State<AppState>,
    payload: Result<Json<PermissionRequest>, JsonRejection>,
) -> Result<Created<PermissionResponse>, ApiError> {
    let Json(request) = payload?;

    let permission = PermissionRepository::new(&state.db)
        .create(PermissionInput { name: request.name })
        .await?;

    Ok(created(
        format!("/api/permissions/{}", permission.id),
        permission.into(),
    ))
}

/// Get a permission by ID
#[utoipa::path(
    get,
    path = "/api/permissions/{id}",
    params(("id" = i32, Path, description = "Permission ID")),
    responses(
        (status = 200, description = "Permission found", body = PermissionResponse),
        (status = 404, description = "Permission not found", body = ApiError)
    ),
    tag = "permissions"
)]
pub async fn get_permission(
    State(state): State<AppState>,
    ResourceId(id): ResourceId,
) -> Result<Json<PermissionResponse>, ApiError> {
    let permission = PermissionRepository::new(&state.db).get(id).await?;
    Ok(Json(permission.into()))
}

/// Replace a permission
#[utoipa::path(
    put,
    path = "/api/permissions/{id}",
    params(("id" = i32, Path, description = "Permission ID")),
    request_body = PermissionRequest,
    responses(
        (status = 200, description = "Permission updated", body = PermissionResponse),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 404, description = "Permission not found", body = ApiError),
        (status = 409, description = "Permission name already exists", body = ApiError)
    ),
    tag = "permissions"
)]
pub async fn replace_permission(
    State(state): State<AppState>,
    ResourceId(id): ResourceId,
    payload: Result<Json<PermissionRequest>, JsonRejection>,
) -> Result<Json<PermissionResponse>, ApiError> {
    let Json(request) = payload?;

    let updated = PermissionRepository::new(&state.db)
        .update(id, PermissionInput { name: request.name })
        .await?;
    Ok(Json(updated.into()))
}

/// Partially update a permission
#[utoipa::path(
    patch,
    path = "/api/permissions/{id}",
    params(("id" = i32, Path, description = "Permission ID")),
    request_body = PermissionPatchRequest,
    responses(
        (status = 200, description = "Permission updated", body = PermissionResponse),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 404, description = "Permission not found", body = ApiError),
        (status = 409, description = "Permission name already exists", body = ApiError)
    ),
    tag = "permissions"
)]
pub async fn update_permission(
    State(state): State<AppState>,
    ResourceId(id): ResourceId,
    payload: Result<Json<PermissionPatchRequest>, JsonRejection>,
) -> Result<Json<PermissionResponse>, ApiError> {
    let Json(request) = payload?;
    let repo = PermissionRepository::new(&state.db);

    let permission = match request.name {
        Some(name) => repo.update(id, PermissionInput { name }).await?,
        None => repo.get(id).await?,
    };
    Ok(Json(permission.into()))
}

/// Delete a permission; roles holding it keep their other permissions
#[utoipa::path(
    delete,
    path = "/api/permissions/{id}",
    params(("id" = i32, Path, description = "Permission ID")),
    responses(
        (status = 204, description = "Permission deleted"),
        (status = 404, description = "Permission not found", body = ApiError)
    ),
    tag = "permissions"
)]
pub async fn delete_permission(
    State(state): State<AppState>,
    ResourceId(id): ResourceId,
) -> Result<StatusCode, ApiError> {
    PermissionRepository::new(&state.db).delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
