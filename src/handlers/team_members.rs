//! # Team Members API Handlers
//!
//! CRUD endpoints for team members under `/api/team-members`. Every write
//! goes through the validated save path, so the phone format and email
//! uniqueness hold for PUT and PATCH as well as POST.

use crate::error::ApiError;
use crate::handlers::roles::RoleResponse;
use crate::handlers::{Created, ResourceId, created, deserialize_some};
use crate::repositories::{
    TeamMemberInput, TeamMemberRepository, TeamMemberUpdate, TeamMemberWithRole,
};
use crate::server::AppState;
use axum::{
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Request payload for creating or replacing a team member
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TeamMemberRequest {
    #[serde(default)]
    #[schema(example = "Jane")]
    pub first_name: String,
    #[serde(default)]
    #[schema(example = "Smith")]
    pub last_name: String,
    /// Unique across all team members
    #[serde(default)]
    #[schema(example = "jane@example.com")]
    pub email: String,
    /// Must match `(XXX) XXX-XXXX` exactly
    #[serde(default)]
    #[schema(example = "(555) 123-4567")]
    pub phone_number: String,
    /// Role to assign; omit or null for none
    #[serde(default)]
    #[schema(example = 1)]
    pub role_id: Option<i32>,
}

impl From<TeamMemberRequest> for TeamMemberInput {
    fn from(request: TeamMemberRequest) -> Self {
        Self {
            first_name: request.first_name,
            last_name: request.last_name,
            email: request.email,
            phone_number: request.phone_number,
            role_id: request.role_id,
        }
    }
}

/// Request payload for partially updating a team member.
/// Absent fields are left unchanged; `"role_id": null` clears the role.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct TeamMemberPatchRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    #[schema(example = "(555) 123-4567")]
    pub phone_number: Option<String>,
    #[serde(
        default,
        deserialize_with = "deserialize_some",
        skip_serializing_if = "Option::is_none"
    )]
    #[schema(value_type = Option<i32>)]
    pub role_id: Option<Option<i32>>,
}

impl From<TeamMemberPatchRequest> for TeamMemberUpdate {
    fn from(request: TeamMemberPatchRequest) -> Self {
        Self {
            first_name: request.first_name,
            last_name: request.last_name,
            email: request.email,
            phone_number: request.phone_number,
            role_id: request.role_id,
        }
    }
}

/// Team member representation with the role embedded
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct TeamMemberResponse {
    #[schema(example = 1)]
    pub id: i32,
    #[schema(example = "Jane")]
    pub first_name: String,
    #[schema(example = "Smith")]
    pub last_name: String,
    #[schema(example = "jane@example.com")]
    pub email: String,
    #[schema(example = "(555) 123-4567")]
    pub phone_number: String,
    /// Assigned role with its permissions, or null
    pub role: Option<RoleResponse>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<TeamMemberWithRole> for TeamMemberResponse {
    fn from(value: TeamMemberWithRole) -> Self {
        let TeamMemberWithRole { member, role } = value;
        Self {
            id: member.id,
            first_name: member.first_name,
            last_name: member.last_name,
            email: member.email,
            phone_number: member.phone_number,
            role: role.map(Into::into),
            created_at: member.created_at.to_rfc3339(),
            updated_at: member.updated_at.to_rfc3339(),
        }
    }
}

/// List team members, most recently created first
#[utoipa::path(
    get,
    path = "/api/team-members",
    responses(
        (status = 200, description = "All team members, newest first", body = [TeamMemberResponse]),
        (status = 500, description = "Internal server error", body = ApiError)
    ),
    tag = "team-members"
)]
pub async fn list_team_members(
    State(state): State<AppState>,
) -> Result<Json<Vec<TeamMemberResponse>>, ApiError> {
    let members = TeamMemberRepository::new(&state.db).list().await?;
    Ok(Json(members.into_iter().map(Into::into).collect()))
}

/// Create a team member
#[utoipa::path(
    post,
    path = "/api/team-members",
    request_body = TeamMemberRequest,
    responses(
        (status = 201, description = "Team member created", body = TeamMemberResponse, headers(
            ("Location", description = "URL of the created team member")
        )),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 404, description = "Role not found", body = ApiError),
        (status = 409, description = "Email already in use", body = ApiError)
    ),
    tag = "team-members"
)]
pub async fn create_team_member(
    State(state): State<AppState>,
    payload: Result<Json<TeamMemberRequest>, JsonRejection>,
) -> Result<Created<TeamMemberResponse>, ApiError> {
    let Json(request) = payload?;

    let member = TeamMemberRepository::new(&state.db)
        .create(request.into())
        .await?;

    Ok(created(
        format!("/api/team-members/{}", member.member.id),
        member.into(),
    ))
}

/// Get a team member by ID
#[utoipa::path(
    get,
    path = "/api/team-members/{id}",
    params(("id" = i32, Path, description = "Team member ID")),
    responses(
        (status = 200, description = "Team member found", body = TeamMemberResponse),
        (status = 404, description = "Team member not found", body = ApiError)
    ),
    tag = "team-members"
)]
pub async fn get_team_member(
    State(state): State<AppState>,
    ResourceId(id): ResourceId,
) -> Result<Json<TeamMemberResponse>, ApiError> {
    let member = TeamMemberRepository::new(&state.db).get(id).await?;
    Ok(Json(member.into()))
}

/// Replace a team member
#[utoipa::path(
    put,
    path = "/api/team-members/{id}",
    params(("id" = i32, Path, description = "Team member ID")),
    request_body = TeamMemberRequest,
    responses(
        (status = 200, description = "Team member updated", body = TeamMemberResponse),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 404, description = "Team member or role not found", body = ApiError),
        (status = 409, description = "Email already in use", body = ApiError)
    ),
    tag = "team-members"
)]
pub async fn replace_team_member(
    State(state): State<AppState>,
    ResourceId(id): ResourceId,
    payload: Result<Json<TeamMemberRequest>, JsonRejection>,
) -> Result<Json<TeamMemberResponse>, ApiError> {
    let Json(request) = payload?;

    let member = TeamMemberRepository::new(&state.db)
        .replace(id, request.into())
        .await?;
    Ok(Json(member.into()))
}

/// Partially update a team member
#[utoipa::path(
    patch,
    path = "/api/team-members/{id}",
    params(("id" = i32, Path, description = "Team member ID")),
    request_body = TeamMemberPatchRequest,
    responses(
        (status = 200, description = "Team member updated", body = TeamMemberResponse),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 404, description = "Team member or role not found", body = ApiError),
        (status = 409, description = "Email already in use", body = ApiError)
    ),
    tag = "team-members"
)]
pub async fn update_team_member(
    State(state): State<AppState>,
    ResourceId(id): ResourceId,
    payload: Result<Json<TeamMemberPatchRequest>, JsonRejection>,
) -> Result<Json<TeamMemberResponse>, ApiError> {
    let Json(request) = payload?;

    let member = TeamMemberRepository::new(&state.db)
        .update(id, request.into())
        .await?;
    Ok(Json(member.into()))
}

/// Delete a team member
#[utoipa::path(
    delete,
    path = "/api/team-members/{id}",
    params(("id" = i32, Path, description = "Team member ID")),
    responses(
        (status = 204, description = "Team member deleted"),
        (status = 404, description = "Team member not found", body = ApiError)
    ),
    tag = "team-members"
)]
pub async fn delete_team_member(
    State(state): State<AppState>,
    ResourceId(id): ResourceId,
) -> Result<StatusCode, ApiError> {
    TeamMemberRepository::new(&state.db).delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
