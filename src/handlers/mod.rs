//! # API Handlers
//!
//! This module contains all the HTTP endpoint handlers for the roster API.

pub mod permissions;
pub mod roles;
pub mod team_members;

use crate::db;
use crate::error::{ApiError, validation_error};
use crate::models::ServiceInfo;
use crate::server::AppState;
use axum::{
    extract::{FromRequestParts, Path, State},
    http::{HeaderName, StatusCode, header::LOCATION, request::Parts},
    response::Json,
};
use serde::{Deserialize, Deserializer, Serialize};
use utoipa::ToSchema;

/// Root handler that returns basic service information
#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 200, description = "Service information", body = ServiceInfo)
    ),
    tag = "root"
)]
pub async fn root() -> Json<ServiceInfo> {
    Json(ServiceInfo::default())
}

/// Liveness and database reachability
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HealthStatus {
    #[schema(example = "ok")]
    pub status: String,
    #[schema(example = "ok")]
    pub database: String,
}

/// Health check that pings the database
#[utoipa::path(
    get,
    path = "/healthz",
    responses(
        (status = 200, description = "Service and database are healthy", body = HealthStatus),
        (status = 503, description = "Database unreachable", body = ApiError)
    ),
    tag = "root"
)]
pub async fn healthz(State(state): State<AppState>) -> Result<Json<HealthStatus>, ApiError> {
    db::health_check(&state.db).await.map_err(|err| {
        tracing::warn!(error = %err, "Health check failed");
        ApiError::new(
            StatusCode::SERVICE_UNAVAILABLE,
            "SERVICE_UNAVAILABLE",
            "Database unreachable",
        )
        .with_retry_after(5)
    })?;

    Ok(Json(HealthStatus {
        status: "ok".to_string(),
        database: "ok".to_string(),
    }))
}

/// `201 Created` with a `Location` header pointing at the new resource.
pub type Created<T> = (StatusCode, [(HeaderName, String); 1], Json<T>);

pub fn created<T>(location: String, body: T) -> Created<T> {
    (StatusCode::CREATED, [(LOCATION, location)], Json(body))
}

/// Integer `{id}` path segment. Malformed ids are rejected as problem+json.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceId(pub i32);

impl<S> FromRequestParts<S> for ResourceId
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(id) = Path::<i32>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| {
                validation_error(
                    "Invalid resource id",
                    serde_json::json!({ "id": [rejection.body_text()] }),
                )
            })?;
        Ok(Self(id))
    }
}

/// Deserialize a present field (including an explicit `null`) as `Some`.
///
/// Combined with `#[serde(default)]` this distinguishes an absent field
/// (`None`) from `null` (`Some(None)`).
pub fn deserialize_some<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    T::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests;
