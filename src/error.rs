//! # Error Handling
//!
//! This module provides unified error handling for the roster API,
//! implementing a consistent problem+json response format with trace ID propagation.
//!
//! Repositories return [`RepositoryError`]; handlers convert it into [`ApiError`].
//! Uniqueness conflicts always map to `409 Conflict`, whether they are caught by
//! a repository pre-check or by a unique index in the database.

use axum::{
    extract::rejection::JsonRejection,
    http::{HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;
use utoipa::ToSchema;

use crate::telemetry;
use crate::validation::FieldErrors;

/// Unified API error response structure
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ApiError {
    /// HTTP status code for the response
    #[serde(skip_serializing, skip_deserializing)]
    pub status: StatusCode,
    /// Error code for programmatic handling
    pub code: Box<str>,
    /// Human-readable error message
    pub message: Box<str>,
    /// Additional error details (optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub details: Option<Box<serde_json::Value>>,
    /// Suggested retry delay in seconds (optional)
    pub retry_after: Option<u64>,
    /// Correlation trace ID for debugging (optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace_id: Option<Box<str>>,
}

impl ApiError {
    /// Create a new API error with the given status code and message
    pub fn new<S: Into<String>>(status: StatusCode, code: S, message: S) -> Self {
        Self {
            status,
            code: code.into().into_boxed_str(),
            message: message.into().into_boxed_str(),
            details: None,
            retry_after: None,
            trace_id: Self::current_trace_id(),
        }
    }

    /// Add details to the error
    pub fn with_details<V: Into<serde_json::Value>>(mut self, details: V) -> Self {
        self.details = Some(Box::new(details.into()));
        self
    }

    /// Set retry after delay
    pub fn with_retry_after(mut self, seconds: u64) -> Self {
        self.retry_after = Some(seconds);
        self
    }

    /// Extract current trace ID from the active request (falls back to generated correlation ID)
    fn current_trace_id() -> Option<Box<str>> {
        telemetry::current_trace_id()
            .map(|trace_id| trace_id.into_boxed_str())
            .or_else(|| {
                // Fallback: generate a correlation ID for basic client-server log correlation
                Some(format!("corr-{}", &uuid::Uuid::new_v4().to_string()[..8]).into_boxed_str())
            })
    }
}

/// True when `error` is a unique-constraint violation on Postgres or SQLite.
pub(crate) fn is_unique_violation(error: &sea_orm::DbErr) -> bool {
    use sea_orm::RuntimeErr;

    const PG_UNIQUE: &str = "23505";
    const SQLITE_DUPLICATE_CODES: &[&str] = &["1555", "2067"];

    let runtime_err = match error {
        sea_orm::DbErr::Query(RuntimeErr::SqlxError(sqlx_err))
        | sea_orm::DbErr::Exec(RuntimeErr::SqlxError(sqlx_err)) => sqlx_err,
        _ => return false,
    };

    let Some(db_error) = runtime_err.as_database_error() else {
        return false;
    };

    if db_error.is_unique_violation() {
        return true;
    }

    match db_error.code() {
        Some(code) => {
            let code_str = code.as_ref();
            code_str == PG_UNIQUE || SQLITE_DUPLICATE_CODES.contains(&code_str)
        }
        None => false,
    }
}

/// Errors raised by the repository layer.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// One or more fields are missing or malformed.
    #[error("validation failed: {0}")]
    Validation(FieldErrors),
    /// A unique value (email, role name, permission name) is already taken.
    #[error("{field} '{value}' is already in use")]
    Conflict { field: &'static str, value: String },
    /// The requested row, or a row referenced by the request, does not exist.
    #[error("{resource} not found: {ids:?}")]
    NotFound {
        resource: &'static str,
        /// Request field holding the dangling reference, when the missing row
        /// was referenced rather than addressed directly.
        field: Option<&'static str>,
        ids: Vec<i32>,
    },
    #[error("database error: {0}")]
    Database(#[from] sea_orm::DbErr),
}

impl RepositoryError {
    /// The addressed row does not exist.
    pub fn not_found(resource: &'static str, id: i32) -> Self {
        Self::NotFound {
            resource,
            field: None,
            ids: vec![id],
        }
    }

    /// Rows referenced through `field` do not exist.
    pub fn missing_reference(resource: &'static str, field: &'static str, ids: Vec<i32>) -> Self {
        Self::NotFound {
            resource,
            field: Some(field),
            ids,
        }
    }

    pub fn conflict(field: &'static str, value: impl Into<String>) -> Self {
        Self::Conflict {
            field,
            value: value.into(),
        }
    }
}

impl From<FieldErrors> for RepositoryError {
    fn from(errors: FieldErrors) -> Self {
        Self::Validation(errors)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut headers = HeaderMap::new();
        headers.insert(
            "content-type",
            HeaderValue::from_static("application/problem+json"),
        );

        if let Some(retry_after) = self.retry_after {
            if let Ok(header_value) = HeaderValue::from_str(&retry_after.to_string()) {
                headers.insert("retry-after", header_value);
            }
        }

        (self.status, headers, axum::Json(self)).into_response()
    }
}

// Error mappers for common sources

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        let message = match rejection {
            JsonRejection::JsonDataError(err) => format!("Invalid JSON: {}", err.body_text()),
            JsonRejection::JsonSyntaxError(err) => {
                format!("JSON syntax error: {}", err.body_text())
            }
            JsonRejection::MissingJsonContentType(_) => {
                "Missing 'Content-Type: application/json' header".to_string()
            }
            _ => "Invalid request body".to_string(),
        };

        Self::new(StatusCode::BAD_REQUEST, "VALIDATION_FAILED", &message)
    }
}

impl From<sea_orm::DbErr> for ApiError {
    fn from(error: sea_orm::DbErr) -> Self {
        if is_unique_violation(&error) {
            tracing::debug!(?error, "Unique constraint violation detected");
            return Self::new(StatusCode::CONFLICT, "CONFLICT", "Resource already exists");
        }

        match error {
            sea_orm::DbErr::Conn(connection_err) => {
                tracing::error!("Database connection error: {:?}", connection_err);
                Self::new(
                    StatusCode::SERVICE_UNAVAILABLE,
                    "SERVICE_UNAVAILABLE",
                    "Database service unavailable",
                )
            }
            _ => {
                tracing::error!("Database error: {:?}", error);
                Self::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_SERVER_ERROR",
                    "Database error occurred",
                )
            }
        }
    }
}

impl From<RepositoryError> for ApiError {
    fn from(error: RepositoryError) -> Self {
        match error {
            RepositoryError::Validation(field_errors) => {
                validation_error("Validation failed", json!(field_errors))
            }
            RepositoryError::Conflict { field, value } => ApiError::new(
                StatusCode::CONFLICT,
                "CONFLICT".to_string(),
                format!("{field} '{value}' is already in use"),
            )
            .with_details(json!({ "field": field, "value": value })),
            RepositoryError::NotFound {
                resource,
                field,
                ids,
            } => {
                let message = match field {
                    Some(field) => format!("{field} references a {resource} that does not exist"),
                    None => format!("{resource} not found"),
                };
                let mut details = json!({ "resource": resource, "ids": ids });
                if let Some(field) = field {
                    details["field"] = json!(field);
                }
                ApiError::new(StatusCode::NOT_FOUND, "NOT_FOUND".to_string(), message)
                    .with_details(details)
            }
            RepositoryError::Database(db_err) => db_err.into(),
        }
    }
}

/// Create a validation error with field details
pub fn validation_error(message: &str, field_errors: serde_json::Value) -> ApiError {
    ApiError::new(StatusCode::BAD_REQUEST, "VALIDATION_FAILED", message).with_details(field_errors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use serde_json::json;

    #[test]
    fn test_api_error_basic() {
        let error = ApiError::new(
            StatusCode::BAD_REQUEST,
            "VALIDATION_FAILED",
            "Test error message",
        );

        assert_eq!(error.code, Box::from("VALIDATION_FAILED"));
        assert_eq!(error.message, Box::from("Test error message"));
        assert_eq!(error.details, None);
        assert_eq!(error.retry_after, None);
    }

    #[test]
    fn test_api_error_with_details() {
        let error = ApiError::new(StatusCode::BAD_REQUEST, "BAD_REQUEST", "Test error message")
            .with_details(json!({"field": "value"}));

        assert_eq!(error.details, Some(Box::new(json!({"field": "value"}))));
    }

    #[test]
    fn test_content_type_header() {
        let response = ApiError::new(StatusCode::BAD_REQUEST, "VALIDATION_FAILED", "Test error")
            .into_response();

        assert_eq!(
            response.headers().get("content-type").unwrap(),
            "application/problem+json"
        );
    }

    #[test]
    fn test_retry_after_header() {
        let response = ApiError::new(
            StatusCode::SERVICE_UNAVAILABLE,
            "SERVICE_UNAVAILABLE",
            "Database service unavailable",
        )
        .with_retry_after(5)
        .into_response();

        assert_eq!(response.headers().get("retry-after").unwrap(), "5");
    }

    #[test]
    fn test_trace_id_generation() {
        let error = ApiError::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "INTERNAL_SERVER_ERROR",
            "Test error",
        );

        let trace_id = error.trace_id.unwrap();
        assert!(trace_id.starts_with("corr-"));
        assert_eq!(trace_id.len(), 13);
    }

    #[test]
    fn phone_validation_maps_to_400_naming_the_field() {
        let mut errors = FieldErrors::new();
        errors.add("phone_number", "phone_number must match (XXX) XXX-XXXX");

        let api_error: ApiError = RepositoryError::Validation(errors).into();

        assert_eq!(api_error.status, StatusCode::BAD_REQUEST);
        assert_eq!(api_error.code, Box::from("VALIDATION_FAILED"));
        let details = api_error.details.unwrap();
        assert_eq!(
            details["phone_number"][0],
            "phone_number must match (XXX) XXX-XXXX"
        );
    }

    #[test]
    fn conflicts_map_to_409_with_field() {
        let api_error: ApiError = RepositoryError::conflict("email", "jane@x.com").into();

        assert_eq!(api_error.status, StatusCode::CONFLICT);
        assert_eq!(api_error.code, Box::from("CONFLICT"));
        assert_eq!(api_error.details.unwrap()["field"], "email");
    }

    #[test]
    fn missing_references_map_to_404_with_field_and_ids() {
        let api_error: ApiError =
            RepositoryError::missing_reference("permission", "permission_ids", vec![7, 9]).into();

        assert_eq!(api_error.status, StatusCode::NOT_FOUND);
        let details = api_error.details.unwrap();
        assert_eq!(details["field"], "permission_ids");
        assert_eq!(details["ids"], json!([7, 9]));
        assert_eq!(details["resource"], "permission");
    }

    #[test]
    fn missing_resource_has_no_field() {
        let api_error: ApiError = RepositoryError::not_found("team member", 3).into();

        assert_eq!(api_error.status, StatusCode::NOT_FOUND);
        assert_eq!(api_error.message, Box::from("team member not found"));
        assert!(api_error.details.unwrap().get("field").is_none());
    }

    #[test]
    fn connection_errors_are_service_unavailable() {
        let api_error: ApiError =
            sea_orm::DbErr::Conn(sea_orm::RuntimeErr::Internal("refused".to_string())).into();

        assert_eq!(api_error.status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(api_error.code, Box::from("SERVICE_UNAVAILABLE"));
    }

    #[test]
    fn other_database_errors_are_internal() {
        let api_error: ApiError =
            RepositoryError::Database(sea_orm::DbErr::Custom("boom".to_string())).into();

        assert_eq!(api_error.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(api_error.details.is_none());
        assert!(!api_error.message.contains("boom"));
    }

    #[test]
    fn test_status_code_preservation() {
        let response =
            ApiError::new(StatusCode::CONFLICT, "CONFLICT", "Resource already exists").into_response();

        assert_eq!(response.status(), StatusCode::CONFLICT);
    }
}
