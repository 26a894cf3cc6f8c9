//! # Tests for Handlers
//!
//! Router-level tests for the service endpoints and error rendering.

use std::sync::Arc;

use crate::config::AppConfig;
use crate::handlers::root;
use crate::models::ServiceInfo;
use crate::server::{AppState, create_app};
use axum::{
    body::{Body, to_bytes},
    http::{Request, StatusCode},
    response::Json,
};
use migration::{Migrator, MigratorTrait};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use serde_json::Value;
use tower::ServiceExt;

async fn migrated_db() -> DatabaseConnection {
    let mut options = ConnectOptions::new("sqlite::memory:");
    options.max_connections(1);
    let db = Database::connect(options).await.unwrap();
    Migrator::up(&db, None).await.unwrap();
    db
}

fn state(db: DatabaseConnection) -> AppState {
    AppState {
        config: Arc::new(AppConfig::default()),
        db,
    }
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_root_handler_returns_expected_service_info() {
    let Json(service_info) = root().await;

    assert_eq!(service_info.service, "roster");
    assert_eq!(service_info.version, env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn test_root_route_serializes_service_info() {
    let app = create_app(state(migrated_db().await));

    let response = app
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let info: ServiceInfo = serde_json::from_value(body_json(response).await).unwrap();
    assert_eq!(info.service, "roster");
}

#[tokio::test]
async fn test_healthz_reports_database_ok() {
    let app = create_app(state(migrated_db().await));

    let response = app
        .oneshot(Request::builder().uri("/healthz").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["database"], "ok");
}

#[tokio::test]
async fn test_trace_id_is_echoed_and_embedded_in_errors() {
    let app = create_app(state(migrated_db().await));

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/team-members/999")
                .header("x-trace-id", "req-abc-123")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(response.headers().get("x-trace-id").unwrap(), "req-abc-123");
    assert_eq!(
        response.headers().get("content-type").unwrap(),
        "application/problem+json"
    );
    let body = body_json(response).await;
    assert_eq!(body["trace_id"], "req-abc-123");
    assert_eq!(body["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_generated_trace_id_when_header_missing() {
    let app = create_app(state(migrated_db().await));

    let response = app
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    let trace_id = response
        .headers()
        .get("x-trace-id")
        .unwrap()
        .to_str()
        .unwrap();
    assert!(uuid::Uuid::parse_str(trace_id).is_ok());
}

#[tokio::test]
async fn test_malformed_id_is_problem_json() {
    let app = create_app(state(migrated_db().await));

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/roles/not-a-number")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["code"], "VALIDATION_FAILED");
    assert!(body["details"]["id"].is_array());
}

#[tokio::test]
async fn test_malformed_json_is_rejected() {
    let app = create_app(state(migrated_db().await));

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/permissions")
                .header("content-type", "application/json")
                .body(Body::from("{\"name\": "))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["code"], "VALIDATION_FAILED");
}

#[tokio::test]
async fn test_openapi_document_lists_resources() {
    let app = create_app(state(migrated_db().await));

    let response = app
        .oneshot(
            Request::builder()
                .uri("/openapi.json")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    for path in [
        "/api/permissions",
        "/api/permissions/{id}",
        "/api/roles",
        "/api/roles/{id}",
        "/api/team-members",
        "/api/team-members/{id}",
    ] {
        assert!(body["paths"][path].is_object(), "missing {path}");
    }
}
