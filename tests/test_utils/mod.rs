//! Test utilities for database testing.
//!
//! This module provides utilities for setting up in-memory SQLite databases
//! with migrations applied, plus small fixtures shared by the integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use anyhow::Result;
use axum::{
    Router,
    body::{Body, to_bytes},
    http::{HeaderMap, Request, StatusCode},
};
use migration::{Migrator, MigratorTrait};
use roster::config::AppConfig;
use roster::models::permission;
use roster::repositories::{
    PermissionInput, PermissionRepository, RoleInput, RoleRepository, RoleWithPermissions,
    TeamMemberInput,
};
use roster::server::{AppState, create_app};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use serde_json::Value;
use tower::ServiceExt;

/// Sets up an in-memory SQLite database with all migrations applied.
///
/// The pool holds a single connection so every query sees the same
/// in-memory database. Foreign keys stay enforced.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let mut options = ConnectOptions::new("sqlite::memory:");
    options.max_connections(1).sqlx_logging(false);
    let db = Database::connect(options).await?;

    Migrator::up(&db, None).await?;

    Ok(db)
}

/// Router wired to `db` with default configuration.
pub fn test_app(db: DatabaseConnection) -> Router {
    create_app(AppState {
        config: Arc::new(AppConfig::default()),
        db,
    })
}

pub async fn create_permission(db: &DatabaseConnection, name: &str) -> permission::Model {
    PermissionRepository::new(db)
        .create(PermissionInput {
            name: name.to_string(),
        })
        .await
        .expect("create permission")
}

pub async fn create_role(
    db: &DatabaseConnection,
    name: &str,
    is_admin: bool,
    permission_ids: Vec<i32>,
) -> RoleWithPermissions {
    RoleRepository::new(db)
        .create(RoleInput {
            name: name.to_string(),
            is_admin,
            permission_ids,
        })
        .await
        .expect("create role")
}

/// A valid member input; tweak fields with struct update syntax.
pub fn member_input(email: &str, role_id: Option<i32>) -> TeamMemberInput {
    TeamMemberInput {
        first_name: "Jane".to_string(),
        last_name: "Smith".to_string(),
        email: email.to_string(),
        phone_number: "(555) 123-4567".to_string(),
        role_id,
    }
}

/// Sends a request with an optional JSON body; returns status, parsed body and headers.
pub async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Value, HeaderMap) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let (parts, body) = response.into_parts();
    let bytes = to_bytes(body, usize::MAX).await.unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };

    (parts.status, json, parts.headers)
}
