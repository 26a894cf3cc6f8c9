//! # Server Configuration
//!
//! This module contains the router, middleware stack, OpenAPI document and
//! serve loop for the roster API.

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    Router,
    http::{HeaderName, HeaderValue, Method, header},
    middleware,
    routing::get,
};
use sea_orm::DatabaseConnection;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::config::AppConfig;
use crate::handlers::{self, permissions, roles, team_members};
use crate::telemetry::{self, TRACE_ID_HEADER};

/// Application state containing shared resources
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub db: DatabaseConnection,
}

/// Creates and configures the Axum application router
pub fn create_app(state: AppState) -> Router {
    let cors = cors_layer(&state.config);

    let api = Router::new()
        .route(
            "/permissions",
            get(permissions::list_permissions).post(permissions::create_permission),
        )
        .route(
            "/permissions/{id}",
            get(permissions::get_permission)
                .put(permissions::replace_permission)
                .patch(permissions::update_permission)
                .delete(permissions::delete_permission),
        )
        .route("/roles", get(roles::list_roles).post(roles::create_role))
        .route(
            "/roles/{id}",
            get(roles::get_role)
                .put(roles::replace_role)
                .patch(roles::update_role)
                .delete(roles::delete_role),
        )
        .route(
            "/team-members",
            get(team_members::list_team_members).post(team_members::create_team_member),
        )
        .route(
            "/team-members/{id}",
            get(team_members::get_team_member)
                .put(team_members::replace_team_member)
                .patch(team_members::update_team_member)
                .delete(team_members::delete_team_member),
        );

    Router::new()
        .route("/", get(handlers::root))
        .route("/healthz", get(handlers::healthz))
        .nest("/api", api)
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/openapi.json", ApiDoc::openapi()))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(telemetry::trace_middleware))
}

fn cors_layer(config: &AppConfig) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers([header::CONTENT_TYPE, HeaderName::from_static(TRACE_ID_HEADER)])
        .expose_headers([header::LOCATION, HeaderName::from_static(TRACE_ID_HEADER)]);

    if config.cors_allowed_origins.iter().any(|origin| origin == "*") {
        return layer.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = config
        .cors_allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(%origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    layer.allow_origin(AllowOrigin::list(origins))
}

/// Starts the server with the given configuration and serves until Ctrl+C or SIGTERM
pub async fn run_server(config: AppConfig, db: DatabaseConnection) -> Result<()> {
    let addr = config
        .bind_addr()
        .with_context(|| format!("Invalid server address: {}", config.api_bind_addr))?;
    let profile = config.profile.clone();

    let state = AppState {
        config: Arc::new(config),
        db,
    };
    let app = create_app(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!(%addr, %profile, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("Shutdown signal received");
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::root,
        crate::handlers::healthz,
        crate::handlers::permissions::list_permissions,
        crate::handlers::permissions::create_permission,
        crate::handlers::permissions::get_permission,
        crate::handlers::permissions::replace_permission,
        crate::handlers::permissions::update_permission,
        crate::handlers::permissions::delete_permission,
        crate::handlers::roles::list_roles,
        crate::handlers::roles::create_role,
        crate::handlers::roles::get_role,
        crate::handlers::roles::replace_role,
        crate::handlers::roles::update_role,
        crate::handlers::roles::delete_role,
        crate::handlers::team_members::list_team_members,
        crate::handlers::team_members::create_team_member,
        crate::handlers::team_members::get_team_member,
        crate::handlers::team_members::replace_team_member,
        crate::handlers::team_members::update_team_member,
        crate::handlers::team_members::delete_team_member,
    ),
    components(
        schemas(
            crate::models::ServiceInfo,
            crate::handlers::HealthStatus,
            crate::error::ApiError,
            crate::handlers::permissions::PermissionRequest,
            crate::handlers::permissions::PermissionPatchRequest,
            crate::handlers::permissions::PermissionResponse,
            crate::handlers::roles::RoleRequest,
            crate::handlers::roles::RolePatchRequest,
            crate::handlers::roles::RoleResponse,
            crate::handlers::team_members::TeamMemberRequest,
            crate::handlers::team_members::TeamMemberPatchRequest,
            crate::handlers::team_members::TeamMemberResponse,
        )
    ),
    tags(
        (name = "root", description = "Service information and health"),
        (name = "permissions", description = "Named capabilities"),
        (name = "roles", description = "Groups of permissions"),
        (name = "team-members", description = "People and their roles"),
    ),
    info(
        title = "Roster API",
        description = "Team member, role and permission administration",
        version = env!("CARGO_PKG_VERSION"),
    )
)]
pub struct ApiDoc;
